//! Unattended meeting attendance.
//!
//! Joins an online meeting on behalf of a user, waits to be admitted,
//! records the session and leaves with a categorized reason. The session
//! lifecycle lives in [`session`]; everything platform-specific sits behind
//! [`platform::MeetingPlatform`].

pub mod api;
pub mod callback;
pub mod cli;
pub mod config;
pub mod db;
pub mod global;
pub mod platform;
pub mod session;
pub mod terminate;
