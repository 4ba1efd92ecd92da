//! Exit record persistence (SQLite).

mod init;
pub mod sessions;

pub use init::{init_db, migrate, open};
pub use sessions::{SessionRecord, SessionRepository};
