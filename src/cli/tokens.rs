use anyhow::Result;

use crate::session::ReasonTokens;

use super::args::TokensCliArgs;

pub fn handle_tokens_command(args: TokensCliArgs) -> Result<()> {
    let tokens = ReasonTokens::for_platform(args.platform.as_str());

    println!("Sentinel tokens for {}:", args.platform);
    println!("  removed by admin:      {}", tokens.removed());
    println!("  left alone timeout:    {}", tokens.left_alone());
    println!("  startup alone timeout: {}", tokens.startup_alone());

    Ok(())
}
