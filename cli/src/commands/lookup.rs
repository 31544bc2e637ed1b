use anyhow::Result;
use clap::Args;
use shared::name_resolver::market_prefix;
use shared::ValidationError;

use crate::state::AppState;

#[derive(Debug, Args)]
pub struct LookupArgs {
    /// Stock code, e.g. 600519
    pub code: String,
}

pub async fn handle_lookup(state: &AppState, args: LookupArgs) -> Result<()> {
    let code = args.code.trim();
    if code.is_empty() {
        return Err(ValidationError::EmptyCode.into());
    }
    let name = state.resolver.resolve(code).await;
    println!("{}{} {}", market_prefix(code), code, name);
    Ok(())
}
