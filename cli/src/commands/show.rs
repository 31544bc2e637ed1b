use anyhow::Result;
use clap::Args;

use super::{print_trade, resolve_id, OutputFormat};
use crate::state::AppState;

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Trade id, or a unique prefix of it
    pub id: String,

    #[arg(long, short, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

pub fn handle_show(state: &AppState, args: ShowArgs) -> Result<()> {
    let id = resolve_id(state, &args.id)?;
    let record = state.repository.get(&id)?;

    match args.format {
        OutputFormat::Table => print_trade(&record),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
    }
    Ok(())
}
