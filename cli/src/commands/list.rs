use anyhow::Result;
use clap::Args;
use shared::{TradeRecord, TradeState};

use super::{trades_table, OutputFormat, LOAD_FAILED};
use crate::state::AppState;

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only trades without a recorded sell
    #[arg(long, conflicts_with = "closed")]
    pub open: bool,

    /// Only sold trades
    #[arg(long)]
    pub closed: bool,

    /// Output format
    #[arg(long, short, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

impl ListArgs {
    fn wanted_state(&self) -> Option<TradeState> {
        if self.open {
            Some(TradeState::Open)
        } else if self.closed {
            Some(TradeState::Closed)
        } else {
            None
        }
    }
}

fn filter_records(records: Vec<TradeRecord>, state: Option<TradeState>) -> Vec<TradeRecord> {
    match state {
        Some(state) => records.into_iter().filter(|r| r.state() == state).collect(),
        None => records,
    }
}

pub fn handle_list(state: &AppState, args: ListArgs) -> Result<()> {
    let records = match state.repository.list() {
        Ok(records) => records,
        Err(e) => {
            tracing::error!("Failed to load trades: {}", e);
            println!("{}", LOAD_FAILED);
            return Ok(());
        }
    };
    let records = filter_records(records, args.wanted_state());

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Table if records.is_empty() => println!("{}", LOAD_FAILED),
        OutputFormat::Table => {
            println!("{}", trades_table(&records));
            println!("{} trades", records.len());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::parse_time;
    use rust_decimal::dec;
    use shared::{TradeFields, TradeId, TradeUpdate};

    #[test]
    fn test_filter_by_state() {
        let fields = TradeFields::new("600519", parse_time("2024-03-01").unwrap(), dec!(10), 100);
        let open = TradeRecord::from_fields(TradeId::generate(), fields.clone());
        let mut closed = TradeRecord::from_fields(TradeId::generate(), fields);
        TradeUpdate::close(None, dec!(11), 100).apply_to(&mut closed);
        let all = vec![open.clone(), closed.clone()];

        assert_eq!(filter_records(all.clone(), Some(TradeState::Open)), vec![open]);
        assert_eq!(filter_records(all.clone(), Some(TradeState::Closed)), vec![closed]);
        assert_eq!(filter_records(all.clone(), None), all);
    }
}
