use anyhow::Result;
use chrono::NaiveDateTime;
use clap::{Subcommand, ValueEnum};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use rust_decimal::Decimal;
use shared::{join_tags, Labeled, TradeId, TradeRecord};
use std::str::FromStr;

use crate::state::AppState;

pub mod add;
pub mod delete;
pub mod edit;
pub mod list;
pub mod lookup;
pub mod report;
pub mod show;
pub mod stats;
pub mod version;

pub const LOAD_FAILED: &str = "数据加载失败或无数据";
pub const NOT_FOUND: &str = "未找到该交易记录";

/// Trade journal commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record a new trade
    Add(add::AddArgs),
    /// Change fields of an existing trade
    Edit(edit::EditArgs),
    /// Permanently delete a trade
    Delete(delete::DeleteArgs),
    /// List trades
    List(list::ListArgs),
    /// Show one trade in detail
    Show(show::ShowArgs),
    /// Realized P&L statistics
    Stats(stats::StatsArgs),
    /// Write the HTML performance report
    Report(report::ReportArgs),
    /// Look up the display name of a stock code
    Lookup(lookup::LookupArgs),
    /// Build and version information
    Version,
}

impl Command {
    pub async fn run(self, state: &AppState) -> Result<()> {
        match self {
            Command::Add(args) => add::handle_add(state, args).await,
            Command::Edit(args) => edit::handle_edit(state, args),
            Command::Delete(args) => delete::handle_delete(state, args),
            Command::List(args) => list::handle_list(state, args),
            Command::Show(args) => show::handle_show(state, args),
            Command::Stats(args) => stats::handle_stats(state, args),
            Command::Report(args) => report::handle_report(state, args),
            Command::Lookup(args) => lookup::handle_lookup(state, args).await,
            Command::Version => version::handle_version(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Resolve a full identifier or an unambiguous prefix of one, as printed by `list`
pub fn resolve_id(state: &AppState, raw: &str) -> Result<TradeId> {
    let wanted = TradeId::normalize(raw);
    let records = state.repository.list()?;
    if records.iter().any(|r| r.id() == &wanted) {
        return Ok(wanted);
    }
    find_by_prefix(&records, wanted.as_str())
}

fn find_by_prefix(records: &[TradeRecord], prefix: &str) -> Result<TradeId> {
    let prefix = prefix.to_lowercase();
    let mut matches = records
        .iter()
        .filter(|r| !prefix.is_empty() && r.id().as_str().to_lowercase().starts_with(&prefix));
    match (matches.next(), matches.next()) {
        (Some(record), None) => Ok(record.id().clone()),
        (Some(_), Some(_)) => anyhow::bail!("Trade id prefix {:?} is ambiguous", prefix),
        (None, _) => anyhow::bail!("{}: {}", NOT_FOUND, prefix),
    }
}

pub fn parse_time(value: &str) -> Result<NaiveDateTime, String> {
    shared::store::parse_datetime(value.trim())
        .ok_or_else(|| format!("invalid date/time {:?}, expected YYYY-MM-DD [HH:MM[:SS]]", value))
}

pub fn parse_price(value: &str) -> Result<Decimal, String> {
    let price = Decimal::from_str(value.trim()).map_err(|e| format!("invalid price {:?}: {}", value, e))?;
    if price.is_sign_negative() && !price.is_zero() {
        return Err(format!("price must not be negative: {}", value));
    }
    Ok(price)
}

/// A zero sell price or quantity means the sell has not been entered
pub fn entered<T: PartialEq + Default>(value: Option<T>) -> Option<T> {
    value.filter(|v| *v != T::default())
}

pub fn format_pnl(value: Decimal) -> String {
    if value > Decimal::ZERO {
        format!("+{:.2}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// Gains red, losses green
pub fn pnl_color(value: Decimal) -> Option<Color> {
    if value > Decimal::ZERO {
        Some(Color::Red)
    } else if value < Decimal::ZERO {
        Some(Color::Green)
    } else {
        None
    }
}

fn pnl_cell(value: Option<Decimal>, text: impl Fn(Decimal) -> String) -> Cell {
    match value {
        Some(v) => {
            let cell = Cell::new(text(v));
            match pnl_color(v) {
                Some(color) => cell.fg(color),
                None => cell,
            }
        }
        None => Cell::new("-"),
    }
}

fn time_text(time: Option<NaiveDateTime>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn trades_table(records: &[TradeRecord]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            ["ID", "代码", "名称", "买入日期", "买入价格", "买入数量", "卖出日期", "卖出价格", "卖出数量", "盈亏", "盈亏比例"]
                .into_iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
        );

    for r in records {
        let short_id: String = r.id().as_str().chars().take(8).collect();
        table.add_row(vec![
            Cell::new(short_id),
            Cell::new(&r.code),
            Cell::new(&r.name),
            Cell::new(time_text(Some(r.buy_time))),
            Cell::new(format!("{:.2}", r.buy_price)),
            Cell::new(r.buy_qty),
            Cell::new(time_text(r.sell_time)),
            Cell::new(r.sell_price.map(|p| format!("{:.2}", p)).unwrap_or_else(|| "-".into())),
            Cell::new(r.sell_qty.map(|q| q.to_string()).unwrap_or_else(|| "-".into())),
            pnl_cell(r.pnl(), format_pnl),
            pnl_cell(r.pnl_pct(), |p| format!("{:.2}%", p)),
        ]);
    }
    table
}

pub fn print_trade(record: &TradeRecord) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);

    let optional = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
    let rows: Vec<(&str, Cell)> = vec![
        ("ID", Cell::new(record.id())),
        ("代码", Cell::new(&record.code)),
        ("名称", Cell::new(&record.name)),
        ("买入日期", Cell::new(time_text(Some(record.buy_time)))),
        ("买入价格", Cell::new(format!("{:.2}", record.buy_price))),
        ("买入数量", Cell::new(record.buy_qty)),
        ("卖出日期", Cell::new(time_text(record.sell_time))),
        ("卖出价格", Cell::new(optional(record.sell_price.map(|p| format!("{:.2}", p))))),
        ("卖出数量", Cell::new(optional(record.sell_qty.map(|q| q.to_string())))),
        ("位置", Cell::new(join_tags(&record.tags_position))),
        ("战法", Cell::new(join_tags(&record.tags_strategy))),
        ("操作", Cell::new(record.side.label())),
        ("两点印证", Cell::new(record.confirmation.label())),
        ("备注", Cell::new(optional(record.notes.clone()))),
        ("盈亏", pnl_cell(record.pnl(), format_pnl)),
        ("盈亏比例", pnl_cell(record.pnl_pct(), |p| format!("{:.2}%", p))),
    ];
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label).add_attribute(Attribute::Bold), value]);
    }
    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    fn record(id: &str) -> TradeRecord {
        let fields = shared::TradeFields::new("600519", parse_time("2024-03-01").unwrap(), dec!(10), 100);
        TradeRecord::from_fields(TradeId::normalize(id), fields)
    }

    #[test]
    fn test_find_by_prefix() {
        let records = vec![record("abc123"), record("abd456"), record("xyz789")];

        assert_eq!(find_by_prefix(&records, "xy").unwrap().as_str(), "xyz789");
        assert_eq!(find_by_prefix(&records, "ABC").unwrap().as_str(), "abc123");
        assert!(find_by_prefix(&records, "ab").is_err());
        assert!(find_by_prefix(&records, "q").is_err());
        assert!(find_by_prefix(&records, "").is_err());
    }

    #[test]
    fn test_parse_time_accepts_date_and_datetime() {
        assert_eq!(
            parse_time("2024-03-01").unwrap(),
            parse_time("2024-03-01 00:00:00").unwrap()
        );
        assert!(parse_time("2024-03-01 09:30").is_ok());
        assert!(parse_time("03/01").is_err());
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("1700.50").unwrap(), dec!(1700.50));
        assert_eq!(parse_price("0").unwrap(), Decimal::ZERO);
        assert!(parse_price("-1").is_err());
        assert!(parse_price("abc").is_err());
    }

    #[test]
    fn test_zero_sell_fields_are_not_entered() {
        assert_eq!(entered(Some(Decimal::ZERO)), None);
        assert_eq!(entered(Some(dec!(12.5))), Some(dec!(12.5)));
        assert_eq!(entered(Some(0u64)), None);
        assert_eq!(entered::<u64>(None), None);
    }

    #[test]
    fn test_format_pnl() {
        assert_eq!(format_pnl(dec!(5000)), "+5000.00");
        assert_eq!(format_pnl(dec!(-12.3)), "-12.30");
        assert_eq!(pnl_color(dec!(1)), Some(Color::Red));
        assert_eq!(pnl_color(dec!(-1)), Some(Color::Green));
    }
}
