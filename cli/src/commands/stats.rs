//! Realized P&L statistics

use anyhow::Result;
use clap::Args;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, ContentArrangement, Table};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{daily_pnl, equity_curve, DailyPnl, EquityPoint, PnlSummary, TradeRecord};

use super::{format_pnl, pnl_color, OutputFormat, LOAD_FAILED};
use crate::state::AppState;

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Also print the cumulative P&L curve
    #[arg(long)]
    pub equity: bool,

    #[arg(long, short, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct StatsOutput {
    summary: PnlSummary,
    daily: Vec<DailyPnl>,
    equity: Vec<EquityPoint>,
}

impl StatsOutput {
    fn from_records(records: &[TradeRecord]) -> Self {
        Self {
            summary: PnlSummary::from_records(records),
            daily: daily_pnl(records),
            equity: equity_curve(records),
        }
    }
}

fn colored(text: String, value: Decimal) -> Cell {
    let cell = Cell::new(text);
    match pnl_color(value) {
        Some(color) => cell.fg(color),
        None => cell,
    }
}

fn bold(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn output_table(stats: &StatsOutput, show_equity: bool) {
    let s = &stats.summary;

    let mut summary = Table::new();
    summary.load_preset(UTF8_FULL).set_header(vec![
        bold("已平仓"),
        bold("持仓中"),
        bold("总盈亏"),
        bold("总盈亏比例"),
        bold("盈/亏"),
        bold("胜率"),
    ]);
    summary.add_row(vec![
        Cell::new(s.closed_trades),
        Cell::new(s.open_trades),
        colored(format_pnl(s.total_pnl), s.total_pnl),
        colored(format!("{:.2}%", s.total_pnl_pct), s.total_pnl),
        Cell::new(format!("{} / {}", s.winning_trades, s.losing_trades)),
        Cell::new(format!("{:.1}%", s.win_rate)),
    ]);
    println!("{summary}");

    if !stats.daily.is_empty() {
        let mut daily = Table::new();
        daily
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![bold("卖出日期"), bold("笔数"), bold("盈亏")]);
        for day in &stats.daily {
            daily.add_row(vec![
                Cell::new(day.date.format("%Y-%m-%d")),
                Cell::new(day.trades),
                colored(format_pnl(day.pnl), day.pnl),
            ]);
        }
        println!("{daily}");
    }

    if show_equity && !stats.equity.is_empty() {
        let mut equity = Table::new();
        equity
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![bold("卖出日期"), bold("代码"), bold("盈亏"), bold("累计盈亏")]);
        for point in &stats.equity {
            equity.add_row(vec![
                Cell::new(point.sell_time.format("%Y-%m-%d %H:%M")),
                Cell::new(&point.code),
                colored(format_pnl(point.pnl), point.pnl),
                colored(format_pnl(point.cumulative_pnl), point.cumulative_pnl),
            ]);
        }
        println!("{equity}");
    }
}

pub fn handle_stats(state: &AppState, args: StatsArgs) -> Result<()> {
    let records = match state.repository.list() {
        Ok(records) => records,
        Err(e) => {
            tracing::error!("Failed to load trades: {}", e);
            println!("{}", LOAD_FAILED);
            return Ok(());
        }
    };

    let stats = StatsOutput::from_records(&records);
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Table if !stats.summary.has_closed_trades() => {
            println!("暂无已平仓交易 ({} open)", stats.summary.open_trades)
        }
        OutputFormat::Table => output_table(&stats, args.equity),
    }
    Ok(())
}
