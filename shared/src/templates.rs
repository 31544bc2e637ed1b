use crate::models::{join_tags, Labeled, TradeRecord};
use crate::stats::{daily_pnl, equity_curve, PnlSummary};
use crate::store::DATETIME_FORMAT;
use askama::Template;
use chrono::NaiveDateTime;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Gains are shown red and losses green, as on A-share quote screens
fn pnl_class(value: Decimal) -> &'static str {
    if value > Decimal::ZERO {
        "gain"
    } else if value < Decimal::ZERO {
        "loss"
    } else {
        "flat"
    }
}

fn money(value: Decimal) -> String {
    format!("{:.2}", value)
}

fn percent(value: Decimal) -> String {
    format!("{:.2}%", value)
}

pub struct DailyBar {
    pub date: String,
    pub pnl: String,
    pub trades: usize,
    pub class: &'static str,
    /// Bar length relative to the largest absolute daily P&L, 0..=100
    pub width: u32,
}

pub struct EquityRow {
    pub sell_time: String,
    pub code: String,
    pub pnl: String,
    pub cumulative: String,
    pub class: &'static str,
}

pub struct TradeRow {
    pub id: String,
    pub code: String,
    pub name: String,
    pub buy_time: String,
    pub buy_price: String,
    pub buy_qty: u64,
    pub sell_time: String,
    pub sell_price: String,
    pub sell_qty: String,
    pub tags: String,
    pub side: &'static str,
    pub confirmation: &'static str,
    pub notes: String,
    pub pnl: String,
    pub pnl_pct: String,
    pub class: &'static str,
}

#[derive(Template)]
#[template(path = "trade_report.html", escape = "html")]
pub struct TradeReportTemplate {
    pub title: String,
    pub created_at: String,
    pub total_trades: usize,
    pub open_trades: usize,
    pub closed_trades: usize,
    pub total_pnl: String,
    pub total_pnl_pct: String,
    pub total_class: &'static str,
    pub win_rate: String,
    pub daily: Vec<DailyBar>,
    pub equity: Vec<EquityRow>,
    pub trades: Vec<TradeRow>,
}

impl TradeReportTemplate {
    pub fn new(title: impl Into<String>, records: &[TradeRecord], created_at: NaiveDateTime) -> Self {
        let summary = PnlSummary::from_records(records);
        let days = daily_pnl(records);

        let max_abs = days
            .iter()
            .map(|d| d.pnl.abs())
            .max()
            .unwrap_or(Decimal::ZERO);
        let daily = days
            .iter()
            .map(|d| DailyBar {
                date: d.date.format("%Y-%m-%d").to_string(),
                pnl: money(d.pnl),
                trades: d.trades,
                class: pnl_class(d.pnl),
                width: bar_width(d.pnl, max_abs),
            })
            .collect();

        let equity = equity_curve(records)
            .into_iter()
            .map(|p| EquityRow {
                sell_time: p.sell_time.format(DATETIME_FORMAT).to_string(),
                code: p.code,
                pnl: money(p.pnl),
                cumulative: money(p.cumulative_pnl),
                class: pnl_class(p.cumulative_pnl),
            })
            .collect();

        let trades = records.iter().map(trade_row).collect();

        Self {
            title: title.into(),
            created_at: created_at.format(DATETIME_FORMAT).to_string(),
            total_trades: records.len(),
            open_trades: summary.open_trades,
            closed_trades: summary.closed_trades,
            total_pnl: money(summary.total_pnl),
            total_pnl_pct: percent(summary.total_pnl_pct),
            total_class: pnl_class(summary.total_pnl),
            win_rate: format!("{:.1}%", summary.win_rate),
            daily,
            equity,
            trades,
        }
    }

    pub fn to_html(&self) -> Result<String, askama::Error> {
        self.render()
    }
}

fn bar_width(value: Decimal, max_abs: Decimal) -> u32 {
    if max_abs.is_zero() {
        return 0;
    }
    let ratio = value.abs() * Decimal::ONE_HUNDRED / max_abs;
    ratio.round().to_u32().unwrap_or(100).max(1)
}

fn trade_row(record: &TradeRecord) -> TradeRow {
    let time = |t: Option<NaiveDateTime>| t.map(|t| t.format(DATETIME_FORMAT).to_string()).unwrap_or_default();
    let mut tags = join_tags(&record.tags_position);
    let strategy = join_tags(&record.tags_strategy);
    if !tags.is_empty() && !strategy.is_empty() {
        tags.push_str(" / ");
    }
    tags.push_str(&strategy);

    TradeRow {
        id: record.id().to_string(),
        code: record.code.clone(),
        name: record.name.clone(),
        buy_time: time(Some(record.buy_time)),
        buy_price: money(record.buy_price),
        buy_qty: record.buy_qty,
        sell_time: time(record.sell_time),
        sell_price: record.sell_price.map(money).unwrap_or_default(),
        sell_qty: record.sell_qty.map(|q| q.to_string()).unwrap_or_default(),
        tags,
        side: record.side.label(),
        confirmation: record.confirmation.label(),
        notes: record.notes.clone().unwrap_or_default(),
        pnl: record.pnl().map(money).unwrap_or_default(),
        pnl_pct: record.pnl_pct().map(percent).unwrap_or_default(),
        class: record.pnl().map(pnl_class).unwrap_or("flat"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TradeFields, TradeId, TradeUpdate};
    use chrono::NaiveDate;
    use rust_decimal::dec;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_render_report() {
        let mut fields = TradeFields::new("600519", at(1), dec!(1700), 100);
        fields.name = "贵州茅台".into();
        fields.notes = Some("<script>".into());
        let mut win = TradeRecord::from_fields(TradeId::generate(), fields.clone());
        TradeUpdate::close(Some(at(4)), dec!(1750), 100).apply_to(&mut win);
        let mut loss = TradeRecord::from_fields(TradeId::generate(), fields.clone());
        TradeUpdate::close(Some(at(5)), dec!(1690), 100).apply_to(&mut loss);
        let open = TradeRecord::from_fields(TradeId::generate(), fields);

        let report = TradeReportTemplate::new("交易日志", &[win, loss, open], at(6));
        assert_eq!(report.daily.len(), 2);
        assert_eq!(report.daily[0].width, 100);
        assert_eq!(report.daily[1].width, 20);
        assert_eq!(report.total_pnl, "4000.00");

        let html = report.to_html().unwrap();
        assert!(html.contains("交易日志"));
        assert!(html.contains("贵州茅台"));
        assert!(html.contains("class=\"gain\""));
        assert!(html.contains("class=\"loss\""));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_empty_journal_renders() {
        let report = TradeReportTemplate::new("交易日志", &[], at(6));
        assert!(report.daily.is_empty());
        assert!(report.render().unwrap().contains("0.00"));
    }
}
