//! Performance statistics over closed trades

use crate::models::{TradeId, TradeRecord};
use crate::pnl::PnlCalculator;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Journal-wide P&L summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PnlSummary {
    pub open_trades: usize,
    pub closed_trades: usize,
    /// Sum of realized P&L
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub total_pnl: Decimal,
    /// Sum of cost basis of closed trades
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub total_cost: Decimal,
    /// `total_pnl` as a percentage of `total_cost`
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub total_pnl_pct: Decimal,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Winning trades over closed trades, in percent
    pub win_rate: f64,
}

impl PnlSummary {
    pub fn from_records(records: &[TradeRecord]) -> Self {
        let mut summary = Self {
            open_trades: 0,
            closed_trades: 0,
            total_pnl: Decimal::ZERO,
            total_cost: Decimal::ZERO,
            total_pnl_pct: Decimal::ZERO,
            winning_trades: 0,
            losing_trades: 0,
            win_rate: 0.0,
        };

        for record in records {
            let Some(pnl) = record.pnl() else {
                summary.open_trades += 1;
                continue;
            };
            summary.closed_trades += 1;
            summary.total_pnl += pnl;
            summary.total_cost += record.cost().unwrap_or(Decimal::ZERO);

            if pnl > Decimal::ZERO {
                summary.winning_trades += 1;
            } else if pnl < Decimal::ZERO {
                summary.losing_trades += 1;
            }
        }

        summary.total_pnl_pct = PnlCalculator::percent_of(summary.total_pnl, summary.total_cost);
        if summary.closed_trades > 0 {
            summary.win_rate = summary.winning_trades as f64 / summary.closed_trades as f64 * 100.0;
        }
        summary
    }

    pub fn has_closed_trades(&self) -> bool {
        self.closed_trades > 0
    }
}

/// Realized P&L of one calendar day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPnl {
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub pnl: Decimal,
    pub trades: usize,
}

/// One step of the cumulative P&L curve
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub id: TradeId,
    pub code: String,
    pub sell_time: NaiveDateTime,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub pnl: Decimal,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub cumulative_pnl: Decimal,
}

/// Closed trades that carry a sell time, paired with their P&L
fn realized(records: &[TradeRecord]) -> impl Iterator<Item = (&TradeRecord, NaiveDateTime, Decimal)> {
    records
        .iter()
        .filter_map(|r| Some((r, r.sell_time?, r.pnl()?)))
}

/// Realized P&L grouped by sell date, oldest first
pub fn daily_pnl(records: &[TradeRecord]) -> Vec<DailyPnl> {
    let mut days: BTreeMap<NaiveDate, DailyPnl> = BTreeMap::new();
    for (_, sell_time, pnl) in realized(records) {
        let date = sell_time.date();
        let day = days.entry(date).or_insert(DailyPnl {
            date,
            pnl: Decimal::ZERO,
            trades: 0,
        });
        day.pnl += pnl;
        day.trades += 1;
    }
    days.into_values().collect()
}

/// Running total of realized P&L ordered by sell time
pub fn equity_curve(records: &[TradeRecord]) -> Vec<EquityPoint> {
    let mut closed: Vec<_> = realized(records).collect();
    closed.sort_by_key(|(_, sell_time, _)| *sell_time);

    let mut cumulative = Decimal::ZERO;
    closed
        .into_iter()
        .map(|(record, sell_time, pnl)| {
            cumulative += pnl;
            EquityPoint {
                id: record.id().clone(),
                code: record.code.clone(),
                sell_time,
                pnl,
                cumulative_pnl: cumulative,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TradeFields, TradeId};
    use chrono::NaiveDate;
    use rust_decimal::dec;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn trade(buy: Decimal, sell: Option<(Decimal, NaiveDateTime)>) -> TradeRecord {
        let mut fields = TradeFields::new("600519", at(1, 9), buy, 100);
        if let Some((price, time)) = sell {
            fields.sell_price = Some(price);
            fields.sell_qty = Some(100);
            fields.sell_time = Some(time);
        }
        TradeRecord::from_fields(TradeId::generate(), fields)
    }

    fn journal() -> Vec<TradeRecord> {
        vec![
            trade(dec!(10), Some((dec!(12), at(5, 10)))),
            trade(dec!(10), None),
            trade(dec!(20), Some((dec!(19), at(4, 14)))),
            trade(dec!(10), Some((dec!(11), at(5, 14)))),
        ]
    }

    #[test]
    fn test_summary() {
        let summary = PnlSummary::from_records(&journal());

        assert_eq!(summary.open_trades, 1);
        assert_eq!(summary.closed_trades, 3);
        assert_eq!(summary.total_pnl, dec!(200));
        assert_eq!(summary.total_cost, dec!(4000));
        assert_eq!(summary.total_pnl_pct, dec!(5));
        assert_eq!(summary.winning_trades, 2);
        assert_eq!(summary.losing_trades, 1);
        assert!((summary.win_rate - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_summary_without_closed_trades() {
        let summary = PnlSummary::from_records(&[trade(dec!(10), None)]);
        assert!(!summary.has_closed_trades());
        assert_eq!(summary.win_rate, 0.0);
        assert_eq!(summary.total_pnl_pct, Decimal::ZERO);
    }

    #[test]
    fn test_daily_pnl_groups_by_sell_date() {
        let days = daily_pnl(&journal());

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, at(4, 0).date());
        assert_eq!(days[0].pnl, dec!(-100));
        assert_eq!(days[1].pnl, dec!(300));
        assert_eq!(days[1].trades, 2);
    }

    #[test]
    fn test_equity_curve_is_cumulative_by_sell_time() {
        let curve = equity_curve(&journal());

        let cumulative: Vec<_> = curve.iter().map(|p| p.cumulative_pnl).collect();
        assert_eq!(cumulative, vec![dec!(-100), dec!(100), dec!(200)]);
        assert!(curve.windows(2).all(|w| w[0].sell_time <= w[1].sell_time));
    }

    #[test]
    fn test_closed_trade_without_sell_time_counts_only_in_summary() {
        let mut fields = TradeFields::new("600519", at(1, 9), dec!(10), 100);
        fields.sell_price = Some(dec!(11));
        fields.sell_qty = Some(100);
        let records = vec![TradeRecord::from_fields(TradeId::generate(), fields)];

        assert_eq!(PnlSummary::from_records(&records).closed_trades, 1);
        assert!(daily_pnl(&records).is_empty());
        assert!(equity_curve(&records).is_empty());
    }
}
