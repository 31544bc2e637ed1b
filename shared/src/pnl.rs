//! Realized profit-and-loss derivation

use rust_decimal::Decimal;
use serde::Serialize;

/// Realized P&L of a closed trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pnl {
    /// Revenue minus cost, in currency units
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub pnl: Decimal,
    /// `pnl` as a percentage of cost
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub pnl_pct: Decimal,
}

/// Pure P&L calculations. Never panics; anything that cannot be computed is `None`.
pub struct PnlCalculator;

impl PnlCalculator {
    /// Compute P&L for one buy leg and an optional sell leg.
    ///
    /// Returns `None` for an open position (either sell field absent), a zero
    /// cost basis, or arithmetic that does not fit a `Decimal`.
    pub fn calculate(
        buy_price: Decimal,
        buy_qty: u64,
        sell_price: Option<Decimal>,
        sell_qty: Option<u64>,
    ) -> Option<Pnl> {
        let (sell_price, sell_qty) = (sell_price?, sell_qty?);

        let cost = buy_price.checked_mul(Decimal::from(buy_qty))?;
        if cost.is_zero() {
            return None;
        }
        let revenue = sell_price.checked_mul(Decimal::from(sell_qty))?;
        let pnl = revenue.checked_sub(cost)?;
        let pnl_pct = pnl.checked_div(cost)?.checked_mul(Decimal::ONE_HUNDRED)?;

        Some(Pnl { pnl, pnl_pct })
    }

    /// Cost basis of a buy leg, `None` on overflow
    pub fn cost(buy_price: Decimal, buy_qty: u64) -> Option<Decimal> {
        buy_price.checked_mul(Decimal::from(buy_qty))
    }

    /// `part / base * 100`, or zero when the base is zero
    pub fn percent_of(part: Decimal, base: Decimal) -> Decimal {
        if base.is_zero() {
            return Decimal::ZERO;
        }
        part.checked_div(base)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::ZERO)
    }
}
