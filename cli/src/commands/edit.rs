use anyhow::Result;
use chrono::NaiveDateTime;
use clap::Args;
use rust_decimal::Decimal;
use shared::{
    is_board_lot, Confirmation, EntrySide, PositionTag, StrategyTag, TradeUpdate, ValidationError,
    LOT_SIZE,
};

use super::{entered, parse_price, parse_time, print_trade, resolve_id};
use crate::state::AppState;

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Trade id, or a unique prefix of it
    pub id: String,

    #[arg(long)]
    pub code: Option<String>,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long, value_parser = parse_time)]
    pub buy_time: Option<NaiveDateTime>,

    #[arg(long, value_parser = parse_price)]
    pub buy_price: Option<Decimal>,

    #[arg(long)]
    pub buy_qty: Option<u64>,

    #[arg(long, value_parser = parse_time)]
    pub sell_time: Option<NaiveDateTime>,

    /// 0 clears the sell price
    #[arg(long, value_parser = parse_price)]
    pub sell_price: Option<Decimal>,

    /// 0 clears the sell quantity
    #[arg(long)]
    pub sell_qty: Option<u64>,

    /// Clear all sell fields, returning the trade to open
    #[arg(long, conflicts_with_all = ["sell_time", "sell_price", "sell_qty"])]
    pub reopen: bool,

    /// Replace position tags (位置), comma separated
    #[arg(long = "position", value_delimiter = ',')]
    pub tags_position: Option<Vec<PositionTag>>,

    /// Replace strategy tags (战法), comma separated
    #[arg(long = "strategy", value_delimiter = ',')]
    pub tags_strategy: Option<Vec<StrategyTag>>,

    /// Remove all position and strategy tags
    #[arg(long, conflicts_with_all = ["tags_position", "tags_strategy"])]
    pub clear_tags: bool,

    #[arg(long)]
    pub side: Option<EntrySide>,

    #[arg(long)]
    pub confirmation: Option<Confirmation>,

    /// Replace notes; an empty string clears them
    #[arg(long)]
    pub notes: Option<String>,
}

impl EditArgs {
    fn to_update(&self) -> Result<TradeUpdate, ValidationError> {
        let code = self.code.as_ref().map(|c| c.trim().to_string());
        if code.as_ref().is_some_and(|c| c.is_empty()) {
            return Err(ValidationError::EmptyCode);
        }
        if self.buy_qty == Some(0) {
            return Err(ValidationError::ZeroBuyQuantity);
        }

        let mut update = TradeUpdate {
            code,
            name: self.name.as_ref().map(|n| n.trim().to_string()),
            buy_time: self.buy_time,
            buy_price: self.buy_price,
            buy_qty: self.buy_qty,
            sell_time: self.sell_time.map(Some),
            sell_price: self.sell_price.map(|p| entered(Some(p))),
            sell_qty: self.sell_qty.map(|q| entered(Some(q))),
            tags_position: self.tags_position.clone(),
            tags_strategy: self.tags_strategy.clone(),
            side: self.side,
            confirmation: self.confirmation,
            notes: self.notes.clone().map(Some),
        };

        if self.reopen {
            let reopen = TradeUpdate::reopen();
            update.sell_time = reopen.sell_time;
            update.sell_price = reopen.sell_price;
            update.sell_qty = reopen.sell_qty;
        }
        if self.clear_tags {
            update.tags_position = Some(Vec::new());
            update.tags_strategy = Some(Vec::new());
        }
        Ok(update)
    }
}

pub fn handle_edit(state: &AppState, args: EditArgs) -> Result<()> {
    let update = args.to_update()?;
    if update.is_empty() {
        println!("Nothing to change");
        return Ok(());
    }

    for qty in update.buy_qty.into_iter().chain(update.sell_qty.flatten()) {
        if !is_board_lot(qty) {
            tracing::warn!("Quantity {} is not a multiple of {}", qty, LOT_SIZE);
        }
    }

    let id = resolve_id(state, &args.id)?;
    let record = state.repository.update(&id, update)?;
    println!("记录已更新!");
    print_trade(&record);
    Ok(())
}
