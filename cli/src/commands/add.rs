use anyhow::Result;
use chrono::NaiveDateTime;
use clap::Args;
use rust_decimal::Decimal;
use shared::{
    is_board_lot, Confirmation, EntrySide, PositionTag, StrategyTag, TradeFields, LOT_SIZE,
};

use super::{entered, parse_price, parse_time, print_trade};
use crate::state::AppState;

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Stock code, e.g. 600519
    pub code: String,

    /// Display name; looked up from the code when omitted
    #[arg(long)]
    pub name: Option<String>,

    /// Buy date/time, defaults to now
    #[arg(long, value_parser = parse_time)]
    pub buy_time: Option<NaiveDateTime>,

    #[arg(long, value_parser = parse_price)]
    pub buy_price: Decimal,

    #[arg(long)]
    pub buy_qty: u64,

    #[arg(long, value_parser = parse_time)]
    pub sell_time: Option<NaiveDateTime>,

    /// 0 means not sold yet
    #[arg(long, value_parser = parse_price)]
    pub sell_price: Option<Decimal>,

    /// 0 means not sold yet
    #[arg(long)]
    pub sell_qty: Option<u64>,

    /// Position tags (位置), comma separated
    #[arg(long = "position", value_delimiter = ',')]
    pub tags_position: Vec<PositionTag>,

    /// Strategy tags (战法), comma separated
    #[arg(long = "strategy", value_delimiter = ',')]
    pub tags_strategy: Vec<StrategyTag>,

    /// 追涨/chase or 低吸/dip
    #[arg(long)]
    pub side: Option<EntrySide>,

    /// 是/yes or 否/no
    #[arg(long)]
    pub confirmation: Option<Confirmation>,

    #[arg(long)]
    pub notes: Option<String>,
}

impl AddArgs {
    fn into_fields(self, now: NaiveDateTime) -> TradeFields {
        let mut fields = TradeFields::new(
            self.code.trim(),
            self.buy_time.unwrap_or(now),
            self.buy_price,
            self.buy_qty,
        );
        fields.name = self.name.map(|n| n.trim().to_string()).unwrap_or_default();
        fields.sell_price = entered(self.sell_price);
        fields.sell_qty = entered(self.sell_qty);
        fields.sell_time = self.sell_time;
        fields.tags_position = self.tags_position;
        fields.tags_strategy = self.tags_strategy;
        fields.side = self.side.unwrap_or_default();
        fields.confirmation = self.confirmation.unwrap_or_default();
        fields.notes = self.notes;
        fields
    }
}

pub async fn handle_add(state: &AppState, args: AddArgs) -> Result<()> {
    let lookup_name = args.name.is_none();
    let mut fields = args.into_fields(state.config.now());
    fields.validate()?;

    for qty in std::iter::once(fields.buy_qty).chain(fields.sell_qty) {
        if !is_board_lot(qty) {
            tracing::warn!("Quantity {} is not a multiple of {}", qty, LOT_SIZE);
        }
    }

    if lookup_name {
        fields.name = state.resolver.resolve(&fields.code).await;
    }

    let record = state.repository.create(fields)?;
    println!("交易记录已保存!");
    print_trade(&record);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use rust_decimal::dec;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: AddArgs,
    }

    fn parse(argv: &[&str]) -> AddArgs {
        Harness::try_parse_from(std::iter::once("add").chain(argv.iter().copied()))
            .unwrap()
            .args
    }

    #[test]
    fn test_open_trade_from_arguments() {
        let now = parse_time("2024-03-01 09:30").unwrap();
        let fields = parse(&[
            "600519",
            "--buy-price",
            "1700",
            "--buy-qty",
            "100",
            "--sell-price",
            "0",
            "--sell-qty",
            "0",
            "--position",
            "A区,zone-b",
            "--side",
            "dip",
        ])
        .into_fields(now);

        assert_eq!(fields.buy_time, now);
        assert_eq!(fields.buy_price, dec!(1700));
        assert_eq!(fields.sell_price, None);
        assert_eq!(fields.sell_qty, None);
        assert_eq!(fields.tags_position, vec![PositionTag::ZoneA, PositionTag::ZoneB]);
        assert_eq!(fields.side, EntrySide::Dip);
        assert_eq!(fields.confirmation, Confirmation::Yes);
    }

    #[tokio::test]
    async fn test_add_resolves_missing_name() {
        let dir = tempfile::tempdir().unwrap();
        let state = crate::state::testing::state_in(dir.path());

        handle_add(&state, parse(&["600519", "--buy-price", "1700", "--buy-qty", "100"]))
            .await
            .unwrap();
        handle_add(&state, parse(&["000001", "--buy-price", "10", "--buy-qty", "150"]))
            .await
            .unwrap();
        handle_add(&state, parse(&["300750", "--name", "宁德时代", "--buy-price", "180", "--buy-qty", "100"]))
            .await
            .unwrap();

        let names: Vec<_> = state.repository.list().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["贵州茅台", shared::UNKNOWN_STOCK_NAME, "宁德时代"]);
    }

    #[tokio::test]
    async fn test_invalid_trade_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let state = crate::state::testing::state_in(dir.path());

        let result = handle_add(&state, parse(&[" ", "--buy-price", "1", "--buy-qty", "100"])).await;
        assert!(result.is_err());
        assert!(handle_add(&state, parse(&["600519", "--buy-price", "1", "--buy-qty", "0"])).await.is_err());
        assert!(state.repository.list().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let result = Harness::try_parse_from([
            "add", "600519", "--buy-price", "1", "--buy-qty", "100", "--strategy", "moon",
        ]);
        assert!(result.is_err());
    }
}
