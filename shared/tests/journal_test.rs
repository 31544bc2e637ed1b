use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::dec;
use shared::{
    Confirmation, CsvStore, EntrySide, PnlSummary, PositionTag, StrategyTag, TradeFields, TradeId,
    TradeRepository, TradeState, TradeUpdate,
};
use std::fs;

fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

fn repository(dir: &tempfile::TempDir) -> TradeRepository<CsvStore> {
    TradeRepository::new(CsvStore::new(dir.path().join("trades.csv")))
}

#[test]
fn test_buy_then_sell_across_processes() {
    let dir = tempfile::tempdir().unwrap();

    let mut fields = TradeFields::new("600519", at(1, 9, 31), dec!(1700.00), 100);
    fields.name = "贵州茅台".into();
    fields.tags_position = vec![PositionTag::ZoneA];
    fields.tags_strategy = vec![StrategyTag::Gap, StrategyTag::StarLine];
    fields.side = EntrySide::Dip;
    let created = repository(&dir).create(fields).unwrap();
    assert_eq!(created.state(), TradeState::Open);

    // A fresh repository sees the same file.
    let repo = repository(&dir);
    let closed = repo
        .update(created.id(), TradeUpdate::close(Some(at(5, 14, 55)), dec!(1750.00), 100))
        .unwrap();
    assert_eq!(closed.pnl(), Some(dec!(5000)));
    assert!((closed.pnl_pct().unwrap() - dec!(2.94)).abs() < dec!(0.01));

    let reloaded = repository(&dir).get(created.id()).unwrap();
    assert_eq!(reloaded, closed);
    assert_eq!(reloaded.tags_strategy, vec![StrategyTag::Gap, StrategyTag::StarLine]);
    assert_eq!(reloaded.side, EntrySide::Dip);
    assert_eq!(reloaded.confirmation, Confirmation::Yes);

    let summary = PnlSummary::from_records(&repository(&dir).list().unwrap());
    assert_eq!(summary.closed_trades, 1);
    assert_eq!(summary.total_pnl, dec!(5000));
}

#[test]
fn test_unknown_id_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let repo = repository(&dir);
    repo.create(TradeFields::new("000001", at(1, 10, 0), dec!(10.50), 200))
        .unwrap();
    let before = fs::read_to_string(repo.store().path()).unwrap();

    let missing = TradeId::normalize("00000000-0000-0000-0000-000000000000");
    assert!(repo.update(&missing, TradeUpdate::notes("x")).unwrap_err().is_not_found());
    assert!(repo.delete(&missing).unwrap_err().is_not_found());

    assert_eq!(fs::read_to_string(repo.store().path()).unwrap(), before);
}

#[test]
fn test_legacy_journal_is_upgraded_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trades.csv");
    fs::write(
        &path,
        "代码,名称,买入日期,买入价格,买入数量,卖出日期,卖出价格,卖出数量,位置,战法,操作,印证,备注,盈亏,盈亏比例\n\
         600519,贵州茅台,2024-03-01 09:30:00,1700,100,2024-03-05 14:55:00,1750,100,A区,缺口,追涨,是,,5000,2.94\n",
    )
    .unwrap();

    let repo = repository(&dir);
    let records = repo.list().unwrap();
    assert_eq!(records.len(), 1);
    let id = records[0].id().clone();
    assert!(!id.as_str().is_empty());

    let upgraded = fs::read_to_string(&path).unwrap();
    assert!(upgraded.starts_with("# schema_version:"));
    assert!(upgraded.contains("两点印证"));

    // Later operations address the record by the assigned identifier.
    let updated = repo.update(&id, TradeUpdate::notes("复盘")).unwrap();
    assert_eq!(updated.notes.as_deref(), Some("复盘"));
    assert_eq!(repo.list().unwrap()[0].id(), &id);
}

#[test]
fn test_create_then_delete_restores_collection() {
    let dir = tempfile::tempdir().unwrap();
    let repo = repository(&dir);
    repo.create(TradeFields::new("000001", at(1, 10, 0), dec!(10.50), 200))
        .unwrap();
    let before = repo.list().unwrap();

    let created = repo
        .create(TradeFields::new("300750", at(2, 10, 0), dec!(180), 100))
        .unwrap();
    repo.delete(created.id()).unwrap();

    assert_eq!(repo.list().unwrap(), before);
}

#[test]
fn test_records_serialize_for_json_output() {
    let dir = tempfile::tempdir().unwrap();
    let repo = repository(&dir);
    let mut fields = TradeFields::new("600519", at(1, 9, 31), dec!(1700.00), 100);
    fields.sell_price = Some(dec!(1650));
    fields.sell_qty = Some(100);
    let created = repo.create(fields).unwrap();

    let json = serde_json::to_value(&created).unwrap();
    assert_eq!(json["id"], created.id().as_str());
    assert_eq!(json["code"], "600519");
    assert!(json["buy_price"].is_number());
    assert!(json["pnl"].is_number());
    assert_eq!(json["pnl"].as_f64(), Some(-5000.0));
    assert!(json["sell_time"].is_null());

    let summary = serde_json::to_value(PnlSummary::from_records(&[created])).unwrap();
    assert_eq!(summary["total_pnl"].as_f64(), Some(-5000.0));
}
