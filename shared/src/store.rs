//! Whole-table persistence of trade records
//!
//! The journal lives in a single CSV file: an optional `# schema_version: N`
//! line, a header row, then one row per trade. Every save rewrites the whole
//! file through a temporary file in the same directory that is renamed over
//! the target, so readers see either the old table or the new one.

use crate::error::StoreError;
use crate::models::{
    join_tags, parse_tags, Confirmation, EntrySide, Labeled, TradeFields, TradeId, TradeRecord,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use migration::{Migrator, RawTable};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;
use tempfile::NamedTempFile;

pub mod columns {
    pub const ID: &str = "ID";
    pub const CODE: &str = "代码";
    pub const NAME: &str = "名称";
    pub const BUY_TIME: &str = "买入日期";
    pub const BUY_PRICE: &str = "买入价格";
    pub const BUY_QTY: &str = "买入数量";
    pub const SELL_TIME: &str = "卖出日期";
    pub const SELL_PRICE: &str = "卖出价格";
    pub const SELL_QTY: &str = "卖出数量";
    pub const TAGS_POSITION: &str = "位置";
    pub const TAGS_STRATEGY: &str = "战法";
    pub const SIDE: &str = "操作";
    pub const CONFIRMATION: &str = "两点印证";
    pub const NOTES: &str = "备注";
    pub const PNL: &str = "盈亏";
    pub const PNL_PCT: &str = "盈亏比例";
}

/// Canonical column order of the data file
pub const COLUMNS: [&str; 16] = [
    columns::ID,
    columns::CODE,
    columns::NAME,
    columns::BUY_TIME,
    columns::BUY_PRICE,
    columns::BUY_QTY,
    columns::SELL_TIME,
    columns::SELL_PRICE,
    columns::SELL_QTY,
    columns::TAGS_POSITION,
    columns::TAGS_STRATEGY,
    columns::SIDE,
    columns::CONFIRMATION,
    columns::NOTES,
    columns::PNL,
    columns::PNL_PCT,
];

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SCHEMA_HEADER_PREFIX: &str = "# schema_version:";

const ACCEPTED_DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const ACCEPTED_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Load/save primitive over the full record collection
pub trait RecordStore {
    /// Full ordered collection
    fn load(&self) -> Result<Vec<TradeRecord>, StoreError>;

    /// Replace the stored collection with `records`, in order
    fn save(&self, records: &[TradeRecord]) -> Result<(), StoreError>;
}

/// CSV file store
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }
}

impl RecordStore for CsvStore {
    fn load(&self) -> Result<Vec<TradeRecord>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let (version, body) = split_schema_header(&content)?;
        let mut table = read_raw_table(body)?;
        if table.headers.iter().all(|h| h.is_empty()) {
            return Ok(Vec::new());
        }

        let applied = Migrator::run(&mut table, version)?;
        let records = records_from_table(&table)?;

        if !applied.is_empty() {
            tracing::warn!(
                "Migrated {} from schema version {} to {} ({})",
                self.path.display(),
                version,
                Migrator::latest_version(),
                applied.join(", ")
            );
            self.save(&records)?;
        }

        Ok(records)
    }

    fn save(&self, records: &[TradeRecord]) -> Result<(), StoreError> {
        let dir = self.directory();
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        writeln!(tmp, "{} {}", SCHEMA_HEADER_PREFIX, Migrator::latest_version())?;
        {
            let mut writer = csv::Writer::from_writer(&mut tmp);
            writer.write_record(COLUMNS)?;
            for record in records {
                writer.write_record(record_to_row(record))?;
            }
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;

        tracing::debug!("Saved {} trades to {}", records.len(), self.path.display());
        Ok(())
    }
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<TradeRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<TradeRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

impl RecordStore for MemoryStore {
    fn load(&self) -> Result<Vec<TradeRecord>, StoreError> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records.clone())
    }

    fn save(&self, records: &[TradeRecord]) -> Result<(), StoreError> {
        let mut stored = self.records.lock().unwrap_or_else(|e| e.into_inner());
        *stored = records.to_vec();
        Ok(())
    }
}

/// Split off the schema version line. Files without one are version 0.
fn split_schema_header(content: &str) -> Result<(u32, &str), StoreError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let Some(rest) = content.strip_prefix(SCHEMA_HEADER_PREFIX) else {
        return Ok((0, content));
    };

    let (line, body) = rest.split_once('\n').unwrap_or((rest, ""));
    let version = line
        .trim()
        .parse::<u32>()
        .map_err(|_| StoreError::InvalidSchemaHeader(line.trim().to_string()))?;
    Ok((version, body))
}

fn read_raw_table(body: &str) -> Result<RawTable, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable::new(headers, rows))
}

fn records_from_table(table: &RawTable) -> Result<Vec<TradeRecord>, StoreError> {
    let required = |name: &'static str| table.column(name).ok_or(StoreError::MissingColumn(name));
    let id_col = required(columns::ID)?;
    let code_col = required(columns::CODE)?;
    let buy_time_col = required(columns::BUY_TIME)?;
    let buy_price_col = required(columns::BUY_PRICE)?;
    let buy_qty_col = required(columns::BUY_QTY)?;

    let name_col = table.column(columns::NAME);
    let sell_time_col = table.column(columns::SELL_TIME);
    let sell_price_col = table.column(columns::SELL_PRICE);
    let sell_qty_col = table.column(columns::SELL_QTY);
    let tags_position_col = table.column(columns::TAGS_POSITION);
    let tags_strategy_col = table.column(columns::TAGS_STRATEGY);
    let side_col = table.column(columns::SIDE);
    let confirmation_col = table.column(columns::CONFIRMATION);
    let notes_col = table.column(columns::NOTES);

    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(table.len());

    for row in 0..table.len() {
        let cells = RowCells { table, row };

        let id = TradeId::normalize(cells.get(Some(id_col)));
        if id.as_str().is_empty() {
            return Err(cells.invalid(columns::ID, id_col));
        }
        if !seen.insert(id.clone()) {
            return Err(StoreError::DuplicateId(id.to_string()));
        }

        let fields = TradeFields {
            code: normalize_code(cells.get(Some(code_col))),
            name: cells.get(name_col).trim().to_string(),
            buy_time: cells.required(columns::BUY_TIME, buy_time_col, parse_datetime)?,
            buy_price: cells.required(columns::BUY_PRICE, buy_price_col, parse_price)?,
            buy_qty: cells.required(columns::BUY_QTY, buy_qty_col, parse_quantity)?,
            sell_time: cells.optional(columns::SELL_TIME, sell_time_col, parse_datetime),
            sell_price: cells.optional(columns::SELL_PRICE, sell_price_col, parse_price),
            sell_qty: cells.optional(columns::SELL_QTY, sell_qty_col, parse_quantity),
            tags_position: parse_tags(cells.get(tags_position_col)),
            tags_strategy: parse_tags(cells.get(tags_strategy_col)),
            side: cells.labeled::<EntrySide>(side_col),
            confirmation: cells.labeled::<Confirmation>(confirmation_col),
            notes: Some(cells.get(notes_col))
                .filter(|n| !n.trim().is_empty())
                .map(str::to_string),
        };

        records.push(TradeRecord::from_fields(id, fields));
    }

    Ok(records)
}

fn record_to_row(record: &TradeRecord) -> Vec<String> {
    let datetime = |t: Option<NaiveDateTime>| {
        t.map(|t| t.format(DATETIME_FORMAT).to_string())
            .unwrap_or_default()
    };
    let optional = |v: Option<String>| v.unwrap_or_default();

    vec![
        record.id().to_string(),
        record.code.clone(),
        record.name.clone(),
        datetime(Some(record.buy_time)),
        record.buy_price.to_string(),
        record.buy_qty.to_string(),
        datetime(record.sell_time),
        optional(record.sell_price.map(|p| p.to_string())),
        optional(record.sell_qty.map(|q| q.to_string())),
        join_tags(&record.tags_position),
        join_tags(&record.tags_strategy),
        record.side.label().to_string(),
        record.confirmation.label().to_string(),
        optional(record.notes.clone()),
        optional(record.pnl().map(|p| p.to_string())),
        optional(record.pnl_pct().map(|p| p.round_dp(4).to_string())),
    ]
}

struct RowCells<'a> {
    table: &'a RawTable,
    row: usize,
}

impl<'a> RowCells<'a> {
    fn get(&self, column: Option<usize>) -> &'a str {
        column.map(|c| self.table.cell(self.row, c)).unwrap_or("")
    }

    fn invalid(&self, name: &'static str, column: usize) -> StoreError {
        StoreError::InvalidCell {
            row: self.row + 1,
            column: name,
            value: self.table.cell(self.row, column).to_string(),
        }
    }

    fn required<T>(&self, name: &'static str, column: usize, parse: fn(&str) -> Option<T>) -> Result<T, StoreError> {
        let cell = self.get(Some(column));
        if is_blank(cell) {
            return Err(self.invalid(name, column));
        }
        parse(cell.trim()).ok_or_else(|| self.invalid(name, column))
    }

    /// Unreadable sell cells leave the trade open instead of failing the load
    fn optional<T>(&self, name: &'static str, column: Option<usize>, parse: fn(&str) -> Option<T>) -> Option<T> {
        let cell = self.get(column);
        if is_blank(cell) {
            return None;
        }
        let value = parse(cell.trim());
        if value.is_none() {
            tracing::warn!("Row {}: unreadable {} {:?}, treating as not entered", self.row + 1, name, cell);
        }
        value
    }

    fn labeled<T: Labeled + Default>(&self, column: Option<usize>) -> T {
        let cell = self.get(column);
        T::from_label(cell).unwrap_or_else(|| {
            if !is_blank(cell) {
                tracing::warn!("Row {}: unknown {} {:?}, using default", self.row + 1, T::KIND, cell);
            }
            T::default()
        })
    }
}

/// Empty and spreadsheet "not a number" cells count as absent
fn is_blank(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty() || cell.eq_ignore_ascii_case("nan") || cell.eq_ignore_ascii_case("nat")
}

/// Six-digit exchange codes lose their leading zeros when a spreadsheet treats them as numbers.
fn normalize_code(cell: &str) -> String {
    let code = cell.trim();
    let code = code.strip_suffix(".0").unwrap_or(code);
    if !code.is_empty() && code.len() < 6 && code.bytes().all(|b| b.is_ascii_digit()) {
        format!("{:0>6}", code)
    } else {
        code.to_string()
    }
}

/// Parse any accepted date/time form; a bare date means midnight
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    ACCEPTED_DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
        .or_else(|| {
            ACCEPTED_DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(value, f).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

fn parse_price(value: &str) -> Option<Decimal> {
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .ok()
}

fn parse_quantity(value: &str) -> Option<u64> {
    value.parse::<u64>().ok().or_else(|| {
        Decimal::from_str(value)
            .ok()
            .filter(|d| d.fract().is_zero() && !d.is_sign_negative())
            .and_then(|d| d.to_u64())
    })
}
