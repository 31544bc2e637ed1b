use crate::error::ValidationError;
use crate::pnl::PnlCalculator;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// A-share board lot
pub const LOT_SIZE: u64 = 100;

/// Whether `qty` is a whole number of board lots
pub fn is_board_lot(qty: u64) -> bool {
    qty % LOT_SIZE == 0
}

/// Separator used when a tag set is written to a single cell
pub const TAG_SEPARATOR: &str = ", ";

/// Opaque trade identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TradeId(String);

impl TradeId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Canonical form of a stored identifier: trimmed, UUIDs lowercase hyphenated.
    pub fn normalize(raw: &str) -> Self {
        let trimmed = raw.trim();
        match Uuid::parse_str(trimmed) {
            Ok(uuid) => Self(uuid.hyphenated().to_string()),
            Err(_) => Self(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TradeId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::normalize(s))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub value: String,
}

/// Fixed enumerations stored by their display label
pub trait Labeled: Sized + Copy + PartialEq + 'static {
    const KIND: &'static str;
    const ALL: &'static [Self];

    /// Label written to the data file
    fn label(self) -> &'static str;

    /// ASCII alias accepted on the command line
    fn alias(self) -> &'static str;

    fn from_label(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.label() == value || v.alias().eq_ignore_ascii_case(value))
    }

    fn parse_label(value: &str) -> Result<Self, UnknownLabel> {
        Self::from_label(value).ok_or_else(|| UnknownLabel {
            kind: Self::KIND,
            value: value.to_string(),
        })
    }
}

macro_rules! label_traits {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownLabel;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse_label(s)
            }
        }
    };
}

/// Chart-position context of an entry (位置)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PositionTag {
    #[serde(rename = "A区")]
    ZoneA,
    #[serde(rename = "B区")]
    ZoneB,
    #[serde(rename = "股价平台")]
    PricePlatform,
    #[serde(rename = "前强势能量颈高处")]
    PriorMomentumNeckline,
    #[serde(rename = "前异动区区域")]
    PriorAnomalyZone,
    #[serde(rename = "前异动区重要支撑位")]
    PriorAnomalySupport,
}

impl Labeled for PositionTag {
    const KIND: &'static str = "position tag";
    const ALL: &'static [Self] = &[
        Self::ZoneA,
        Self::ZoneB,
        Self::PricePlatform,
        Self::PriorMomentumNeckline,
        Self::PriorAnomalyZone,
        Self::PriorAnomalySupport,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::ZoneA => "A区",
            Self::ZoneB => "B区",
            Self::PricePlatform => "股价平台",
            Self::PriorMomentumNeckline => "前强势能量颈高处",
            Self::PriorAnomalyZone => "前异动区区域",
            Self::PriorAnomalySupport => "前异动区重要支撑位",
        }
    }

    fn alias(self) -> &'static str {
        match self {
            Self::ZoneA => "zone-a",
            Self::ZoneB => "zone-b",
            Self::PricePlatform => "platform",
            Self::PriorMomentumNeckline => "neckline",
            Self::PriorAnomalyZone => "anomaly-zone",
            Self::PriorAnomalySupport => "anomaly-support",
        }
    }
}

label_traits!(PositionTag);

/// Trading strategy used (战法)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StrategyTag {
    #[serde(rename = "星线")]
    StarLine,
    #[serde(rename = "单日洗盘")]
    OneDayShakeout,
    #[serde(rename = "缺口")]
    Gap,
}

impl Labeled for StrategyTag {
    const KIND: &'static str = "strategy tag";
    const ALL: &'static [Self] = &[Self::StarLine, Self::OneDayShakeout, Self::Gap];

    fn label(self) -> &'static str {
        match self {
            Self::StarLine => "星线",
            Self::OneDayShakeout => "单日洗盘",
            Self::Gap => "缺口",
        }
    }

    fn alias(self) -> &'static str {
        match self {
            Self::StarLine => "star",
            Self::OneDayShakeout => "shakeout",
            Self::Gap => "gap",
        }
    }
}

label_traits!(StrategyTag);

/// Entry style (操作)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum EntrySide {
    #[default]
    #[serde(rename = "追涨")]
    Chase,
    #[serde(rename = "低吸")]
    Dip,
}

impl Labeled for EntrySide {
    const KIND: &'static str = "entry side";
    const ALL: &'static [Self] = &[Self::Chase, Self::Dip];

    fn label(self) -> &'static str {
        match self {
            Self::Chase => "追涨",
            Self::Dip => "低吸",
        }
    }

    fn alias(self) -> &'static str {
        match self {
            Self::Chase => "chase",
            Self::Dip => "dip",
        }
    }
}

label_traits!(EntrySide);

/// Two-point entry confirmation checklist (两点印证)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Confirmation {
    #[default]
    #[serde(rename = "是")]
    Yes,
    #[serde(rename = "否")]
    No,
}

impl Labeled for Confirmation {
    const KIND: &'static str = "confirmation";
    const ALL: &'static [Self] = &[Self::Yes, Self::No];

    fn label(self) -> &'static str {
        match self {
            Self::Yes => "是",
            Self::No => "否",
        }
    }

    fn alias(self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }
}

label_traits!(Confirmation);

/// Join a tag set into one cell
pub fn join_tags<T: Labeled>(tags: &[T]) -> String {
    tags.iter()
        .map(|t| t.label())
        .collect::<Vec<_>>()
        .join(TAG_SEPARATOR)
}

/// Split a tag cell, keeping valid labels in order and dropping unknowns and repeats
pub fn parse_tags<T: Labeled>(cell: &str) -> Vec<T> {
    let mut tags = Vec::new();
    for part in cell.split([',', '，']).map(str::trim).filter(|p| !p.is_empty()) {
        match T::from_label(part) {
            Some(tag) => tags.push(tag),
            None => tracing::debug!("Dropping unknown {} {:?}", T::KIND, part),
        }
    }
    dedup_tags(tags)
}

/// Remove repeated tags, keeping the first occurrence
pub fn dedup_tags<T: Labeled>(tags: Vec<T>) -> Vec<T> {
    let mut unique: Vec<T> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !unique.contains(&tag) {
            unique.push(tag);
        }
    }
    unique
}

/// Lifecycle state, derived from the presence of sell information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeState {
    Open,
    Closed,
}

/// User-supplied fields of a trade
#[derive(Debug, Clone, PartialEq)]
pub struct TradeFields {
    pub code: String,
    pub name: String,
    pub buy_time: NaiveDateTime,
    pub buy_price: Decimal,
    pub buy_qty: u64,
    pub sell_time: Option<NaiveDateTime>,
    pub sell_price: Option<Decimal>,
    pub sell_qty: Option<u64>,
    pub tags_position: Vec<PositionTag>,
    pub tags_strategy: Vec<StrategyTag>,
    pub side: EntrySide,
    pub confirmation: Confirmation,
    pub notes: Option<String>,
}

impl TradeFields {
    /// Buy leg only, everything else defaulted
    pub fn new(code: impl Into<String>, buy_time: NaiveDateTime, buy_price: Decimal, buy_qty: u64) -> Self {
        Self {
            code: code.into(),
            name: String::new(),
            buy_time,
            buy_price,
            buy_qty,
            sell_time: None,
            sell_price: None,
            sell_qty: None,
            tags_position: Vec::new(),
            tags_strategy: Vec::new(),
            side: EntrySide::default(),
            confirmation: Confirmation::default(),
            notes: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.code.trim().is_empty() {
            return Err(ValidationError::EmptyCode);
        }
        if self.buy_qty == 0 {
            return Err(ValidationError::ZeroBuyQuantity);
        }
        if self.buy_price.is_sign_negative() && !self.buy_price.is_zero() {
            return Err(ValidationError::NegativePrice("buy price"));
        }
        if self.sell_price.is_some_and(|p| p.is_sign_negative() && !p.is_zero()) {
            return Err(ValidationError::NegativePrice("sell price"));
        }
        Ok(())
    }
}

/// One stored trade. P&L fields are derived and only change through [`TradeRecord::refresh_pnl`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRecord {
    id: TradeId,
    pub code: String,
    pub name: String,
    pub buy_time: NaiveDateTime,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub buy_price: Decimal,
    pub buy_qty: u64,
    pub sell_time: Option<NaiveDateTime>,
    #[serde(with = "rust_decimal::serde::arbitrary_precision_option")]
    pub sell_price: Option<Decimal>,
    pub sell_qty: Option<u64>,
    pub tags_position: Vec<PositionTag>,
    pub tags_strategy: Vec<StrategyTag>,
    pub side: EntrySide,
    pub confirmation: Confirmation,
    pub notes: Option<String>,
    #[serde(with = "rust_decimal::serde::arbitrary_precision_option")]
    pnl: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::arbitrary_precision_option")]
    pnl_pct: Option<Decimal>,
}

impl TradeRecord {
    pub fn from_fields(id: TradeId, fields: TradeFields) -> Self {
        let TradeFields {
            code,
            name,
            buy_time,
            buy_price,
            buy_qty,
            sell_time,
            sell_price,
            sell_qty,
            tags_position,
            tags_strategy,
            side,
            confirmation,
            notes,
        } = fields;

        let mut record = Self {
            id,
            code,
            name,
            buy_time,
            buy_price,
            buy_qty,
            sell_time,
            sell_price,
            sell_qty,
            tags_position: dedup_tags(tags_position),
            tags_strategy: dedup_tags(tags_strategy),
            side,
            confirmation,
            notes: notes.filter(|n| !n.is_empty()),
            pnl: None,
            pnl_pct: None,
        };
        record.refresh_pnl();
        record
    }

    pub fn id(&self) -> &TradeId {
        &self.id
    }

    pub fn pnl(&self) -> Option<Decimal> {
        self.pnl
    }

    pub fn pnl_pct(&self) -> Option<Decimal> {
        self.pnl_pct
    }

    pub fn state(&self) -> TradeState {
        if self.sell_price.is_some() && self.sell_qty.is_some() {
            TradeState::Closed
        } else {
            TradeState::Open
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state() == TradeState::Closed
    }

    /// Cost basis of the buy leg
    pub fn cost(&self) -> Option<Decimal> {
        PnlCalculator::cost(self.buy_price, self.buy_qty)
    }

    /// Recompute derived P&L from the buy/sell fields
    pub fn refresh_pnl(&mut self) {
        let pnl = PnlCalculator::calculate(self.buy_price, self.buy_qty, self.sell_price, self.sell_qty);
        self.pnl = pnl.map(|p| p.pnl);
        self.pnl_pct = pnl.map(|p| p.pnl_pct);
    }
}

/// Partial update. `None` leaves a field unchanged; for optional columns
/// `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeUpdate {
    pub code: Option<String>,
    pub name: Option<String>,
    pub buy_time: Option<NaiveDateTime>,
    pub buy_price: Option<Decimal>,
    pub buy_qty: Option<u64>,
    pub sell_time: Option<Option<NaiveDateTime>>,
    pub sell_price: Option<Option<Decimal>>,
    pub sell_qty: Option<Option<u64>>,
    pub tags_position: Option<Vec<PositionTag>>,
    pub tags_strategy: Option<Vec<StrategyTag>>,
    pub side: Option<EntrySide>,
    pub confirmation: Option<Confirmation>,
    pub notes: Option<Option<String>>,
}

impl TradeUpdate {
    /// Record a sell
    pub fn close(sell_time: Option<NaiveDateTime>, sell_price: Decimal, sell_qty: u64) -> Self {
        Self {
            sell_time: Some(sell_time),
            sell_price: Some(Some(sell_price)),
            sell_qty: Some(Some(sell_qty)),
            ..Default::default()
        }
    }

    /// Clear all sell information
    pub fn reopen() -> Self {
        Self {
            sell_time: Some(None),
            sell_price: Some(None),
            sell_qty: Some(None),
            ..Default::default()
        }
    }

    pub fn notes(notes: impl Into<String>) -> Self {
        Self {
            notes: Some(Some(notes.into())),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply every supplied field and recompute P&L
    pub fn apply_to(self, record: &mut TradeRecord) {
        if let Some(code) = self.code {
            record.code = code;
        }
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(buy_time) = self.buy_time {
            record.buy_time = buy_time;
        }
        if let Some(buy_price) = self.buy_price {
            record.buy_price = buy_price;
        }
        if let Some(buy_qty) = self.buy_qty {
            record.buy_qty = buy_qty;
        }
        if let Some(sell_time) = self.sell_time {
            record.sell_time = sell_time;
        }
        if let Some(sell_price) = self.sell_price {
            record.sell_price = sell_price;
        }
        if let Some(sell_qty) = self.sell_qty {
            record.sell_qty = sell_qty;
        }
        if let Some(tags) = self.tags_position {
            record.tags_position = dedup_tags(tags);
        }
        if let Some(tags) = self.tags_strategy {
            record.tags_strategy = dedup_tags(tags);
        }
        if let Some(side) = self.side {
            record.side = side;
        }
        if let Some(confirmation) = self.confirmation {
            record.confirmation = confirmation;
        }
        if let Some(notes) = self.notes {
            record.notes = notes.filter(|n| !n.is_empty());
        }
        record.refresh_pnl();
    }
}
