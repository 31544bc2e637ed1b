pub mod config;
pub mod error;
pub mod models;
pub mod name_resolver;
pub mod pnl;
pub mod repository;
pub mod stats;
pub mod store;
pub mod templates;

pub use config::Config;
pub use error::{JournalError, StoreError, ValidationError};
pub use models::*;
pub use name_resolver::{NameResolver, SinaNameResolver, StaticNameResolver, UNKNOWN_STOCK_NAME};
pub use pnl::{Pnl, PnlCalculator};
pub use repository::TradeRepository;
pub use stats::{daily_pnl, equity_curve, DailyPnl, EquityPoint, PnlSummary};
pub use store::{CsvStore, MemoryStore, RecordStore};
pub use templates::TradeReportTemplate;
