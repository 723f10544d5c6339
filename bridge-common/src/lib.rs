// bridge-common/src/lib.rs
// Contract catalog, domain records and marshaling shared by every facade

pub mod constants;
pub mod contract;
pub mod errors;
pub mod marshal;
pub mod options;
pub mod request;
pub mod types;
pub mod value;

pub use constants::Timeframe;
pub use contract::{Contract, ContractViolation, OperationSpec};
pub use errors::{BridgeError, BridgeResult, TerminalError};
pub use marshal::{Series, SeriesRow};
pub use options::{HistoryFilter, InitializeOptions, SymbolSelectOptions, SymbolsFilter, TradeFilter};
pub use request::TradeRequest;
pub use types::*;
pub use value::{OrderRequest, Value};
