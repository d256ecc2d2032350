pub mod daily_log;
pub mod disambiguator;
pub mod engine;
pub mod framing;
pub mod history;
pub mod parser;
pub mod processor;
pub mod trigger;

pub use crate::domain::model::{Action, CartCommand, CartOp, ProductEntry, StackEntry, WeightEvent};
pub use crate::domain::ports::{CartStore, CatalogResolver, Clock, ConfigProvider, DiagnosticSink};
pub use crate::utils::error::Result;
