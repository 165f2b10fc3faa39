pub mod chart;
pub mod config;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod process;

pub use config::{Config, SourceKind, Thresholds};
pub use error::{EmptyReason, Error, FetchError, ParseError, Result};
pub use fetch::{Fetcher, Query, RawObservation};
pub use process::{normalize, select_and_order, ProportionTable, ZeroRowPolicy};
