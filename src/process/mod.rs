// src/process/mod.rs

pub mod date_parser;
pub mod normalize;
pub mod select;
pub mod table;
pub mod utils;

pub use normalize::{normalize, ZeroRowPolicy};
pub use select::select_and_order;
pub use table::ProportionTable;
