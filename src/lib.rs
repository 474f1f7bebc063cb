// Core infrastructure modules
pub mod config;
pub mod core;

// Feature-specific modules
pub mod catalog;
pub mod export;
pub mod views;

#[cfg(test)]
mod test_utils;

pub use crate::config::{Config, ConnectionPolicy};
pub use crate::core::db::{
    CellValue, Column, Comparison, Criterion, ConnectionManager, SwitchOutcome, TableAccessor,
    TableData, TableSchema,
};
pub use crate::core::{BrowserError, Result};
pub use crate::views::{NoViews, TableViews, ViewOutcome, ViewTeardown};
