//! Error types for genzf_rs
//!
//! This module defines domain-specific error types that provide clear,
//! actionable error messages to users.

use thiserror::Error;

/// Validation errors for user input in the CLI and the TUI.
///
/// These errors are shown directly to users and should be clear and actionable.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Unknown category '{0}', expected one of: needs, wants, save")]
    UnknownCategory(String),

    #[error("Invalid income format: {0}")]
    InvalidIncome(String),

    #[error("Plan is not fully allocated, {0}% left unassigned")]
    IncompletePlan(u8),

    #[error("Symbol is required")]
    SymbolRequired,

    #[error("Invalid quantity format: {0}")]
    InvalidQuantity(String),

    #[error("Quantity must be positive, got {0}")]
    NonPositiveQuantity(f64),

    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    #[error("Price cannot be negative, got {0}")]
    NegativePrice(f64),

    #[error("No holding with id {0}")]
    HoldingNotFound(u32),

    #[error("No holding ids left, remove holdings or renumber the portfolio file")]
    HoldingIdsExhausted,

    #[error("Market not found: {0}")]
    MarketNotFound(String),

    #[error("Unknown market category '{0}', expected one of: all, crypto, forex, commodity, etf")]
    UnknownMarketCategory(String),

    #[error("Unknown sort option '{0}', expected one of: name-asc, price-desc, price-asc, change-desc, change-asc")]
    UnknownSort(String),
}
