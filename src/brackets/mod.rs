//! Tax bracket subsystem.
//!
//! # Data Flow
//! ```text
//! upstream JSON {"tax_brackets": [...]}
//!     → types.rs (TaxBracket, zero/absent max = unbounded)
//!     → calculator::validate (ordering, ranges, rates)
//!     → calculator::compute (salary → tax, effective rate)
//! ```
//!
//! # Design Decisions
//! - `compute` is pure and infallible; validation is a separate step
//! - Brackets are never re-sorted; a descending set is an error
//! - Effective rate is rounded to three decimals

pub mod calculator;
pub mod types;

pub use calculator::{compute, validate};
pub use types::{
    BracketError, TaxBracket, TaxBracketsPayload, TaxComputation, UpstreamErrorEntry,
    UpstreamErrorPayload,
};
