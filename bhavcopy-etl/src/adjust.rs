//! Adjustment stage.
//!
//! Corporate actions (splits, bonuses, delistings) rewrite prices and
//! quantities of the newly fetched rows before they are merged. The math is
//! supplied by an `Adjuster`; the pipeline only guarantees that the adjuster
//! sees all new rows at once and that its output is what gets persisted.

use crate::error::EtlError;
use polars::prelude::DataFrame;

pub trait Adjuster: Send + Sync {
    /// Human-readable name, used in logs and errors.
    fn name(&self) -> &str;

    fn adjust(&self, frame: DataFrame) -> Result<DataFrame, EtlError>;
}

/// Passes rows through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAdjustment;

impl Adjuster for NoAdjustment {
    fn name(&self) -> &str {
        "none"
    }

    fn adjust(&self, frame: DataFrame) -> Result<DataFrame, EtlError> {
        Ok(frame)
    }
}
