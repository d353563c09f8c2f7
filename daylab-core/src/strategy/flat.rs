//! Always-flat strategy. Useful as a baseline and for zero-PnL checks.

use super::Strategy;
use crate::domain::Bar;

#[derive(Debug, Clone, Copy, Default)]
pub struct Flat;

impl Strategy for Flat {
    fn name(&self) -> &str {
        "flat"
    }

    fn on_bar(&mut self, _bar: &Bar) -> f64 {
        0.0
    }
}
