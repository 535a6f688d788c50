//! Evaluation options.

use bitflags::bitflags;

bitflags! {
    /// Switches that change how an expression is compiled and evaluated.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EvaluateOptions: u8 {
        /// Parse the text every time instead of consulting the shared cache.
        const NO_CACHE = 1 << 0;
        /// Match parameter and built-in function names without regard to case,
        /// and compare text case-insensitively.
        const IGNORE_CASE = 1 << 1;
        /// Evaluate once per element of the list-valued parameters.
        const ITERATE_PARAMETERS = 1 << 2;
        /// `Round` sends midpoints away from zero instead of to the even neighbour.
        const ROUND_AWAY_FROM_ZERO = 1 << 3;
    }
}

/// Which kind two different non-integral operands are converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NumericPreference {
    #[default]
    Decimal,
    FloatingPoint,
}
