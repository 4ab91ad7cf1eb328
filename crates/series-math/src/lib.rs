//! Period-aligned series primitives for statement projection.
//! Stateless functions over `&[f64]`; `NaN` is the missing-value sentinel throughout.

pub mod arithmetic;
pub mod delta;
pub mod extrapolation;
pub mod growth;
pub mod stats;

pub use arithmetic::{add, combine, combine_named, divide, multiply, offset, scale, subtract, ArrayOp};
pub use delta::{delta, FirstValue};
pub use extrapolation::{extend, BaseMethod, ExtrapolationPolicy};
pub use growth::{compound, discount_factors};
pub use stats::{allclose, last, nan_mean, pct_change};
