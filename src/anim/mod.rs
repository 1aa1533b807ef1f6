//! Frame-stepped animation primitives shared by every effect.

mod offset;
mod range;
mod rotator;
mod scale;

pub use offset::Offset;
pub use range::Range;
pub use rotator::{apply, Motion, Rotator};
pub use scale::Scale;
