//! Shared element capabilities for the seagrid crates.
//!
//! # Invariants
//! - Every kernel weight is applied through [`Element::weighted_sum`], so
//!   integer elements accumulate in floating point and truncate once.
//! - Conversions between element types are explicit ([`CastFrom`],
//!   [`Convert01`]); nothing converts implicitly.

mod convert;
mod element;
mod types;

pub use convert::{CastFrom, Convert01};
pub use element::Element;
pub use types::{is_power_of_two, is_power_of_two_size};

pub fn crate_info() -> &'static str {
    "seagrid-common v0.1.0"
}
