//! Primer design parameters.
//!
//! - `bundle`: `ConfigBundle` + validation
//! - `fields`: per-field bounds/descriptions
//! - `presets`: `standard`, `gc-rich`, `gc-poor`

pub mod bundle;
pub mod fields;
pub mod presets;

pub use bundle::*;
pub use fields::*;
pub use presets::*;
