//! Synthetic input data.

pub mod testdata;

pub use testdata::*;
