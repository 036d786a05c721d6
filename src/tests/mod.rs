//! integrated tests
pub mod toolkit;

mod interpolation;
