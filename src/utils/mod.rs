//! Small numeric helpers shared by the classifiers and rule engines

pub mod rounding;

pub use rounding::{round2, format_rate};
