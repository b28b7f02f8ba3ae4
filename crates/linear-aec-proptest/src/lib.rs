//! Property-based test support for linear echo cancellation.
//!
//! Provides block generators and comparison utilities for exercising the
//! subtractor with randomized render and capture signals.
//!
//! # Usage
//!
//! ```ignore
//! use linear_aec_proptest::generators::*;
//! use test_strategy::proptest;
//!
//! #[proptest]
//! fn my_test(#[strategy(capture_block())] block: Vec<f32>) {
//!     assert_eq!(block.len(), 160);
//! }
//! ```

pub mod comparison;
pub mod generators;

pub use proptest;
pub use test_strategy;
