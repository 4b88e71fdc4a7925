//! Suitetrim - Redundant Test Case Detection
//!
//! Reads test cases exported from a test-management system, vectorizes their
//! text and metadata, groups them with K-means, and recommends per test case
//! whether to keep it, review it for consolidation, or consider removing it.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod records;

pub use error::{Result, SuiteTrimError};
