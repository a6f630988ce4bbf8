//! Utility functions and helpers
//!
//! This module contains timestamp normalization and Steam id helpers.

pub mod steam;
pub mod time;

pub use steam::account_id;
pub use time::{current_timestamp, elapsed_secs, TimeNormalizer, DEFAULT_TZ_OFFSET_SECS};
