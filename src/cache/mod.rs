//! Cache module for holding API responses in memory
//!
//! This module provides a time-expiring cache keyed by request URL. Entries are
//! removed by a periodic background sweep rather than on access, so a value may
//! outlive its interval by up to one extra sweep period.

mod expiring;

pub use expiring::{Cache, CacheError};
