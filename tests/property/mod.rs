//! Property-based tests for condition ordering and backoff

mod backoff;
mod ordering;
