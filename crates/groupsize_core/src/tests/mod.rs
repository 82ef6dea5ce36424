//! Integration tests for the group-size disparity engine
//!
//! Tests are organized by topic:
//! - `direct_sweeps` - Closed-form models run through the factorial runner
//! - `indirect_sweeps` - Stratified sampling and normalization under sweeps
//! - `runner` - Ordering, reproducibility, and failure handling
//! - `analysis` - Derived metrics over sweep output

mod runner;
