//! Common test utilities for pelagos.
//!
//! This module provides shared fixture builders for testing the pipeline.

// Re-export all common test utilities
pub mod test_data;
