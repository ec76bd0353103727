//! Unit tests for configuration loading and validation.
//!
//! - `helpers`: Shared test utilities
//! - `precedence`: Layer precedence tests
//! - `field_resolution`: Required-field and token resolution tests
//! - `sync_settings`: Scheduler pacing tests

mod helpers;
