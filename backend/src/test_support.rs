//! Test utilities for the backend crate.
//!
//! This module provides shared helpers for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is only compiled for tests or with the
//! `test-support` feature.

mod reference_fixtures;
mod runtime;

pub use reference_fixtures::{
    fixture_instant, fixture_rows, fixture_snapshot, knits_scope, rows,
};
pub use runtime::{ImmediateSleeper, MutableClock, NoJitter, RecordingSleeper};
