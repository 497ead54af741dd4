//! Eligibility and estimation engine for subsidized youth activities.
//!
//! The [`estimation`] module is the pure computation core: it takes an immutable aid
//! catalog snapshot and an eligibility context and returns a fresh estimate. The
//! [`config`], [`telemetry`], and [`error`] modules serve the callers that embed it.

pub mod config;
pub mod error;
pub mod estimation;
pub mod telemetry;
