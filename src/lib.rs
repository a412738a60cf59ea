//! # municipality-check
//!
//! Batch compliance check for Nexus citizens missing a paying or acting
//! municipality.
//!
//! Populates a Postgres-backed work queue from organization rosters, then
//! drains it: each citizen is classified, and deficient citizens get a
//! follow-up task on their active engagement, assigned to the responsible
//! case worker. Every terminal outcome is reported and tracked.

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod model;
pub mod nexus;
pub mod telemetry;
