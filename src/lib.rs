//! archetype: a minimal CLI host
//!
//! Layered configuration resolves into an always-valid snapshot, a router
//! sends every invocation to exactly one exit code, and outbound-call
//! failures are classified into a small, stable taxonomy.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
