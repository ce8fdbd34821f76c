//! `Watchpost` Core Library
//!
//! This crate provides the building blocks for the `watchpost` remote
//! health-check harness: SSH command execution with retry, output
//! sanitization and parsing, status classification, per-check raw
//! artifacts, and snapshot aggregation.
//!
//! # Crate Structure
//!
//! - [`model`] - Core data structures (Status, `CheckResult`, Snapshot)
//! - [`registry`] - Server profiles and check definitions (TOML)
//! - [`ssh`] - Blocking SSH transport, channel draining, remote command builders
//! - [`sanitize`] - Login banner and MOTD stripping
//! - [`parse`] - psql table, kubectl pod listing, and df parsers
//! - [`classify`] - Status thresholds and classification rules
//! - [`check`] - The query, pods, and disk check runners plus raw artifacts
//! - [`snapshot`] - Sequential harness and worst-of aggregation
//! - [`logging`] - Tracing subscriber setup
//! - [`error`] - Error types for each layer

#![warn(missing_docs)]

pub mod check;
pub mod classify;
pub mod error;
pub mod logging;
pub mod model;
pub mod parse;
pub mod registry;
pub mod sanitize;
pub mod snapshot;
pub mod ssh;

pub use error::{HarnessError, HarnessResult, RegistryError, RegistryResult, SshError, SshResult};
pub use model::{
    CheckResult, Details, EXIT_NEVER_RAN, Metrics, MountUsage, PodRow, QueryRow,
    RemoteExecOutcome, Snapshot, SnapshotEntry, Status,
};
pub use registry::{CheckKind, CheckSpec, Registry, ServerProfile};
pub use snapshot::Harness;
pub use ssh::{AuthCredential, ExecRequest, SshTransport, Timeouts, Transport};
