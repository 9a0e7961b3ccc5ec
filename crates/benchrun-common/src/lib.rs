//! Common types for benchrun: CRDs, errors, events, and Kubernetes helpers

#![deny(missing_docs)]

pub mod crd;
pub mod error;
pub mod events;
pub mod kube_utils;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// API version shared by all benchmark CRDs
pub const API_VERSION: &str = "perf.benchrun.dev/v1alpha1";

/// Label key naming the benchmark application a child resource belongs to
pub const APP_LABEL_KEY: &str = "perf.benchrun.dev/app";

/// Label key naming the run a child resource belongs to
pub const RUN_NAME_LABEL_KEY: &str = "perf.benchrun.dev/run-name";

/// Field manager used for server-side apply and status patches
pub const FIELD_MANAGER: &str = "benchrun-controller";
