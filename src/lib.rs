//! # Boardflow
//!
//! Turn whiteboard workflows into planned work.
//!
//! Boardflow reads a Miro board, rebuilds the workflow it draws (steps,
//! arrows, groups and tags), asks an LLM to break it into epics, features
//! and user stories, and files those in a TargetProcess-style tracker.
//!
//! ## Pipeline
//!
//! - **board**: typed client for the whiteboard REST API
//! - **graph**: nodes, connections and derived insights
//! - **ai**: prompt building, completion providers and response parsing
//! - **ticketing**: work item hierarchy publishing
//! - **pipeline**: one run end to end, with JSON and Markdown artifacts
//! - **server**: HTTP shim that starts runs in the background
//!
//! ## Quick Start
//!
//! ```bash
//! export MIRO_ACCESS_TOKEN=... OPENAI_API_KEY=...
//! export TARGET_API_BASE_URL=https://acme.tpondemand.com/api/v1 TARGET_API_ACCESS_TOKEN=...
//!
//! boardflow analyze 42 uXjVN1234=
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

pub mod ai;
pub mod board;
pub mod core;
pub mod graph;
pub mod pipeline;
pub mod ticketing;

#[cfg(feature = "server")]
pub mod server;

pub use ai::{CompletionProvider, InsightAnalyzer, ProviderKind, WorkflowInsights};
pub use board::{BoardApi, MiroClient};
pub use core::{Config, Settings};
pub use graph::{WorkflowAnalysis, WorkflowBuilder};
pub use pipeline::{Pipeline, RunOptions, RunOutcome};
pub use ticketing::{TargetProcessClient, WorkItemApi, WorkItemPublisher};

/// Version of boardflow.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const APP_NAME: &str = "boardflow";
