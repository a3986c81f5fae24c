//! packlet: bundles a tree of JavaScript modules into one self-loading script
//!
//! The pipeline is [`graph::GraphBuilder`] (driving [`asset::AssetCompiler`])
//! followed by [`emit::emit`]. [`orchestrator::BundleOrchestrator`] wires both
//! to the configuration and the filesystem.

pub mod asset;
pub mod config;
pub mod dirs;
pub mod emit;
pub mod error;
pub mod graph;
pub mod loader;
pub mod orchestrator;
pub mod resolver;
pub mod transform;
pub mod types;

pub use error::BundleError;
