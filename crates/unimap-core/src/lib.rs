pub mod analyzer;
pub mod cache;
pub mod classify;
pub mod config;
pub mod directory;
pub mod error;
pub mod file;
pub mod graph;
pub mod pipeline;
pub mod resolver;
pub mod syntax;
pub mod types;

pub use analyzer::SourceAnalyzer;
pub use classify::TypeClassifier;
pub use config::Config;
pub use error::AnalysisError;
pub use graph::DirectoryGraph;
pub use pipeline::AnalysisPipeline;
pub use resolver::{ExternalNamespaces, NamespaceOwnership};
pub use types::*;
