use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the analysis pipeline.
///
/// `RootNotFound` aborts a run. `Read` and `Parse` are per-file: the
/// offending file is skipped and the run continues.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("path '{}' does not exist", .0.display())]
    RootNotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },
}

impl AnalysisError {
    /// Whether the run can continue past this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, AnalysisError::RootNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_not_found_is_fatal() {
        let err = AnalysisError::RootNotFound(PathBuf::from("/nope"));
        assert!(!err.is_recoverable());
        assert_eq!(err.to_string(), "path '/nope' does not exist");
    }

    #[test]
    fn test_per_file_errors_are_recoverable() {
        let err = AnalysisError::Parse {
            path: PathBuf::from("Assets/Broken.cs"),
            reason: "parser returned no tree".to_string(),
        };
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("Assets/Broken.cs"));

        let err = AnalysisError::Read {
            path: PathBuf::from("Assets/Binary.cs"),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, "not utf-8"),
        };
        assert!(err.is_recoverable());
    }
}
