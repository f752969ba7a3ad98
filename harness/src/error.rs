//! Errors that stop a run before any case executes

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("test fixture not found: {}", .0.display())]
    FixtureNotFound(PathBuf),

    #[error("no test cases found in {}", .0.display())]
    NoTestCases(PathBuf),

    #[error("scratch directory {} is in use by another run", .0.display())]
    ScratchBusy(PathBuf),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl HarnessError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        HarnessError::Io {
            context: context.into(),
            source,
        }
    }
}
