//! Pipeline error taxonomy.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal and non-fatal failures of a packaging run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Both the first fetch and its destructive retry failed.
    #[error("failed to fetch {url}@{reference} into {}", path.display())]
    FetchFailure {
        url: String,
        reference: String,
        path: PathBuf,
        code: Option<i32>,
    },

    #[error("unsupported toolset: {0}")]
    ToolsetResolutionFailure(String),

    #[error("{stage} failed with exit code {}: `{command}`", display_code(*code))]
    ExternalProcessFailure {
        stage: String,
        command: String,
        code: Option<i32>,
    },

    /// Optional metadata is allowed to be absent; required metadata is not.
    #[error("missing metadata: {what}")]
    MetadataMissing { what: String },

    #[error("invalid dependency manifest at line {line}: {message}")]
    ManifestParse { line: usize, message: String },
}

impl PipelineError {
    pub fn metadata_missing(what: impl Into<String>) -> Self {
        PipelineError::MetadataMissing { what: what.into() }
    }

    pub fn process(stage: impl Into<String>, command: impl Into<String>, code: Option<i32>) -> Self {
        PipelineError::ExternalProcessFailure {
            stage: stage.into(),
            command: command.into(),
            code,
        }
    }

    /// Exit code the CLI should terminate with.
    ///
    /// External failures propagate the child's code; a child killed by a
    /// signal, and every internal failure, maps to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::FetchFailure { code, .. }
            | PipelineError::ExternalProcessFailure { code, .. } => match code {
                Some(c) if *c != 0 => *c,
                _ => 1,
            },
            _ => 1,
        }
    }
}

fn display_code(code: Option<i32>) -> String {
    code.map_or_else(|| "<signal>".to_string(), |c| c.to_string())
}

/// Find the pipeline error inside an `anyhow` chain, if any.
pub fn find_pipeline_error(err: &anyhow::Error) -> Option<&PipelineError> {
    err.chain().find_map(|cause| cause.downcast_ref::<PipelineError>())
}
