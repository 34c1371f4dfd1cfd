//! Step kinds

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the archive produced by a sources generation run
pub const ARTIFACT_ARCHIVE: &str = "artifacts.tar.gz";

/// Name of the metadata document produced alongside (or instead of) the archive
pub const ARTIFACT_METADATA: &str = "artifacts.yaml";

/// The kinds of step this crate knows how to stage and run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Checkout generator sources and run the generator for a list of APIs
    SourcesGeneration,
    /// Push generated Java sources to a branch of a staging repository
    JavaSourcesStaging,
}

impl StepKind {
    /// All known kinds
    pub const ALL: [StepKind; 2] = [StepKind::SourcesGeneration, StepKind::JavaSourcesStaging];

    /// Step name used in host-side file names
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            StepKind::SourcesGeneration => "sources_generation",
            StepKind::JavaSourcesStaging => "java_sources_staging",
        }
    }

    /// Prefix of generated execution identifiers
    #[must_use]
    pub fn id_prefix(self) -> &'static str {
        match self {
            StepKind::SourcesGeneration => "src-gen-",
            StepKind::JavaSourcesStaging => "java-src-stage-",
        }
    }

    /// File whose presence in the output directory marks a finished run
    #[must_use]
    pub fn completion_artifact(self) -> &'static str {
        match self {
            StepKind::SourcesGeneration => ARTIFACT_ARCHIVE,
            StepKind::JavaSourcesStaging => ARTIFACT_METADATA,
        }
    }

    /// Command-line slug of the step
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            StepKind::SourcesGeneration => "sources-generation",
            StepKind::JavaSourcesStaging => "java-sources-staging",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_names() {
        assert_eq!(StepKind::SourcesGeneration.to_string(), "sources_generation");
        assert_eq!(StepKind::JavaSourcesStaging.slug(), "java-sources-staging");
    }

    #[test]
    fn test_completion_artifacts() {
        assert_eq!(
            StepKind::SourcesGeneration.completion_artifact(),
            "artifacts.tar.gz"
        );
        assert_eq!(
            StepKind::JavaSourcesStaging.completion_artifact(),
            "artifacts.yaml"
        );
    }
}
