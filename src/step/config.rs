//! Typed step configuration
//!
//! A configuration document is validated once, when it is turned into a
//! [`StepConfig`]. Everything downstream works with typed fields instead of
//! looking keys up in a YAML mapping.

use crate::step::{ExecutionId, StepError, StepKind};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

/// Default location of the generator's user configuration inside the guest
pub const DEFAULT_ARTMAN_USER_CONFIG: &str = "/root/.artman/config.yaml";

/// A git repository reference, remote or local
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Remote URL, absolute local path or `file://` URL
    pub git_repo: String,
    /// Branch to clone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
    /// Commit to check out after cloning an input repository
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_commit: Option<String>,
    /// User name spliced into the clone URL together with the token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_user_name: Option<String>,
    /// Access token spliced into the clone URL together with the user name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_security_token: Option<String>,
}

impl RepoConfig {
    /// Creates a reference to `git_repo` with no branch or credentials
    #[must_use]
    pub fn new(git_repo: impl Into<String>) -> Self {
        Self {
            git_repo: git_repo.into(),
            git_branch: None,
            git_commit: None,
            git_user_name: None,
            git_security_token: None,
        }
    }

    /// Sets the branch
    #[must_use]
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.git_branch = Some(branch.into());
        self
    }

    /// Sets the commit
    #[must_use]
    pub fn with_commit(mut self, commit: impl Into<String>) -> Self {
        self.git_commit = Some(commit.into());
        self
    }

    /// Sets both credentials
    #[must_use]
    pub fn with_credentials(mut self, user: impl Into<String>, token: impl Into<String>) -> Self {
        self.git_user_name = Some(user.into());
        self.git_security_token = Some(token.into());
        self
    }

    /// Returns the user name and token when both are configured
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.git_user_name, &self.git_security_token) {
            (Some(user), Some(token)) => Some((user, token)),
            _ => None,
        }
    }
}

/// One generator invocation: a client config file and the actions to run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiTarget {
    /// Client config path, relative to the guest root
    pub path: String,
    /// Comma-separated generator arguments, e.g. `java` or `generate,java`
    pub target: String,
}

impl ApiTarget {
    /// Generator action arguments; `generate` is implied for a single token
    #[must_use]
    pub fn actions(&self) -> Vec<String> {
        let mut actions: Vec<String> = self
            .target
            .split(',')
            .map(|part| part.trim().to_string())
            .collect();
        if actions.len() == 1 {
            actions.insert(0, "generate".to_string());
        }
        actions
    }

    /// API name taken from `.../artman_<name>.yaml`
    #[must_use]
    pub fn api_name(&self) -> &str {
        let after = self
            .path
            .split_once("/artman_")
            .map_or("", |(_, rest)| rest);
        after.split_once(".yaml").map_or(after, |(name, _)| name)
    }
}

/// Configuration of a sources generation step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesGenerationConfig {
    /// Execution this configuration belongs to
    pub execution_id: ExecutionId,
    /// Image the guest runs in
    pub docker_image: String,
    /// Guest working root
    pub guest_root_path: String,
    /// Keep a snapshot of the guest root even on success and run verbose
    #[serde(default)]
    pub debug_mode: bool,
    /// Generator sources
    pub artman: RepoConfig,
    /// Toolkit sources used by the generator
    pub toolkit: RepoConfig,
    /// API definitions
    pub googleapis: RepoConfig,
    /// APIs to generate
    pub artman_client_yaml_configs: Vec<ApiTarget>,
    /// Generator user configuration written inside the guest
    #[serde(default = "default_artman_user_config")]
    pub artman_user_config: String,
    /// Keys this crate does not interpret, passed through untouched
    #[serde(flatten)]
    pub extra: Mapping,
}

fn default_artman_user_config() -> String {
    DEFAULT_ARTMAN_USER_CONFIG.to_string()
}

/// Output repository of a staging step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingRepoConfig {
    /// Repository to push to; its branch is created from the execution id
    #[serde(flatten)]
    pub repo: RepoConfig,
    /// Run `test_command` before committing
    #[serde(default)]
    pub run_tests: bool,
    /// Test command, run in the checked-out repository
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_command: Option<Vec<String>>,
    /// Committer e-mail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_user_email: Option<String>,
}

impl StagingRepoConfig {
    /// Test command to run, `mvn -q test` unless configured
    #[must_use]
    pub fn test_command(&self) -> Vec<String> {
        self.test_command
            .clone()
            .unwrap_or_else(|| vec!["mvn".into(), "-q".into(), "test".into()])
    }
}

/// Artifacts of an earlier generation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorArtifacts {
    /// Archive of generated sources; a host path before staging, a guest
    /// path after
    pub sources_zip: String,
}

/// Copies `java/<from>/src` of the generated sources to `<to>` in the repo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleMapping {
    /// Generated module directory name
    pub from: String,
    /// Destination directory, relative to the repository root
    pub to: String,
}

/// Configuration of a Java sources staging step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JavaStagingConfig {
    /// Execution this configuration belongs to
    pub execution_id: ExecutionId,
    /// Image the guest runs in
    pub docker_image: String,
    /// Guest working root
    pub guest_root_path: String,
    /// Keep a snapshot of the guest root even on success
    #[serde(default)]
    pub debug_mode: bool,
    /// Repository receiving the sources
    pub staging: StagingRepoConfig,
    /// Generated sources to stage
    pub generator_artifacts: GeneratorArtifacts,
    /// Module copy rules
    #[serde(default)]
    pub modules: Vec<ModuleMapping>,
    /// Keys this crate does not interpret, passed through untouched
    #[serde(flatten)]
    pub extra: Mapping,
}

/// Validated configuration of one execution
#[derive(Debug, Clone, PartialEq)]
pub enum StepConfig {
    /// See [`SourcesGenerationConfig`]
    SourcesGeneration(SourcesGenerationConfig),
    /// See [`JavaStagingConfig`]
    JavaSourcesStaging(JavaStagingConfig),
}

const COMMON_KEYS: &[&str] = &["execution_id", "docker_image", "guest_root_path"];

const SOURCES_GENERATION_KEYS: &[&str] = &[
    "artman.git_repo",
    "toolkit.git_repo",
    "googleapis.git_repo",
    "artman_client_yaml_configs",
];

const JAVA_STAGING_KEYS: &[&str] = &["staging.git_repo", "generator_artifacts.sources_zip"];

impl StepConfig {
    /// Validates a configuration document for the given step kind
    ///
    /// # Errors
    ///
    /// Returns [`StepError::MissingKey`] naming the first absent required
    /// key, [`StepError::InvalidIdentifier`] for a malformed
    /// `execution_id`, or [`StepError::Document`] when a value has the
    /// wrong shape.
    pub fn from_document(kind: StepKind, document: Value) -> Result<Self, StepError> {
        let specific = match kind {
            StepKind::SourcesGeneration => SOURCES_GENERATION_KEYS,
            StepKind::JavaSourcesStaging => JAVA_STAGING_KEYS,
        };
        for key in COMMON_KEYS.iter().chain(specific) {
            require(&document, key)?;
        }

        let raw_id = document["execution_id"]
            .as_str()
            .ok_or_else(|| StepError::Document("execution_id must be a string".to_string()))?;
        ExecutionId::validate(raw_id)?;

        let config = match kind {
            StepKind::SourcesGeneration => {
                let config: SourcesGenerationConfig = serde_yaml::from_value(document)?;
                for (section, repo) in [
                    ("artman", &config.artman),
                    ("toolkit", &config.toolkit),
                    ("googleapis", &config.googleapis),
                ] {
                    require_input_branch(section, repo)?;
                }
                StepConfig::SourcesGeneration(config)
            }
            StepKind::JavaSourcesStaging => {
                StepConfig::JavaSourcesStaging(serde_yaml::from_value(document)?)
            }
        };
        Ok(config)
    }

    /// Step kind of this configuration
    #[must_use]
    pub fn kind(&self) -> StepKind {
        match self {
            StepConfig::SourcesGeneration(_) => StepKind::SourcesGeneration,
            StepConfig::JavaSourcesStaging(_) => StepKind::JavaSourcesStaging,
        }
    }

    /// Execution identifier
    #[must_use]
    pub fn execution_id(&self) -> &ExecutionId {
        match self {
            StepConfig::SourcesGeneration(c) => &c.execution_id,
            StepConfig::JavaSourcesStaging(c) => &c.execution_id,
        }
    }

    /// Image the guest runs in
    #[must_use]
    pub fn docker_image(&self) -> &str {
        match self {
            StepConfig::SourcesGeneration(c) => &c.docker_image,
            StepConfig::JavaSourcesStaging(c) => &c.docker_image,
        }
    }

    /// Guest working root
    #[must_use]
    pub fn guest_root_path(&self) -> &str {
        match self {
            StepConfig::SourcesGeneration(c) => &c.guest_root_path,
            StepConfig::JavaSourcesStaging(c) => &c.guest_root_path,
        }
    }

    /// Whether a debug snapshot is kept on success
    #[must_use]
    pub fn debug_mode(&self) -> bool {
        match self {
            StepConfig::SourcesGeneration(c) => c.debug_mode,
            StepConfig::JavaSourcesStaging(c) => c.debug_mode,
        }
    }
}

impl Serialize for StepConfig {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StepConfig::SourcesGeneration(c) => c.serialize(serializer),
            StepConfig::JavaSourcesStaging(c) => c.serialize(serializer),
        }
    }
}

fn require(document: &Value, dotted: &str) -> Result<(), StepError> {
    let mut current = document;
    for segment in dotted.split('.') {
        match current.get(segment) {
            Some(value) if !value.is_null() => current = value,
            _ => {
                return Err(StepError::MissingKey {
                    key: dotted.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn require_input_branch(section: &str, repo: &RepoConfig) -> Result<(), StepError> {
    let local = crate::step::repository::local_path(&repo.git_repo).is_some();
    if !local && repo.git_branch.is_none() {
        return Err(StepError::MissingKey {
            key: format!("{section}.git_branch"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config_channel;
    use pretty_assertions::assert_eq;

    const SOURCES_GENERATION: &str = "\
execution_id: src-gen-ab12cd34
docker_image: artman:0.16
guest_root_path: /artmanflow
local_volumes: ''
debug_mode: true
artman:
  git_repo: https://github.com/googleapis/artman.git
  git_branch: master
  git_commit: 0123abc
toolkit:
  git_repo: /home/dev/toolkit
googleapis:
  git_repo: file:///home/dev/googleapis
artman_client_yaml_configs:
- path: googleapis/google/pubsub/artman_pubsub.yaml
  target: java
";

    #[test]
    fn test_sources_generation_from_document() {
        let document = config_channel::parse(SOURCES_GENERATION, None).unwrap();
        let config = StepConfig::from_document(StepKind::SourcesGeneration, document).unwrap();

        assert_eq!(config.kind(), StepKind::SourcesGeneration);
        assert_eq!(config.execution_id().as_str(), "src-gen-ab12cd34");
        assert!(config.debug_mode());

        let StepConfig::SourcesGeneration(config) = config else {
            panic!("wrong variant");
        };
        assert_eq!(config.artman.git_commit.as_deref(), Some("0123abc"));
        assert_eq!(config.artman_user_config, DEFAULT_ARTMAN_USER_CONFIG);
        assert!(config.extra.contains_key("local_volumes"));
    }

    #[test]
    fn test_missing_key_is_reported_with_path() {
        let document = config_channel::parse(
            &SOURCES_GENERATION.replace("  git_repo: /home/dev/toolkit\n", "  git_branch: x\n"),
            None,
        )
        .unwrap();
        let err = StepConfig::from_document(StepKind::SourcesGeneration, document).unwrap_err();
        assert_eq!(
            err,
            StepError::MissingKey {
                key: "toolkit.git_repo".to_string()
            }
        );
    }

    #[test]
    fn test_remote_input_repo_needs_branch() {
        let document = config_channel::parse(
            &SOURCES_GENERATION.replace("  git_branch: master\n", ""),
            None,
        )
        .unwrap();
        let err = StepConfig::from_document(StepKind::SourcesGeneration, document).unwrap_err();
        assert_eq!(
            err,
            StepError::MissingKey {
                key: "artman.git_branch".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_execution_id_is_rejected() {
        let document = config_channel::parse(
            &SOURCES_GENERATION.replace("src-gen-ab12cd34", "'src gen'"),
            None,
        )
        .unwrap();
        let err = StepConfig::from_document(StepKind::SourcesGeneration, document).unwrap_err();
        assert!(matches!(err, StepError::InvalidIdentifier { .. }));
    }

    #[test]
    fn test_java_staging_from_document() {
        let text = "\
execution_id: java-src-stage-0a1b2c3d
docker_image: staging:1
guest_root_path: /artmanflow
staging:
  git_repo: https://github.com/acme/google-cloud-java.git
  git_user_name: bot
  git_security_token: secret
  run_tests: true
generator_artifacts:
  sources_zip: /tmp/artifacts.tar.gz
modules:
- from: gapic-google-cloud-pubsub-v1
  to: google-cloud-clients/google-cloud-pubsub
";
        let document = config_channel::parse(text, None).unwrap();
        let config = StepConfig::from_document(StepKind::JavaSourcesStaging, document).unwrap();
        let StepConfig::JavaSourcesStaging(config) = config else {
            panic!("wrong variant");
        };
        assert_eq!(config.staging.repo.credentials(), Some(("bot", "secret")));
        assert!(config.staging.run_tests);
        assert_eq!(config.staging.test_command(), vec!["mvn", "-q", "test"]);
        assert_eq!(config.modules.len(), 1);
        assert!(!config.debug_mode);
    }

    #[test]
    fn test_typed_config_round_trips_through_document() {
        let document = config_channel::parse(SOURCES_GENERATION, None).unwrap();
        let config = StepConfig::from_document(StepKind::SourcesGeneration, document).unwrap();

        let text = serde_yaml::to_string(&config).unwrap();
        let reparsed = StepConfig::from_document(
            StepKind::SourcesGeneration,
            config_channel::parse(&text, None).unwrap(),
        )
        .unwrap();
        assert_eq!(reparsed, config);
    }

    #[test]
    fn test_api_target_actions_and_name() {
        let single = ApiTarget {
            path: "googleapis/google/pubsub/artman_pubsub.yaml".to_string(),
            target: "java".to_string(),
        };
        assert_eq!(single.actions(), vec!["generate", "java"]);
        assert_eq!(single.api_name(), "pubsub");

        let explicit = ApiTarget {
            path: "google/vision/artman_vision_v1.yaml".to_string(),
            target: "publish,java".to_string(),
        };
        assert_eq!(explicit.actions(), vec!["publish", "java"]);
        assert_eq!(explicit.api_name(), "vision_v1");
    }
}
