// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 procpipe contributors

//! Pipeline definition structures
//!
//! [`PipelineSpec`] is the caller's unresolved configuration; [`StageSpec`] is
//! one resolved sub-process. [`PipelineConfig`] is the on-disk form loaded
//! from YAML, TOML or JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::command::build_stages;
use crate::env::EnvPolicy;
use crate::errors::{ParseError, PipeError, PipeResult};
use crate::pipeline::Pipeline;

/// Per-line output transform. Receives a line without its newline.
pub type LineHandler = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// One resolved sub-process definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSpec {
    /// Executable path or name
    pub program: String,

    /// Arguments, not including the program
    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory (`None` runs in the caller's current directory)
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Complete environment for the process (`None` inherits)
    #[serde(default)]
    pub env: Option<Vec<(String, String)>>,
}

impl StageSpec {
    /// Create a stage running `program` with no arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            dir: None,
            env: None,
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Program followed by its arguments
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}

impl fmt::Display for StageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv().join(" "))
    }
}

/// Source of the stages: a command string XOR a pre-built list
#[derive(Debug, Clone)]
pub enum CommandSource {
    /// Shell-style command string with `|` separators
    Command(String),
    /// Pre-built stages; unset `dir`/`env` fields take the pipeline's
    Stages(Vec<StageSpec>),
}

/// Unresolved pipeline configuration
#[derive(Clone)]
pub struct PipelineSpec {
    pub source: CommandSource,
    /// Working directory for every stage that does not set its own
    /// (default: current dir)
    pub dir: Option<PathBuf>,
    pub env: EnvPolicy,
    pub line_handler: Option<LineHandler>,
    /// Connect the first stage to the caller's stdin instead of null
    pub inherit_stdin: bool,
}

impl fmt::Debug for PipelineSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineSpec")
            .field("source", &self.source)
            .field("dir", &self.dir)
            .field("env", &self.env)
            .field("line_handler", &self.line_handler.is_some())
            .field("inherit_stdin", &self.inherit_stdin)
            .finish()
    }
}

impl PipelineSpec {
    fn from_source(source: CommandSource) -> Self {
        Self {
            source,
            dir: None,
            env: EnvPolicy::Inherit,
            line_handler: None,
            inherit_stdin: false,
        }
    }

    /// Pipeline from a command string such as `ps aux | grep ssh`
    pub fn command(command: impl Into<String>) -> Self {
        Self::from_source(CommandSource::Command(command.into()))
    }

    /// Pipeline from explicit stages
    pub fn stages(stages: Vec<StageSpec>) -> Self {
        Self::from_source(CommandSource::Stages(stages))
    }

    /// Set the working directory
    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Replace the ambient environment with `vars`
    pub fn env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = EnvPolicy::Override(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Set the environment policy
    pub fn env_policy(mut self, policy: EnvPolicy) -> Self {
        self.env = policy;
        self
    }

    /// Transform each output line before it is buffered
    pub fn line_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.line_handler = Some(Arc::new(handler));
        self
    }

    /// Connect the first stage to the caller's stdin
    pub fn inherit_stdin(mut self, inherit: bool) -> Self {
        self.inherit_stdin = inherit;
        self
    }

    /// Resolve the configuration into a pipeline ready to start
    pub fn build(self) -> PipeResult<Pipeline> {
        let stages = match &self.source {
            CommandSource::Command(command) => {
                let dir = match &self.dir {
                    Some(dir) => dir.clone(),
                    None => std::env::current_dir().map_err(|e| PipeError::WorkingDir {
                        message: e.to_string(),
                    })?,
                };
                build_stages(command, &self.env, &dir)?
            }
            CommandSource::Stages(stages) => {
                if stages.is_empty() {
                    return Err(ParseError::NoStages.into());
                }
                if let Some(index) = stages.iter().position(|s| s.program.is_empty()) {
                    return Err(ParseError::EmptyStage { index }.into());
                }
                let stage_env = self.env.materialize();
                stages
                    .iter()
                    .cloned()
                    .map(|mut stage| {
                        if stage.dir.is_none() {
                            stage.dir = self.dir.clone();
                        }
                        if stage.env.is_none() {
                            stage.env = stage_env.clone();
                        }
                        stage
                    })
                    .collect()
            }
        };

        Ok(Pipeline::new(stages, self.line_handler, self.inherit_stdin))
    }
}

/// Pipeline configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Command string (mutually exclusive with `stages`)
    #[serde(default)]
    pub command: Option<String>,

    /// Explicit stages (mutually exclusive with `command`)
    #[serde(default)]
    pub stages: Vec<StageSpec>,

    /// Working directory
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Environment override
    #[serde(default)]
    pub env: Option<BTreeMap<String, String>>,

    /// Seed the override from the ambient environment
    #[serde(default)]
    pub inherit_env: bool,

    /// Connect the first stage to the caller's stdin
    #[serde(default)]
    pub stdin: bool,
}

impl PipelineConfig {
    /// Load a config file, picking the format from its extension
    pub fn from_file(path: &Path) -> PipeResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PipeError::ConfigRead {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml(&content),
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            _ => Err(PipeError::UnsupportedConfig {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Parse a config from YAML
    pub fn from_yaml(yaml: &str) -> PipeResult<Self> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    /// Convert into a pipeline spec
    pub fn into_spec(self) -> PipeResult<PipelineSpec> {
        let mut spec = match (self.command, self.stages.is_empty()) {
            (Some(command), true) => PipelineSpec::command(command),
            (None, false) => PipelineSpec::stages(self.stages),
            (Some(_), false) => {
                return Err(PipeError::InvalidConfig {
                    reason: "'command' and 'stages' are mutually exclusive".into(),
                })
            }
            (None, true) => return Err(ParseError::NoStages.into()),
        };

        spec.env = match (self.env, self.inherit_env) {
            (Some(vars), true) => EnvPolicy::inherit_with(vars),
            (Some(vars), false) => EnvPolicy::Override(vars),
            (None, _) => EnvPolicy::Inherit,
        };
        spec.dir = self.dir;
        spec.inherit_stdin = self.stdin;

        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_builder() {
        let stage = StageSpec::new("grep").arg("-i").args(["foo", "bar"]);
        assert_eq!(stage.argv(), vec!["grep", "-i", "foo", "bar"]);
        assert_eq!(stage.to_string(), "grep -i foo bar");
    }

    #[test]
    fn test_build_from_command() {
        let pipeline = PipelineSpec::command("echo a | wc -c").dir("/").build().unwrap();
        assert_eq!(pipeline.stages().len(), 2);
        assert_eq!(pipeline.stages()[1].dir, Some(PathBuf::from("/")));
    }

    #[test]
    fn test_build_defaults_to_current_dir() {
        let pipeline = PipelineSpec::command("true").build().unwrap();
        assert_eq!(
            pipeline.stages()[0].dir,
            Some(std::env::current_dir().unwrap())
        );
    }

    #[test]
    fn test_build_from_stages_validates() {
        assert!(matches!(
            PipelineSpec::stages(vec![]).build(),
            Err(PipeError::Parse(ParseError::NoStages))
        ));
        assert!(matches!(
            PipelineSpec::stages(vec![StageSpec::new("echo"), StageSpec::new("")]).build(),
            Err(PipeError::Parse(ParseError::EmptyStage { index: 1 }))
        ));
    }

    #[test]
    fn test_build_from_stages_fills_unset_dir_and_env() {
        let mut own = StageSpec::new("cat");
        own.dir = Some(PathBuf::from("/srv"));
        own.env = Some(vec![("OWN".into(), "1".into())]);

        let pipeline = PipelineSpec::stages(vec![StageSpec::new("ls"), own])
            .dir("/tmp")
            .env([("FOO", "bar")])
            .build()
            .unwrap();
        let stages = pipeline.stages();

        assert_eq!(stages[0].dir, Some(PathBuf::from("/tmp")));
        assert_eq!(stages[0].env, Some(vec![("FOO".into(), "bar".into())]));
        assert_eq!(stages[1].dir, Some(PathBuf::from("/srv")));
        assert_eq!(stages[1].env, Some(vec![("OWN".into(), "1".into())]));
    }

    #[test]
    fn test_parse_yaml_config() {
        let yaml = r#"
command: "echo $GREETING | tr a-z A-Z"
dir: /tmp
env:
  GREETING: hello
"#;

        let config = PipelineConfig::from_yaml(yaml).unwrap();
        let spec = config.into_spec().unwrap();
        assert_eq!(spec.dir, Some(PathBuf::from("/tmp")));

        let pipeline = spec.build().unwrap();
        assert_eq!(pipeline.stages()[0].args, vec!["hello"]);
    }

    #[test]
    fn test_parse_yaml_stages() {
        let yaml = r#"
stages:
  - program: printf
    args: ["a\nb\n"]
  - program: sort
    args: ["-r"]
"#;

        let spec = PipelineConfig::from_yaml(yaml).unwrap().into_spec().unwrap();
        let pipeline = spec.build().unwrap();
        assert_eq!(pipeline.stages().len(), 2);
        assert_eq!(pipeline.stages()[1].argv(), vec!["sort", "-r"]);
    }

    #[test]
    fn test_config_rejects_both_sources() {
        let yaml = r#"
command: "echo"
stages:
  - program: echo
"#;
        let config = PipelineConfig::from_yaml(yaml).unwrap();
        assert!(config.into_spec().is_err());
    }

    #[test]
    fn test_config_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipe.toml");
        std::fs::write(&path, "command = \"echo hi | cat\"\n").unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.command.as_deref(), Some("echo hi | cat"));
    }

    #[test]
    fn test_config_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipe.ini");
        std::fs::write(&path, "").unwrap();

        assert!(matches!(
            PipelineConfig::from_file(&path),
            Err(PipeError::UnsupportedConfig { .. })
        ));
    }
}
