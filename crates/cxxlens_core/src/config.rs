//! Analyzer configuration.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use jsonschema::Validator;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::AnalysisError;
use crate::adapters::{Adapter, ToolKind};
use crate::runner::OutputStream;

// Embed the schema
const SCHEMA_JSON: &str = include_str!("../../../schemas/v1/config.json");
static CONFIG_SCHEMA: OnceLock<Validator> = OnceLock::new();

/// Configuration for the analyzer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerConfig {
    /// Only report issues on lines changed relative to the reference source.
    #[serde(default)]
    pub modified_lines_only: bool,

    /// Path to the rule profile document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<PathBuf>,

    /// Project key used to build component keys (`projectKey:relative/path`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_key: Option<String>,

    /// File patterns to include.
    #[serde(default)]
    pub include: Vec<String>,

    /// File patterns to exclude.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Per-tool settings. Tools without settings are not run.
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Base directory for resolving relative paths.
    /// This is usually the directory containing the configuration file.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

/// Settings for each supported tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cppcheck: Option<ToolSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rats: Option<ToolSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vera: Option<ToolSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pclint: Option<ToolSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomToolSettings>,
}

/// How to invoke one external tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSettings {
    /// Executable path or name looked up on `PATH`.
    pub executable: PathBuf,

    /// Argument string; the analyzed file is appended after it.
    #[serde(default)]
    pub arguments: String,

    /// Extra environment variables for the tool process.
    #[serde(default)]
    pub environment: Environment,

    /// Working directory for the tool process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,

    /// Time limit in milliseconds. Unset means wait for the tool indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Stream carrying the findings. Defaults to the tool's usual stream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<OutputStream>,

    /// Whether the tool runs at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl ToolSettings {
    /// Creates settings for an executable with no arguments.
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            arguments: String::new(),
            environment: Environment::default(),
            working_dir: None,
            timeout_ms: None,
            stream: None,
            enabled: true,
        }
    }

    /// Sets the argument string.
    pub fn with_arguments(mut self, arguments: impl Into<String>) -> Self {
        self.arguments = arguments.into();
        self
    }

    /// Sets the environment.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Sets the time limit.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Overrides the output stream.
    pub fn with_stream(mut self, stream: OutputStream) -> Self {
        self.stream = Some(stream);
        self
    }

    /// Returns the configured time limit.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    fn resolve_paths(&mut self, base_dir: &Path) {
        // Bare program names are left for PATH lookup.
        if self.executable.is_relative() && self.executable.components().count() > 1 {
            self.executable = base_dir.join(&self.executable);
        }
        if let Some(dir) = &self.working_dir
            && dir.is_relative()
        {
            self.working_dir = Some(base_dir.join(dir));
        }
    }
}

/// Settings for the "other" tool, which also carries a rule namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomToolSettings {
    #[serde(flatten)]
    pub settings: ToolSettings,

    /// Namespace inserted between `other.` and the tool's own rule id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// Environment for a tool process.
///
/// Either a JSON object or the `KEY=VALUE;KEY2=VALUE2` string form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Environment {
    /// `KEY=VALUE` pairs separated by `;`.
    Inline(String),
    /// Explicit map.
    Map(BTreeMap<String, String>),
}

impl Default for Environment {
    fn default() -> Self {
        Self::Map(BTreeMap::new())
    }
}

impl Environment {
    /// Resolves the environment into a map.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        match self {
            Environment::Map(map) => map.clone(),
            Environment::Inline(inline) => parse_inline_environment(inline),
        }
    }
}

fn parse_inline_environment(inline: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for entry in inline.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        match entry.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                map.insert(key.trim().to_string(), value.to_string());
            }
            _ => warn!("Ignoring malformed environment entry: {:?}", entry),
        }
    }
    map
}

impl AnalyzerConfig {
    /// Config file names searched by [`AnalyzerConfig::discover`].
    pub const CONFIG_FILES: &'static [&'static str] = &[".cxxlens.json"];

    /// Creates a configuration with no tools.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks for a config file in `dir`.
    pub fn discover(dir: impl AsRef<Path>) -> Option<PathBuf> {
        Self::CONFIG_FILES
            .iter()
            .map(|name| dir.as_ref().join(name))
            .find(|path| path.is_file())
    }

    /// Loads configuration from a file.
    ///
    /// Relative paths inside the file are resolved against its directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| AnalysisError::config(format!("Failed to read config: {}", e)))?;

        let mut config = Self::from_json(&content)?;

        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        config.base_dir = Some(parent.to_path_buf());
        config.resolve_paths();

        Ok(config)
    }

    /// Parses configuration from JSON string with schema validation.
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| AnalysisError::config(format!("Invalid JSON: {}", e)))?;

        let schema = CONFIG_SCHEMA.get_or_init(|| {
            let schema_json: serde_json::Value =
                serde_json::from_str(SCHEMA_JSON).expect("Invalid embedded config schema");
            Validator::new(&schema_json).expect("Invalid config schema compilation")
        });

        if let Err(e) = schema.validate(&value) {
            let error_msg = format!("{} at {}", e, e.instance_path());
            return Err(AnalysisError::config(format!(
                "Config validation failed: {}",
                error_msg
            )));
        }

        serde_json::from_value(value)
            .map_err(|e| AnalysisError::config(format!("Invalid config: {}", e)))
    }

    fn resolve_paths(&mut self) {
        let Some(base_dir) = self.base_dir.clone() else {
            return;
        };

        if let Some(profile) = &self.profile
            && profile.is_relative()
        {
            self.profile = Some(base_dir.join(profile));
        }

        for settings in [
            self.tools.cppcheck.as_mut(),
            self.tools.rats.as_mut(),
            self.tools.vera.as_mut(),
            self.tools.pclint.as_mut(),
            self.tools.custom.as_mut().map(|c| &mut c.settings),
        ]
        .into_iter()
        .flatten()
        {
            settings.resolve_paths(&base_dir);
        }
    }

    /// Returns the settings of a tool, if configured.
    pub fn tool_settings(&self, kind: ToolKind) -> Option<&ToolSettings> {
        match kind {
            ToolKind::CppCheck => self.tools.cppcheck.as_ref(),
            ToolKind::Rats => self.tools.rats.as_ref(),
            ToolKind::Vera => self.tools.vera.as_ref(),
            ToolKind::PcLint => self.tools.pclint.as_ref(),
            ToolKind::Custom => self.tools.custom.as_ref().map(|c| &c.settings),
        }
    }

    /// Builds the adapters for every configured and enabled tool.
    pub fn adapters(&self) -> Vec<Adapter> {
        ToolKind::ALL
            .into_iter()
            .filter_map(|kind| {
                let settings = self.tool_settings(kind)?;
                if !settings.enabled {
                    return None;
                }
                let custom_key = match kind {
                    ToolKind::Custom => self.tools.custom.as_ref().and_then(|c| c.key.clone()),
                    _ => None,
                };
                Some(Adapter::new(kind, settings.clone(), custom_key))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ToolAdapter;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_config_default_has_no_tools() {
        let config = AnalyzerConfig::new();
        assert!(!config.modified_lines_only);
        assert!(config.adapters().is_empty());
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "modifiedLinesOnly": true,
            "tools": {
                "cppcheck": {
                    "executable": "cppcheck",
                    "arguments": "--inline-suppr --enable=all --xml"
                },
                "vera": {
                    "executable": "vera++",
                    "arguments": "-nodup -showrules",
                    "environment": "VERA_ROOT=/opt/vera;EXTRA=1",
                    "timeoutMs": 5000
                },
                "custom": {
                    "executable": "python",
                    "arguments": "cpplint.py --output=vs7",
                    "key": "cpplint",
                    "enabled": false
                }
            }
        }"#;

        let config = AnalyzerConfig::from_json(json).unwrap();
        assert!(config.modified_lines_only);

        let vera = config.tools.vera.as_ref().unwrap();
        let env = vera.environment.to_map();
        assert_eq!(env["VERA_ROOT"], "/opt/vera");
        assert_eq!(env["EXTRA"], "1");
        assert_eq!(vera.timeout(), Some(Duration::from_secs(5)));

        let custom = config.tools.custom.as_ref().unwrap();
        assert_eq!(custom.key.as_deref(), Some("cpplint"));

        let kinds: Vec<ToolKind> = config.adapters().iter().map(|a| a.kind()).collect();
        assert_eq!(kinds, vec![ToolKind::CppCheck, ToolKind::Vera]);
    }

    #[test]
    fn test_environment_map_form() {
        let json = r#"{ "tools": { "rats": {
            "executable": "rats",
            "environment": { "RATS_HOME": "/opt/rats" }
        } } }"#;
        let config = AnalyzerConfig::from_json(json).unwrap();
        let env = config.tools.rats.unwrap().environment.to_map();
        assert_eq!(env.len(), 1);
        assert_eq!(env["RATS_HOME"], "/opt/rats");
    }

    #[rstest]
    #[case("", 0)]
    #[case("A=1", 1)]
    #[case("A=1;B=2;", 2)]
    #[case("A=1;garbage;=3", 1)]
    #[case("PATH=C:\\tools;X=a=b", 2)]
    fn test_inline_environment(#[case] inline: &str, #[case] expected_len: usize) {
        assert_eq!(parse_inline_environment(inline).len(), expected_len);
    }

    #[test]
    fn test_inline_environment_keeps_equals_in_value() {
        let env = parse_inline_environment("X=a=b");
        assert_eq!(env["X"], "a=b");
    }

    #[test]
    fn test_from_file_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".cxxlens.json");
        std::fs::write(
            &path,
            r#"{
                "profile": "profiles/cxx.json",
                "tools": {
                    "cppcheck": { "executable": "tools/cppcheck", "workingDir": "build" },
                    "rats": { "executable": "rats" }
                }
            }"#,
        )
        .unwrap();

        let config = AnalyzerConfig::from_file(&path).unwrap();
        assert_eq!(config.base_dir.as_deref(), Some(dir.path()));
        assert_eq!(
            config.profile.as_deref(),
            Some(dir.path().join("profiles/cxx.json").as_path())
        );

        let cppcheck = config.tools.cppcheck.as_ref().unwrap();
        assert_eq!(cppcheck.executable, dir.path().join("tools/cppcheck"));
        assert_eq!(cppcheck.working_dir, Some(dir.path().join("build")));

        // Bare names stay untouched for PATH lookup.
        assert_eq!(config.tools.rats.unwrap().executable, PathBuf::from("rats"));
    }

    #[test]
    fn test_discover() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AnalyzerConfig::discover(dir.path()).is_none());

        std::fs::write(dir.path().join(".cxxlens.json"), "{}").unwrap();
        assert_eq!(
            AnalyzerConfig::discover(dir.path()),
            Some(dir.path().join(".cxxlens.json"))
        );
    }

    #[rstest]
    #[case::unknown_property(r#"{ "toolz": {} }"#, "Config validation failed")]
    #[case::unknown_tool(r#"{ "tools": { "clang-tidy": { "executable": "x" } } }"#, "Config validation failed")]
    #[case::missing_executable(r#"{ "tools": { "cppcheck": { "arguments": "--xml" } } }"#, "Config validation failed")]
    #[case::bad_stream(r#"{ "tools": { "rats": { "executable": "rats", "stream": "both" } } }"#, "Config validation failed")]
    #[case::type_mismatch(r#"{ "modifiedLinesOnly": "yes" }"#, "Config validation failed")]
    #[case::invalid_json(r#"{ "tools": "#, "Invalid JSON")]
    fn test_config_validation_errors(#[case] json: &str, #[case] expected_error_part: &str) {
        let result = AnalyzerConfig::from_json(json);
        assert!(result.is_err(), "Expected error for JSON: {}", json);
        let err = result.unwrap_err();
        assert!(
            err.to_string().contains(expected_error_part),
            "Error message '{}' should contain '{}'",
            err,
            expected_error_part
        );
    }
}
