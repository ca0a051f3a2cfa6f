//! Store and policy configuration, and the store factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use gradecurve_core::policy::CoursePolicy;
use gradecurve_core::traits::{GradeStore, PolicySource};
use gradecurve_core::StoreError;

use crate::json::JsonFileStore;
use crate::memory::MemoryStore;

/// Which persistence backend to use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Records live only for the lifetime of the process.
    #[default]
    Memory,
    /// Records persist to a JSON file.
    Json { path: PathBuf },
}

/// Top-level gradecurve configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradecurveConfig {
    #[serde(default)]
    pub store: StoreConfig,
    /// Policy for courses without their own entry.
    #[serde(default)]
    pub default_policy: CoursePolicy,
    /// Per-course policy overrides keyed by course ID.
    #[serde(default)]
    pub courses: HashMap<String, CoursePolicy>,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./gradecurve-reports")
}

impl Default for GradecurveConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            default_policy: CoursePolicy::default(),
            courses: HashMap::new(),
            output_dir: default_output_dir(),
        }
    }
}

impl GradecurveConfig {
    /// The policy that applies to `course_id`.
    pub fn policy_for(&self, course_id: &str) -> CoursePolicy {
        self.courses
            .get(course_id)
            .cloned()
            .unwrap_or_else(|| self.default_policy.clone())
    }

    /// A policy source answering from this configuration.
    pub fn policy_source(&self) -> ConfigPolicySource {
        ConfigPolicySource {
            default_policy: self.default_policy.clone(),
            courses: self.courses.clone(),
        }
    }
}

/// Policy source backed by the configuration file.
#[derive(Debug, Clone, Default)]
pub struct ConfigPolicySource {
    default_policy: CoursePolicy,
    courses: HashMap<String, CoursePolicy>,
}

impl ConfigPolicySource {
    /// Add or replace the policy of one course.
    pub fn with_course(mut self, course_id: impl Into<String>, policy: CoursePolicy) -> Self {
        self.courses.insert(course_id.into(), policy);
        self
    }
}

#[async_trait]
impl PolicySource for ConfigPolicySource {
    async fn get_policy(&self, course_id: &str) -> Result<CoursePolicy, StoreError> {
        Ok(self
            .courses
            .get(course_id)
            .cloned()
            .unwrap_or_else(|| self.default_policy.clone()))
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are copied as-is and never rescanned.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `gradecurve.toml` in the current directory
/// 2. `~/.config/gradecurve/config.toml`
///
/// Environment variable overrides: `GRADECURVE_STORE_PATH`, `GRADECURVE_PASSING_THRESHOLD`.
pub fn load_config() -> Result<GradecurveConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<GradecurveConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("gradecurve.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<GradecurveConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => GradecurveConfig::default(),
    };

    apply_overrides(&mut config, |name| std::env::var(name).ok())?;
    Ok(config)
}

/// Apply environment overrides and resolve `${VAR}` references.
fn apply_overrides(
    config: &mut GradecurveConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(path) = lookup("GRADECURVE_STORE_PATH") {
        config.store = StoreConfig::Json {
            path: PathBuf::from(path),
        };
    }

    if let Some(raw) = lookup("GRADECURVE_PASSING_THRESHOLD") {
        let threshold: f64 = raw
            .trim()
            .parse()
            .with_context(|| format!("GRADECURVE_PASSING_THRESHOLD is not a number: {raw}"))?;
        config.default_policy.passing_threshold_percent = threshold;
    }

    if let StoreConfig::Json { path } = &mut config.store {
        *path = PathBuf::from(resolve_env_vars(&path.to_string_lossy()));
    }

    Ok(())
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("gradecurve"))
}

/// Create a store instance from its configuration.
pub fn create_store(config: &StoreConfig) -> Result<Arc<dyn GradeStore>> {
    match config {
        StoreConfig::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreConfig::Json { path } => {
            if path.as_os_str().is_empty() {
                anyhow::bail!("json store needs a non-empty path");
            }
            tracing::debug!(path = %path.display(), "using json grade store");
            Ok(Arc::new(JsonFileStore::new(path.clone())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_GRADECURVE_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_GRADECURVE_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_GRADECURVE_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        std::env::remove_var("_GRADECURVE_TEST_VAR");
    }

    #[test]
    fn resolve_env_vars_does_not_expand_values() {
        std::env::set_var("_GRADECURVE_SELF_REF", "${_GRADECURVE_SELF_REF}");
        assert_eq!(
            resolve_env_vars("/data/${_GRADECURVE_SELF_REF}/grades.json"),
            "/data/${_GRADECURVE_SELF_REF}/grades.json"
        );
        std::env::remove_var("_GRADECURVE_SELF_REF");
        assert_eq!(resolve_env_vars("a/${_GRADECURVE_UNSET_VAR}/b"), "a//b");
        assert_eq!(resolve_env_vars("open ${brace"), "open ${brace");
    }

    #[test]
    fn default_config() {
        let config = GradecurveConfig::default();
        assert_eq!(config.store, StoreConfig::Memory);
        assert_eq!(config.default_policy, CoursePolicy::default());
        assert!(config.courses.is_empty());
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
output_dir = "out"

[store]
type = "json"
path = "grades.json"

[default_policy]
passing_threshold_percent = 55

[courses.CS101]
total_sessions = 30
late_penalty_per_session = 0.25

[courses.CS101.quota_percent]
a = 20
"#;
        let config: GradecurveConfig = toml::from_str(toml_str).unwrap();
        assert!(matches!(config.store, StoreConfig::Json { .. }));
        assert_eq!(config.default_policy.passing_threshold_percent, 55.0);

        let cs101 = config.policy_for("CS101");
        assert_eq!(cs101.total_sessions, 30);
        assert_eq!(cs101.quota_percent.a, 20);
        // Overrides are whole policies, not merged with the default.
        assert_eq!(cs101.passing_threshold_percent, 60.0);
        assert_eq!(config.policy_for("MATH200").passing_threshold_percent, 55.0);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = GradecurveConfig::default();
        apply_overrides(&mut config, |name| match name {
            "GRADECURVE_STORE_PATH" => Some("/tmp/grades.json".into()),
            "GRADECURVE_PASSING_THRESHOLD" => Some(" 65 ".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(
            config.store,
            StoreConfig::Json {
                path: PathBuf::from("/tmp/grades.json")
            }
        );
        assert_eq!(config.default_policy.passing_threshold_percent, 65.0);
    }

    #[test]
    fn bad_threshold_override_is_an_error() {
        let mut config = GradecurveConfig::default();
        let result = apply_overrides(&mut config, |name| {
            (name == "GRADECURVE_PASSING_THRESHOLD").then(|| "sixty".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gradecurve.toml");
        std::fs::write(&path, "[default_policy]\ntotal_sessions = 12\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.default_policy.total_sessions, 12);

        assert!(load_config_from(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[tokio::test]
    async fn policy_source_prefers_course_override() {
        let mut strict = CoursePolicy::default();
        strict.passing_threshold_percent = 70.0;
        let source = GradecurveConfig::default()
            .policy_source()
            .with_course("CS101", strict);

        let cs101 = source.get_policy("CS101").await.unwrap();
        assert_eq!(cs101.passing_threshold_percent, 70.0);
        let other = source.get_policy("HIST100").await.unwrap();
        assert_eq!(other.passing_threshold_percent, 60.0);
    }

    #[test]
    fn factory_builds_each_backend() {
        assert_eq!(create_store(&StoreConfig::Memory).unwrap().name(), "memory");
        let json = create_store(&StoreConfig::Json {
            path: PathBuf::from("grades.json"),
        })
        .unwrap();
        assert_eq!(json.name(), "json");
        assert!(create_store(&StoreConfig::Json {
            path: PathBuf::new()
        })
        .is_err());
    }
}
