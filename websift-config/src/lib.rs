//! Loader for workspace configuration with YAML + environment overlays.
//!
//! A `websift.yaml` file describes the LLM provider and the retrieval
//! tunables; `WEBSIFT_`-prefixed environment variables override individual
//! keys and `${VAR}` placeholders inside values are expanded before the
//! strongly typed config is materialised.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use websift_common::RetrievalConfig;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Deserialize)]
pub struct WebsiftConfig {
    pub version: Option<String>,
    pub llm: LlmConfig,
    #[serde(default)]
    pub retrieval: RetrievalSection,
}

/// The tag is `provider`; remaining keys are provider-specific.
#[derive(Debug, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum LlmConfig {
    Openai {
        model: String,
        auth_token: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<u32>,
        #[serde(default = "default_openai_endpoint")]
        endpoint: String,
    },
    Ollama {
        model: String,
        #[serde(default = "default_ollama_endpoint")]
        endpoint: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<u32>,
    },
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".into()
}
fn default_ollama_endpoint() -> String {
    "http://localhost:11434".into()
}

/// Retrieval tunables; every field falls back to the shipped default.
#[derive(Debug, Default, Deserialize)]
pub struct RetrievalSection {
    pub pool_size: Option<usize>,
    pub page_timeout_ms: Option<u64>,
    pub search_timeout_ms: Option<u64>,
    pub max_content_chars: Option<usize>,
    pub headless: Option<bool>,
    pub chromedriver_url: Option<String>,
    pub geckodriver_url: Option<String>,
}

impl RetrievalSection {
    /// Overlay the configured values onto the shipped defaults.
    pub fn resolve(&self) -> RetrievalConfig {
        let base = RetrievalConfig::default();
        RetrievalConfig {
            pool_size: self.pool_size.unwrap_or(base.pool_size),
            page_timeout_ms: self.page_timeout_ms.unwrap_or(base.page_timeout_ms),
            search_timeout_ms: self.search_timeout_ms.unwrap_or(base.search_timeout_ms),
            max_content_chars: self.max_content_chars.unwrap_or(base.max_content_chars),
            headless: self.headless.unwrap_or(base.headless),
            chromedriver_url: self
                .chromedriver_url
                .clone()
                .unwrap_or(base.chromedriver_url),
            geckodriver_url: self.geckodriver_url.clone().unwrap_or(base.geckodriver_url),
        }
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct WebsiftConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for WebsiftConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl WebsiftConfigLoader {
    /// Start with sensible defaults: YAML file + `WEBSIFT_` env overrides.
    ///
    /// ```
    /// use websift_config::WebsiftConfigLoader;
    ///
    /// let config = WebsiftConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// version: "1"
    /// llm:
    ///   provider: "ollama"
    ///   model: "llama3.2:3b"
    /// "#,
    ///     )
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.retrieval.resolve().pool_size, 3);
    /// ```
    pub fn new() -> Self {
        let builder =
            Config::builder().add_source(Environment::with_prefix("WEBSIFT").separator("__"));
        Self { builder }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly
    /// typed config.
    ///
    /// The loader combines YAML snippets with `WEBSIFT_`-prefixed environment
    /// variables and expands `${VAR}` placeholders before materialising the
    /// typed structs.
    pub fn load(self) -> Result<WebsiftConfig, ConfigError> {
        let cfg = self.builder.build()?;

        // Convert to serde_json::Value first so placeholders inside nested
        // maps and arrays are reachable.
        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: WebsiftConfig =
            serde_json::from_value(v).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use temp_env;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars([("CITY", Some("Winston")), ("STATE", Some("NC"))], || {
            let mut v = json!([
                "hello-$CITY",
                { "loc": "${CITY}-${STATE}" },
                42,
                true,
                null
            ]);
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!(["hello-Winston", { "loc": "Winston-NC" }, 42, true, null])
            );
        });
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                // BAR references BAZ; FOO references BAR — two hops.
                ("BAZ", Some("qux")),
                ("BAR", Some("mid-${BAZ}")),
                ("FOO", Some("start-${BAR}-end")),
            ],
            || {
                let mut v = json!("X=${FOO}");
                expand_env_in_value(&mut v);
                assert_eq!(v, json!("X=start-mid-qux-end"));
            },
        );
    }

    #[test]
    fn stops_on_cycles_and_leaves_value_reasonable() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            // With the depth cap this terminates rather than looping forever.
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${DOES_NOT_EXIST}"));
    }

    #[test]
    fn retrieval_section_overlays_defaults() {
        let section = RetrievalSection {
            pool_size: Some(5),
            page_timeout_ms: None,
            search_timeout_ms: None,
            max_content_chars: Some(40_000),
            headless: Some(false),
            chromedriver_url: None,
            geckodriver_url: None,
        };
        let resolved = section.resolve();
        assert_eq!(resolved.pool_size, 5);
        assert_eq!(resolved.page_timeout_ms, 1000);
        assert_eq!(resolved.max_content_chars, 40_000);
        assert!(!resolved.headless);
    }
}
