//! Loader for workspace configuration with TOML + environment overlays.
//!
//! The expected file is `haulwatch.toml` next to the binary (any format the
//! `config` crate infers by suffix also works). `HAULWATCH__`-prefixed
//! environment variables override file values, and `${VAR}` placeholders
//! inside string values are expanded recursively before deserialisation.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Deserialize)]
pub struct HaulwatchConfig {
    #[serde(default)]
    pub logger: LoggerConfig,
    pub bot: BotConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub glossary: GlossaryConfig,
}

#[derive(Debug, Deserialize)]
pub struct LoggerConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BotConfig {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_true")]
    pub headless: bool,
    /// Extra chrome command-line switches, passed through verbatim.
    #[serde(default)]
    pub chrome_args: Vec<String>,
    #[serde(default = "default_cookies_path")]
    pub cookies_path: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_args: Vec::new(),
            cookies_path: default_cookies_path(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WatchConfig {
    /// Allow-list of URL patterns; only matching exchanges reach the
    /// interceptor.
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    /// Page-load budget per navigation; elapsing it is not an error.
    #[serde(default = "default_load_timeout")]
    pub load_timeout_secs: u64,
    /// Hold after the refresh nudge while the listing re-renders.
    #[serde(default = "default_settle")]
    pub settle_secs: u64,
    /// Hold between consecutive poll cycles.
    #[serde(default = "default_between_cycles")]
    pub between_cycles_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            scopes: default_scopes(),
            load_timeout_secs: default_load_timeout(),
            settle_secs: default_settle(),
            between_cycles_secs: default_between_cycles(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GlossaryConfig {
    #[serde(default = "default_glossary_base")]
    pub base_url: String,
}

impl Default for GlossaryConfig {
    fn default() -> Self {
        Self {
            base_url: default_glossary_base(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_cookies_path() -> String {
    "cookies.json".to_string()
}
fn default_scopes() -> Vec<String> {
    vec![
        ".*ati.su/webapi/public/v1.0/loads/search".to_string(),
        ".*ati.su/webapi/v1.0/loads/search".to_string(),
    ]
}
fn default_load_timeout() -> u64 {
    12
}
fn default_settle() -> u64 {
    2
}
fn default_between_cycles() -> u64 {
    10
}
fn default_glossary_base() -> String {
    "https://files.ati.su".to_string()
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

/// Builder hiding the `config` crate wiring (file + env overrides).
pub struct HaulwatchConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for HaulwatchConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl HaulwatchConfigLoader {
    /// Start with sensible defaults: config file + `HAULWATCH_` env overrides.
    pub fn new() -> Self {
        let builder =
            Config::builder().add_source(Environment::with_prefix("HAULWATCH").separator("__"));
        Self { builder }
    }

    /// Attach a TOML/YAML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Allow tests/CLI to merge inline TOML snippets.
    pub fn with_toml_str(mut self, toml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(toml, config::FileFormat::Toml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly
    /// typed config, expanding `${VAR}` placeholders on the way.
    pub fn load(self) -> Result<HaulwatchConfig, ConfigError> {
        let cfg = self.builder.build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: HaulwatchConfig =
            serde_json::from_value(v).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

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
        temp_env::with_vars([("CITY", Some("Kazan")), ("SUFFIX", Some("ru"))], || {
            let mut v = json!([
                "hello-$CITY",
                { "loc": "${CITY}.${SUFFIX}" },
                42,
                true,
                null
            ]);
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!(["hello-Kazan", { "loc": "Kazan.ru" }, 42, true, null])
            );
        });
    }

    #[test]
    fn stops_on_cycles_and_leaves_value_reasonable() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            // Only the depth cap matters here: the expansion must terminate.
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
    fn minimal_config_fills_defaults() {
        let cfg = HaulwatchConfigLoader::new()
            .with_toml_str(
                r#"
[bot]
token = "123:abc"
"#,
            )
            .load()
            .expect("valid config");

        assert_eq!(cfg.bot.token, "123:abc");
        assert_eq!(cfg.logger.level, "info");
        assert!(cfg.browser.headless);
        assert_eq!(cfg.watch.load_timeout_secs, 12);
        assert_eq!(cfg.watch.settle_secs, 2);
        assert_eq!(cfg.watch.between_cycles_secs, 10);
        assert_eq!(cfg.watch.scopes.len(), 2);
        assert!(cfg.watch.scopes[0].contains("loads/search"));
    }

    #[test]
    fn token_expands_from_environment() {
        temp_env::with_var("BOT_TOKEN", Some("999:zzz"), || {
            let cfg = HaulwatchConfigLoader::new()
                .with_toml_str(
                    r#"
[bot]
token = "${BOT_TOKEN}"

[watch]
between_cycles_secs = 30
"#,
                )
                .load()
                .expect("valid config");
            assert_eq!(cfg.bot.token, "999:zzz");
            assert_eq!(cfg.watch.between_cycles_secs, 30);
        });
    }
}
