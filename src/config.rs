use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use serde::Deserialize;

use crate::alphabet::{default_rules, AlphabetTable, PlateCharacterRule};

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_NAME: &str = "platemap";

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// File the configuration was read from; `None` when running on defaults.
    pub config_path: Option<PathBuf>,
    pub alphabet: AlphabetConfig,
    /// Request list used by `search` when no `--requests` is given.
    pub requests: Option<PathBuf>,
}

// =============================================================================
// Alphabet Configuration
// =============================================================================

/// What to do when two alphabet rules claim the same letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Keep the later rule and log a warning.
    #[default]
    LastWins,
    /// Refuse to load the configuration.
    Reject,
}

impl DuplicatePolicy {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last_wins" | "last-wins" => Some(DuplicatePolicy::LastWins),
            "reject" => Some(DuplicatePolicy::Reject),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicatePolicy::LastWins => "last_wins",
            DuplicatePolicy::Reject => "reject",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AlphabetConfig {
    pub on_duplicate: DuplicatePolicy,
    pub rules: Vec<PlateCharacterRule>,
}

impl Default for AlphabetConfig {
    fn default() -> Self {
        Self {
            on_duplicate: DuplicatePolicy::default(),
            rules: default_rules(),
        }
    }
}

impl AlphabetConfig {
    /// Build the lookup table, applying the duplicate policy. Anomalies and
    /// tolerated duplicates are logged.
    pub fn build_table(&self) -> Result<AlphabetTable> {
        let table = match self.on_duplicate {
            DuplicatePolicy::Reject => AlphabetTable::build_strict(self.rules.clone())
                .context("alphabet rejected (alphabet.on_duplicate = \"reject\")")?,
            DuplicatePolicy::LastWins => {
                let table = AlphabetTable::build(self.rules.clone());
                for dup in table.duplicates() {
                    tracing::warn!(
                        side = %dup.side,
                        key = %dup.key,
                        "alphabet rules #{} and #{} collide; rule #{} wins",
                        dup.first,
                        dup.second,
                        dup.second
                    );
                }
                table
            }
        };

        for anomaly in table.anomalies() {
            tracing::warn!("alphabet {}", anomaly);
        }
        if table.is_empty() {
            tracing::warn!("alphabet has no rules; plate letters will all be dropped");
        }

        Ok(table)
    }
}

// =============================================================================
// Loading
// =============================================================================

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    alphabet: AlphabetFile,
    requests: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct AlphabetFile {
    on_duplicate: Option<String>,
    rules: Option<Vec<PlateCharacterRule>>,
}

impl AlphabetFile {
    fn into_config(self) -> Result<AlphabetConfig> {
        let on_duplicate = match self.on_duplicate {
            Some(raw) => match DuplicatePolicy::from_str(&raw) {
                Some(policy) => policy,
                None => bail!(
                    "invalid alphabet.on_duplicate `{}` (expected \"last_wins\" or \"reject\")",
                    raw
                ),
            },
            None => DuplicatePolicy::default(),
        };

        let rules = match self.rules {
            Some(rules) => rules,
            None => {
                tracing::debug!("no alphabet.rules configured, using the default plate alphabet");
                default_rules()
            }
        };

        Ok(AlphabetConfig {
            on_duplicate,
            rules,
        })
    }
}

fn config_root() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine base directories")?;
    let dir = base.config_dir().join(APP_NAME);
    Ok(dir)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_root()?.join(CONFIG_FILE_NAME))
}

/// Load configuration from `explicit`, or from the default location.
///
/// A missing file at the default location means "use defaults"; a missing
/// file that was asked for explicitly is an error.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => {
            let path = expand_tilde(path);
            if !path.exists() {
                bail!("configuration file not found at {}", path.display());
            }
            path
        }
        None => {
            let path = config_path()?;
            if !path.exists() {
                tracing::debug!(
                    "no configuration at {}, using defaults",
                    path.display()
                );
                return Ok(Config::default());
            }
            path
        }
    };

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration file at {}", path.display()))?;

    parse(&raw, Some(path))
}

/// Parse configuration text. `path` is only recorded, never read.
pub fn parse(raw: &str, path: Option<PathBuf>) -> Result<Config> {
    let origin = path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<inline>".to_string());

    let value: toml::Value =
        toml::from_str(raw).with_context(|| format!("failed to parse {} as TOML", origin))?;

    warn_unknown_keys(&value);

    let cfg_file: ConfigFile = value
        .try_into()
        .with_context(|| format!("failed to deserialize config from {}", origin))?;

    let alphabet = cfg_file
        .alphabet
        .into_config()
        .with_context(|| "failed to parse alphabet configuration")?;

    let requests = cfg_file
        .requests
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| expand_tilde(&p));

    Ok(Config {
        config_path: path,
        alphabet,
        requests,
    })
}

/// Expand ~ to home directory in paths
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = home::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

// =============================================================================
// Default file
// =============================================================================

/// Text written by `platemap init`.
pub fn default_config_toml() -> String {
    let mut out = String::new();
    out.push_str("# platemap configuration\n\n");
    out.push_str("# Request list searched by `platemap search` (JSON array).\n");
    out.push_str("# requests = \"~/requests.json\"\n\n");
    out.push_str("[alphabet]\n");
    out.push_str("# \"last_wins\" keeps the later of two colliding rules, \"reject\" refuses them.\n");
    out.push_str(&format!(
        "on_duplicate = \"{}\"\n",
        DuplicatePolicy::default().as_str()
    ));
    for rule in default_rules() {
        out.push_str("\n[[alphabet.rules]]\n");
        out.push_str(&format!("arabic = \"{}\"\n", rule.arabic));
        out.push_str(&format!("latin = \"{}\"\n", rule.latin));
    }
    out
}

/// Write the default configuration to `path`, creating parent directories.
pub fn write_default(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "configuration already exists at {} (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create config dir: {}", parent.display()))?;
        }
    }
    fs::write(path, default_config_toml())
        .with_context(|| format!("failed to write configuration to {}", path.display()))?;
    Ok(())
}

// =============================================================================
// Unknown key warnings
// =============================================================================

fn warn_unknown_keys(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };

    let known = HashSet::from(["alphabet", "requests"]);

    for key in table.keys() {
        if !known.contains(key.as_str()) {
            tracing::warn!("unknown configuration key `{}`", key);
        }
    }

    if let Some(alphabet_val) = table.get("alphabet") {
        warn_unknown_alphabet_keys(alphabet_val);
    }
}

fn warn_unknown_alphabet_keys(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };

    let known = HashSet::from(["on_duplicate", "rules"]);
    for key in table.keys() {
        if !known.contains(key.as_str()) {
            tracing::warn!("unknown alphabet entry `{}`", key);
        }
    }

    let Some(rules) = table.get("rules").and_then(|v| v.as_array()) else {
        return;
    };
    let known_rule = HashSet::from(["arabic", "latin", "arabicChar", "latinChar"]);
    for (index, rule) in rules.iter().enumerate() {
        let Some(rule) = rule.as_table() else {
            continue;
        };
        for key in rule.keys() {
            if !known_rule.contains(key.as_str()) {
                tracing::warn!("unknown entry `{}` in alphabet rule #{}", key, index);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse("", None).unwrap();
        assert_eq!(config.alphabet.on_duplicate, DuplicatePolicy::LastWins);
        assert_eq!(config.alphabet.rules, default_rules());
        assert_eq!(config.requests, None);
    }

    #[test]
    fn test_parse_rules_and_policy() {
        let raw = r#"
requests = "/srv/requests.json"

[alphabet]
on_duplicate = "Reject"

[[alphabet.rules]]
arabic = "ط"
latin = "X"

[[alphabet.rules]]
arabicChar = "هـ"
latinChar = "h"
"#;
        let config = parse(raw, None).unwrap();
        assert_eq!(config.alphabet.on_duplicate, DuplicatePolicy::Reject);
        assert_eq!(
            config.alphabet.rules,
            vec![
                PlateCharacterRule::new("ط", "X"),
                PlateCharacterRule::new("هـ", "h"),
            ]
        );
        assert_eq!(config.requests, Some(PathBuf::from("/srv/requests.json")));
    }

    #[test]
    fn test_explicit_empty_rules_stay_empty() {
        let config = parse("[alphabet]\nrules = []\n", None).unwrap();
        assert!(config.alphabet.rules.is_empty());
        assert!(config.alphabet.build_table().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_policy_is_an_error() {
        let err = parse("[alphabet]\non_duplicate = \"first_wins\"\n", None).unwrap_err();
        assert!(format!("{:#}", err).contains("first_wins"));
    }

    #[test]
    fn test_duplicate_policy() {
        let rules = vec![
            PlateCharacterRule::new("ط", "T"),
            PlateCharacterRule::new("ص", "T"),
        ];
        let lenient = AlphabetConfig {
            on_duplicate: DuplicatePolicy::LastWins,
            rules: rules.clone(),
        };
        let table = lenient.build_table().unwrap();
        assert_eq!(table.arabic_for('t'), Some("ص"));

        let strict = AlphabetConfig {
            on_duplicate: DuplicatePolicy::Reject,
            rules,
        };
        assert!(strict.build_table().is_err());
    }

    #[test]
    fn test_default_config_round_trips() {
        let config = parse(&default_config_toml(), None).unwrap();
        assert_eq!(config.alphabet.rules, default_rules());
        assert_eq!(config.alphabet.on_duplicate, DuplicatePolicy::LastWins);
    }

    #[test]
    fn test_write_default_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        write_default(&path, false).unwrap();
        assert!(path.exists());
        assert!(write_default(&path, false).is_err());
        write_default(&path, true).unwrap();
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        assert!(load(Some(path.as_path())).is_err());
    }

    #[test]
    fn test_expand_tilde_leaves_absolute_paths() {
        assert_eq!(
            expand_tilde(Path::new("/etc/platemap.toml")),
            PathBuf::from("/etc/platemap.toml")
        );
    }
}
