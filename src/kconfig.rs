//! Structured editing of kernel-style build configuration files.
//!
//! A `.config` is an ordered list of `KEY=value` lines, `# KEY is not set`
//! markers, and everything else (comments, blanks). Instead of rewriting the
//! file with text substitution, the whole file is parsed into an ordered
//! container, mutated, and serialized back to the identical line format.
//!
//! Invariant: after any patch, each key appears on at most one line. `set`
//! and `clear` are idempotent.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// One line of a configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KconfigLine {
    /// `KEY=value`
    Set { key: String, value: String },
    /// `# KEY is not set`
    NotSet { key: String },
    /// Comment, blank line, or anything unrecognized. Kept verbatim.
    Other(String),
}

impl KconfigLine {
    /// The key this line refers to, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            KconfigLine::Set { key, .. } | KconfigLine::NotSet { key } => Some(key),
            KconfigLine::Other(_) => None,
        }
    }

    fn parse(raw: &str) -> Self {
        if let Some(rest) = raw.strip_prefix("# ") {
            if let Some(key) = rest.strip_suffix(" is not set") {
                if !key.is_empty() && !key.contains(char::is_whitespace) {
                    return KconfigLine::NotSet {
                        key: key.to_string(),
                    };
                }
            }
        }
        if !raw.starts_with('#') {
            if let Some((key, value)) = raw.split_once('=') {
                if !key.is_empty() && !key.contains(char::is_whitespace) {
                    return KconfigLine::Set {
                        key: key.to_string(),
                        value: value.to_string(),
                    };
                }
            }
        }
        KconfigLine::Other(raw.to_string())
    }

    fn render(&self) -> String {
        match self {
            KconfigLine::Set { key, value } => format!("{}={}", key, value),
            KconfigLine::NotSet { key } => format!("# {} is not set", key),
            KconfigLine::Other(raw) => raw.clone(),
        }
    }
}

/// An ordered, structured view of a configuration file.
///
/// The file remembers where it was loaded from, so patch operations always
/// act on the file they were asked about.
#[derive(Debug, Clone)]
pub struct KconfigFile {
    path: PathBuf,
    lines: Vec<KconfigLine>,
}

impl KconfigFile {
    /// Load and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        Ok(Self::parse(path, &content))
    }

    /// Parse configuration content associated with `path`.
    pub fn parse(path: &Path, content: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            lines: content.lines().map(KconfigLine::parse).collect(),
        }
    }

    /// The path this file was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Set `key` to `value`, replacing any existing line that references the
    /// key (in either form) at its original position, or appending otherwise.
    pub fn set(&mut self, key: &str, value: &str) {
        let new_line = KconfigLine::Set {
            key: key.to_string(),
            value: value.to_string(),
        };
        self.replace_or_append(key, new_line);
    }

    /// Enable `key` (`KEY=y`).
    pub fn enable(&mut self, key: &str) {
        self.set(key, "y");
    }

    /// Disable `key`, rewriting its line to the `# KEY is not set` form.
    pub fn clear(&mut self, key: &str) {
        let new_line = KconfigLine::NotSet {
            key: key.to_string(),
        };
        self.replace_or_append(key, new_line);
    }

    fn replace_or_append(&mut self, key: &str, new_line: KconfigLine) {
        let mut replaced = false;
        self.lines.retain_mut(|line| {
            if line.key() == Some(key) {
                if replaced {
                    // Duplicate lines for the key collapse into the first.
                    return false;
                }
                *line = new_line.clone();
                replaced = true;
            }
            true
        });
        if !replaced {
            self.lines.push(new_line);
        }
    }

    /// Look up the current value of a key, if it is set.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            KconfigLine::Set { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Serialize back to the line-oriented format. Trailing newline included.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&line.render());
            out.push('\n');
        }
        out
    }

    /// Write the file back to the path it was loaded from.
    pub fn save(&self) -> Result<()> {
        fs::write(&self.path, self.serialize())
            .with_context(|| format!("Failed to write config at {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> KconfigFile {
        KconfigFile::parse(
            Path::new("/tmp/.config"),
            "# Comment header\nCONFIG_A=y\n# CONFIG_B is not set\nCONFIG_C=\"str\"\n",
        )
    }

    #[test]
    fn test_round_trip_is_identical() {
        let content = "# Comment header\nCONFIG_A=y\n# CONFIG_B is not set\nCONFIG_C=\"str\"\n";
        let file = KconfigFile::parse(Path::new("/tmp/.config"), content);
        assert_eq!(file.serialize(), content);
    }

    #[test]
    fn test_set_twice_leaves_one_line() {
        let mut file = sample();
        file.enable("CONFIG_FOO");
        file.enable("CONFIG_FOO");
        let out = file.serialize();
        assert_eq!(out.matches("CONFIG_FOO").count(), 1);
        assert!(out.contains("CONFIG_FOO=y\n"));
    }

    #[test]
    fn test_set_replaces_not_set_in_place() {
        let mut file = sample();
        file.enable("CONFIG_B");
        let out = file.serialize();
        // Replaced at its original position, between CONFIG_A and CONFIG_C.
        let a = out.find("CONFIG_A=y").unwrap();
        let b = out.find("CONFIG_B=y").unwrap();
        let c = out.find("CONFIG_C=").unwrap();
        assert!(a < b && b < c);
        assert!(!out.contains("# CONFIG_B is not set"));
    }

    #[test]
    fn test_set_then_clear_leaves_one_disabled_line() {
        let mut file = sample();
        file.enable("CONFIG_FOO");
        file.clear("CONFIG_FOO");
        let out = file.serialize();
        assert_eq!(out.matches("CONFIG_FOO").count(), 1);
        assert!(out.contains("# CONFIG_FOO is not set\n"));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut file = sample();
        file.clear("CONFIG_A");
        let once = file.serialize();
        file.clear("CONFIG_A");
        assert_eq!(file.serialize(), once);
    }

    #[test]
    fn test_unrelated_lines_keep_order_and_content() {
        let mut file = sample();
        file.enable("CONFIG_NEW");
        let out = file.serialize();
        assert!(out.starts_with("# Comment header\nCONFIG_A=y\n# CONFIG_B is not set\n"));
        assert!(out.contains("CONFIG_C=\"str\"\n"));
        assert!(out.ends_with("CONFIG_NEW=y\n"));
    }

    #[test]
    fn test_duplicate_key_lines_collapse_on_patch() {
        let mut file = KconfigFile::parse(
            Path::new("/tmp/.config"),
            "CONFIG_X=m\nCONFIG_OTHER=y\nCONFIG_X=y\n",
        );
        file.set("CONFIG_X", "n");
        let out = file.serialize();
        assert_eq!(out.matches("CONFIG_X=").count(), 1);
        assert_eq!(file.get("CONFIG_X"), Some("n"));
    }

    #[test]
    fn test_get() {
        let file = sample();
        assert_eq!(file.get("CONFIG_A"), Some("y"));
        assert_eq!(file.get("CONFIG_B"), None);
        assert_eq!(file.get("CONFIG_C"), Some("\"str\""));
    }
}
