use std::collections::HashMap;
use std::fs;
use std::path::Path;

// Candidate variables in resolution order. Presence wins even when the
// value is empty.
const BRANCH_VARS: &[&str] = &["GIT_BRANCH", "BRANCH_NAME", "GIT_LOCAL_BRANCH"];
const COMMIT_VARS: &[&str] = &["GIT_COMMIT", "GIT_COMMIT_ID"];

/// The resolved environment of one build execution: the process
/// environment, optionally overlaid by a captured `KEY=VALUE` dump from
/// the host.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Self {
        Self { vars }
    }

    /// Overlays captured variables; the capture wins over existing entries.
    pub fn overlay(&mut self, vars: HashMap<String, String>) {
        self.vars.extend(vars);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn branch(&self) -> Option<&str> {
        self.first_of(BRANCH_VARS)
    }

    pub fn commit(&self) -> Option<&str> {
        self.first_of(COMMIT_VARS)
    }

    fn first_of(&self, candidates: &[&str]) -> Option<&str> {
        candidates.iter().find_map(|key| self.get(key))
    }
}

pub fn load(path: &Path) -> Result<HashMap<String, String>, std::io::Error> {
    let text = fs::read_to_string(path)?;
    parse(&text).map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))
}

/// Parses a captured environment dump: `KEY=VALUE` lines, `#` comments,
/// optional `export` prefixes, single- and double-quoted values.
pub fn parse(text: &str) -> Result<HashMap<String, String>, String> {
    let mut out = HashMap::new();

    for (index, raw) in text.lines().enumerate() {
        let mut line = raw.trim_end_matches('\r').trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(stripped) = line.strip_prefix("export ") {
            line = stripped.trim();
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err(format!("line {}: expected KEY=VALUE", index + 1));
        };

        let key = key.trim();
        if !is_valid_key(key) {
            return Err(format!("line {}: invalid key {key:?}", index + 1));
        }

        let value =
            parse_value(value.trim()).map_err(|err| format!("line {}: {err}", index + 1))?;

        out.insert(key.to_string(), value);
    }

    Ok(out)
}

fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

fn parse_value(value: &str) -> Result<String, String> {
    if value.is_empty() {
        return Ok(String::new());
    }

    if value.starts_with('"') {
        if !value.ends_with('"') || value.len() == 1 {
            return Err("unterminated double-quoted value".to_string());
        }

        return serde_json::from_str::<String>(value)
            .map_err(|_| "invalid double-quoted value".to_string());
    }

    if value.starts_with('\'') {
        if !value.ends_with('\'') || value.len() == 1 {
            return Err("unterminated single-quoted value".to_string());
        }
        return Ok(value[1..value.len() - 1].to_string());
    }

    let unquoted = match value.find(" #") {
        Some(cut) => value[..cut].trim_end(),
        None => value,
    };

    Ok(unquoted.to_string())
}
