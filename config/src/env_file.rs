//! Minimal `.env` reader: `KEY=VALUE` lines, `#` comments, optional quotes.
//! No multiline values or line continuations.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

fn env_file_path(project_dir: Option<&Path>) -> Option<PathBuf> {
    let dir = match project_dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().ok()?,
    };
    let path = dir.join(".env");
    path.is_file().then_some(path)
}

fn strip_quotes(value: &str) -> String {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            let inner = &value[1..value.len() - 1];
            return if quote == '"' {
                inner.replace("\\\"", "\"")
            } else {
                inner.to_string()
            };
        }
    }
    value.to_string()
}

fn parse(content: &str) -> HashMap<String, String> {
    let mut table = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        table.insert(key.to_string(), strip_quotes(value.trim()));
    }
    table
}

/// `.env` from the project dir (or cwd); missing file yields an empty table.
pub(crate) fn load(project_dir: Option<&Path>) -> std::io::Result<HashMap<String, String>> {
    match env_file_path(project_dir) {
        Some(path) => Ok(parse(&std::fs::read_to_string(path)?)),
        None => Ok(HashMap::new()),
    }
}
