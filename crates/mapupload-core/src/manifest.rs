//! Mapcycle manifest handling
//!
//! The manifest is a plain text file with one map name per line, kept sorted
//! by a key derived from each line.

use crate::response::ManifestResponse;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// How a map name is matched against manifest lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// The name is a pattern anchored at the start of the line
    #[default]
    Pattern,
    /// The first whitespace-separated token of the line equals the name
    Exact,
}

/// Line matcher built once per operation
enum LineMatcher<'a> {
    Pattern(Regex),
    Exact(&'a str),
}

impl<'a> LineMatcher<'a> {
    fn new(name: &'a str, mode: MatchMode) -> Self {
        match mode {
            MatchMode::Exact => LineMatcher::Exact(name),
            MatchMode::Pattern => {
                let anchored = |p: &str| Regex::new(&format!("^(?:{})", p));
                // Names that are not valid patterns are matched literally
                let re = anchored(name).or_else(|_| anchored(&regex::escape(name)));
                match re {
                    Ok(re) => LineMatcher::Pattern(re),
                    Err(_) => LineMatcher::Exact(name),
                }
            }
        }
    }

    fn matches(&self, line: &str) -> bool {
        match self {
            LineMatcher::Pattern(re) => re.is_match(line),
            LineMatcher::Exact(name) => line.split_whitespace().next() == Some(*name),
        }
    }
}

/// Sort key of a manifest line
///
/// The lower-cased line, narrowed to capture group 1 of the first match of
/// `pattern` (or the whole match when the pattern has no group). Lines the
/// pattern does not match sort by their full lower-cased text.
pub fn sort_key(line: &str, pattern: &Regex) -> String {
    let lowered = line.to_lowercase();
    match pattern.captures(&lowered) {
        Some(caps) => caps
            .get(1)
            .or_else(|| caps.get(0))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| lowered.clone()),
        None => lowered,
    }
}

/// File-backed mapcycle manifest
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
    match_mode: MatchMode,
}

impl ManifestStore {
    pub fn new<P: AsRef<Path>>(path: P, match_mode: MatchMode) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            match_mode,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all lines, `None` when the file is missing or unreadable
    pub fn read(&self) -> Option<Vec<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Some(content.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Manifest {:?} does not exist", self.path);
                None
            }
            Err(e) => {
                error!("Failed to read manifest {:?}: {}", self.path, e);
                None
            }
        }
    }

    /// Overwrite the manifest with `entries`, one per line
    pub fn save(&self, entries: &[String]) -> bool {
        let mut content = entries.join("\n");
        content.push('\n');

        match fs::write(&self.path, content) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to write manifest {:?}: {}", self.path, e);
                false
            }
        }
    }

    /// Whether any line matches `name`
    pub fn contains(&self, lines: &[String], name: &str) -> bool {
        let matcher = LineMatcher::new(name, self.match_mode);
        lines.iter().any(|line| matcher.matches(line))
    }

    /// Add `name` and keep the manifest sorted
    pub fn insert(&self, name: &str, sort_pattern: &Regex) -> ManifestResponse {
        let mut response = ManifestResponse::default();

        let Some(mut lines) = self.read() else {
            response.errors.push("Manifest file does not exist.".to_string());
            return response;
        };

        if self.contains(&lines, name) {
            info!("Map {} already listed in {:?}", name, self.path);
            response.success = true;
            response
                .errors
                .push(format!("Map {} already exists in manifest.", name));
            return response;
        }

        lines.push(name.to_string());
        lines.sort_by_cached_key(|line| sort_key(line, sort_pattern));

        if self.save(&lines) {
            info!("Added {} to manifest {:?}", name, self.path);
            response.success = true;
            response.wrote_to_file = true;
        } else {
            response.errors.push("Failed to write manifest.".to_string());
        }

        response
    }

    /// Remove the first line matching `name`, returns whether it was written
    pub fn remove(&self, name: &str) -> bool {
        let Some(mut lines) = self.read() else {
            return false;
        };

        let matcher = LineMatcher::new(name, self.match_mode);
        let Some(index) = lines.iter().position(|line| matcher.matches(line)) else {
            debug!("Map {} not found in manifest", name);
            return false;
        };

        lines.remove(index);
        let saved = self.save(&lines);
        if saved {
            info!("Removed {} from manifest {:?}", name, self.path);
        }
        saved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn default_pattern() -> Regex {
        Regex::new(r"(\w+)").unwrap()
    }

    fn store_with(content: Option<&str>, mode: MatchMode) -> (TempDir, ManifestStore) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("mapcycle.txt");
        if let Some(content) = content {
            fs::write(&path, content).unwrap();
        }
        (temp_dir, ManifestStore::new(path, mode))
    }

    #[test]
    fn test_sort_key() {
        let re = default_pattern();
        assert_eq!(sort_key("De_Dust2", &re), "de_dust2");
        assert_eq!(sort_key("  cs_office // note", &re), "cs_office");
        assert_eq!(sort_key("---", &re), "---");

        let no_group = Regex::new(r"[a-z]+").unwrap();
        assert_eq!(sort_key("Abc_def", &no_group), "abc");
    }

    #[test]
    fn test_read_missing_and_empty() {
        let (_dir, store) = store_with(None, MatchMode::Pattern);
        assert_eq!(store.read(), None);

        let (_dir, store) = store_with(Some(""), MatchMode::Pattern);
        assert_eq!(store.read(), Some(vec![]));
    }

    #[test]
    fn test_insert_sorts() {
        let (_dir, store) = store_with(Some("A\nC\n"), MatchMode::Pattern);

        let response = store.insert("X", &default_pattern());
        assert!(response.success);
        assert!(response.wrote_to_file);
        assert!(response.errors.is_empty());

        let response = store.insert("b", &default_pattern());
        assert!(response.wrote_to_file);
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "A\nb\nC\nX\n");
    }

    #[test]
    fn test_insert_duplicate_leaves_file_untouched() {
        let content = "zeta\nalpha\n";
        let (_dir, store) = store_with(Some(content), MatchMode::Pattern);

        let response = store.insert("alpha", &default_pattern());
        assert!(response.success);
        assert!(!response.wrote_to_file);
        assert_eq!(
            response.errors,
            vec!["Map alpha already exists in manifest.".to_string()]
        );
        assert_eq!(fs::read_to_string(store.path()).unwrap(), content);
    }

    #[test]
    fn test_insert_missing_manifest() {
        let (_dir, store) = store_with(None, MatchMode::Pattern);
        let response = store.insert("test", &default_pattern());
        assert!(!response.success);
        assert!(!response.wrote_to_file);
        assert_eq!(response.errors, vec!["Manifest file does not exist.".to_string()]);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_pattern_match_is_prefix() {
        let (_dir, store) = store_with(Some("de_dust2\n"), MatchMode::Pattern);
        let lines = store.read().unwrap();
        assert!(store.contains(&lines, "de_dust"));
        assert!(!store.contains(&lines, "dust2"));
    }

    #[test]
    fn test_exact_match() {
        let (_dir, store) = store_with(Some("de_dust2\ncs_office extra\n"), MatchMode::Exact);
        let lines = store.read().unwrap();
        assert!(!store.contains(&lines, "de_dust"));
        assert!(store.contains(&lines, "de_dust2"));
        assert!(store.contains(&lines, "cs_office"));
    }

    #[test]
    fn test_invalid_pattern_name_is_literal() {
        let (_dir, store) = store_with(Some("surf(1\n"), MatchMode::Pattern);
        let lines = store.read().unwrap();
        assert!(store.contains(&lines, "surf(1"));
        assert!(!store.contains(&lines, "surf(2"));
    }

    #[test]
    fn test_remove_first_match_only() {
        let (_dir, store) = store_with(Some("a\nb\nb\nc\n"), MatchMode::Exact);
        assert!(store.remove("b"));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "a\nb\nc\n");
    }

    #[test]
    fn test_remove_absent() {
        let content = "a\nc\n";
        let (_dir, store) = store_with(Some(content), MatchMode::Pattern);
        assert!(!store.remove("b"));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), content);

        let (_dir, store) = store_with(None, MatchMode::Pattern);
        assert!(!store.remove("b"));
    }

    #[test]
    fn test_save_appends_trailing_newline() {
        let (_dir, store) = store_with(None, MatchMode::Pattern);
        assert!(store.save(&["one".to_string(), "two".to_string()]));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "one\ntwo\n");
    }
}
