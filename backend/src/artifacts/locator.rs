use log::{debug, warn};
use regex::Regex;
use shared::ArtifactKind;
use std::path::{Path, PathBuf};

use super::OutputArtifact;

/// One naming convention an artifact may have been written under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidatePattern {
    /// A literal file name.
    Exact(String),
    /// A file name with `*` and `?` wildcards. A backslash makes the next character literal.
    Glob(String),
}

impl CandidatePattern {
    pub fn exact(name: impl Into<String>) -> Self {
        CandidatePattern::Exact(name.into())
    }

    pub fn glob(pattern: impl Into<String>) -> Self {
        CandidatePattern::Glob(pattern.into())
    }

    fn is_glob(&self) -> bool {
        matches!(self, CandidatePattern::Glob(_))
    }

    fn find_in(&self, dir: &Path) -> Option<PathBuf> {
        match self {
            CandidatePattern::Exact(name) => {
                let path = dir.join(name);
                path.is_file().then_some(path)
            }
            CandidatePattern::Glob(pattern) => {
                let matcher = glob_to_regex(pattern)?;
                let entries = std::fs::read_dir(dir).ok()?;
                let mut matches: Vec<PathBuf> = entries
                    .filter_map(|entry| {
                        let entry = entry.ok()?;
                        let path = entry.path();
                        if !path.is_file() {
                            return None;
                        }
                        let name = entry.file_name();
                        matcher.is_match(&name.to_string_lossy()).then_some(path)
                    })
                    .collect();
                matches.sort();
                matches.into_iter().next()
            }
        }
    }
}

/// Escapes wildcards and backslashes so `literal` only matches itself inside a glob.
pub fn escape_glob(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for c in literal.chars() {
        if matches!(c, '*' | '?' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn glob_to_regex(pattern: &str) -> Option<Regex> {
    let mut expr = String::with_capacity(pattern.len() + 8);
    expr.push('^');
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            '\\' => {
                if let Some(next) = chars.next() {
                    expr.push_str(&regex::escape(&next.to_string()));
                }
            }
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');
    match Regex::new(&expr) {
        Ok(regex) => Some(regex),
        Err(e) => {
            warn!("Ignoring unusable artifact pattern '{}': {}", pattern, e);
            None
        }
    }
}

/// Finds a side file written by a collaborator under one of its naming conventions.
///
/// Candidates are tried in the order given within the search directory, exact
/// names and globs alike. If nothing matches, the glob candidates are retried
/// in the parent directory. A glob matching several files yields the
/// lexicographically first one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLocator {
    kind: ArtifactKind,
    candidates: Vec<CandidatePattern>,
}

impl ArtifactLocator {
    pub fn new(kind: ArtifactKind, candidates: Vec<CandidatePattern>) -> Self {
        Self { kind, candidates }
    }

    #[cfg(test)]
    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    #[cfg(test)]
    pub fn candidates(&self) -> &[CandidatePattern] {
        &self.candidates
    }

    pub fn locate(&self, dir: &Path) -> Option<OutputArtifact> {
        let found = self
            .candidates
            .iter()
            .find_map(|candidate| candidate.find_in(dir))
            .or_else(|| {
                let parent = dir.parent()?;
                self.candidates
                    .iter()
                    .filter(|candidate| candidate.is_glob())
                    .find_map(|candidate| candidate.find_in(parent))
            });

        match &found {
            Some(path) => debug!("Located {} artifact at {}", self.kind, path.display()),
            None => debug!("No {} artifact found under {}", self.kind, dir.display()),
        }

        found.map(|path| OutputArtifact {
            path,
            kind: self.kind,
        })
    }

    /// Runs [`locate`](Self::locate) against each directory in turn.
    pub fn locate_any<P: AsRef<Path>>(&self, dirs: &[P]) -> Option<OutputArtifact> {
        dirs.iter().find_map(|dir| self.locate(dir.as_ref()))
    }
}
