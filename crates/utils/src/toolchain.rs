use std::path::PathBuf;

use crate::paths::{expand_path, looks_like_path};

/// Locate an executable by name, checking `PATH` first and then the usual install prefixes.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    if let Ok(path) = which::which(name) {
        return Some(path);
    }

    let home = std::env::var("HOME").unwrap_or_default();
    let candidates = [
        format!("{}/bin/{}", home, name),
        format!("{}/.local/bin/{}", home, name),
        format!("/usr/local/bin/{}", name),
        format!("/opt/homebrew/bin/{}", name),
    ];

    candidates
        .into_iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

/// Resolve a configured executable: explicit paths must exist, bare names go through the
/// `PATH` search.
pub fn resolve_executable(configured: &str) -> Option<PathBuf> {
    let configured = configured.trim();
    if configured.is_empty() {
        return None;
    }

    if looks_like_path(configured) {
        let path = expand_path(configured);
        return path.is_file().then_some(path);
    }

    find_executable(configured)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("fake-ffmpeg");
        std::fs::write(&tool, b"#!/bin/sh\n").unwrap();

        let resolved = resolve_executable(tool.to_str().unwrap());
        assert_eq!(resolved, Some(tool));
    }

    #[test]
    fn test_resolve_missing_path() {
        assert!(resolve_executable("/definitely/not/here/ffmpeg").is_none());
    }

    #[test]
    fn test_resolve_empty() {
        assert!(resolve_executable("   ").is_none());
    }

    #[test]
    fn test_find_unknown_program() {
        assert!(find_executable("studio-no-such-binary-4f1c").is_none());
    }
}
