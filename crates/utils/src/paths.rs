use std::path::PathBuf;

/// Expand `~` and `$VAR` references in a configured path. Unknown variables leave the
/// input untouched rather than failing.
pub fn expand_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    match shellexpand::full(trimmed) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(trimmed).as_ref()),
    }
}

/// True when the value names a location rather than a bare program name.
pub fn looks_like_path(raw: &str) -> bool {
    raw.contains('/') || raw.contains('\\') || raw.starts_with('~') || raw.starts_with('.')
}
