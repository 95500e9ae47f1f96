use serde::{Deserialize, Serialize};

/// Rewrites local paths under a synced folder into their remote URLs.
///
/// Pure string rewriting: the resulting URL is never checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlMapper {
    pub local_base: String,
    pub remote_base: String,
}

impl UrlMapper {
    pub fn new(local_base: impl Into<String>, remote_base: impl Into<String>) -> Self {
        Self {
            local_base: local_base.into(),
            remote_base: remote_base.into(),
        }
    }

    /// Maps `local_path` to a remote URL if it lies under `local_base`,
    /// otherwise returns it unchanged.
    ///
    /// `\` and `/` are treated alike on both sides, so Windows paths map the
    /// same way on every platform.
    pub fn map(&self, local_path: &str) -> String {
        let path = normalize(local_path);
        let base = normalize(&self.local_base);

        let Some(rest) = path.strip_prefix(base.as_str()) else {
            return local_path.to_string();
        };
        let on_boundary = rest.is_empty() || rest.starts_with('/') || base.ends_with('/');
        if !on_boundary {
            return local_path.to_string();
        }

        format!(
            "{}/{}",
            self.remote_base.trim_end_matches('/'),
            rest.trim_start_matches('/')
        )
    }
}

/// Forward slashes only, no repeated or trailing separators.
fn normalize(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len());
    for ch in path.chars() {
        let ch = if ch == '\\' { '/' } else { ch };
        if ch == '/' && normalized.ends_with('/') {
            continue;
        }
        normalized.push(ch);
    }
    if normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}
