//! Login banner stripping for remote command output
//!
//! Interactive SSH sessions on the monitored hosts prepend legal/MOTD
//! banners to every command's output. The filter removes those lines so
//! raw artifacts and parsers only see the useful text. The pattern set is
//! part of the parser's acceptance grammar: the built-in set matches the
//! fleet's current wording, and per-check extra patterns can be layered on
//! when the wording drifts.

use regex::RegexSet;

use crate::error::{RegistryError, RegistryResult};

/// Banner line patterns known to appear on the monitored fleet
///
/// Matched case-insensitively against the trimmed line.
pub const DEFAULT_BANNER_PATTERNS: &[&str] = &[
    r"^#{10,}.*$",
    r"^WARNING\s*!.*$",
    r"^You are about to access.*$",
    r"^This system is for.*$",
    r"^authorized users only.*$",
    r"^All connections, actions.*$",
    r"^be logged and monitored.*$",
    r"^By accessing and using.*$",
    r"^Users should have no expectation.*$",
    r"^Last login:.*$",
];

/// Strips known banner lines from remote output, preserving everything else
#[derive(Debug, Clone)]
pub struct BannerFilter {
    set: RegexSet,
}

impl Default for BannerFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl BannerFilter {
    /// Builds a filter with the built-in pattern set
    ///
    /// # Panics
    ///
    /// Never panics: the built-in patterns are valid by construction
    /// (covered by tests).
    #[must_use]
    pub fn new() -> Self {
        Self::with_extra_patterns(&[]).unwrap_or_else(|_| unreachable!("built-in patterns are valid"))
    }

    /// Builds a filter with the built-in set plus check-specific patterns
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::BannerPattern`] when an extra pattern does
    /// not compile.
    pub fn with_extra_patterns(extra: &[String]) -> RegistryResult<Self> {
        let patterns = DEFAULT_BANNER_PATTERNS
            .iter()
            .map(|p| (*p).to_string())
            .chain(extra.iter().cloned())
            .map(|p| format!("(?i){p}"));
        let set = RegexSet::new(patterns).map_err(|source| RegistryError::BannerPattern { source })?;
        Ok(Self { set })
    }

    /// Removes banner lines, keeping interior blank lines and trimming
    /// leading blank lines
    ///
    /// Idempotent: filtering already-filtered text yields identical text.
    #[must_use]
    pub fn filter(&self, text: &str) -> String {
        let mut kept: Vec<&str> = Vec::new();
        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                kept.push("");
                continue;
            }
            if self.set.is_match(trimmed) {
                continue;
            }
            kept.push(line);
        }
        let joined = kept.join("\n");
        joined.trim_start_matches('\n').to_string()
    }
}
