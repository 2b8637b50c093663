//! Repository references parsed from GitHub URLs
//!
//! Format: `https://github.com/<owner>/<repo>[/...]`
//!
//! Trailing path segments, a query string, a fragment and a `.git` suffix
//! are tolerated and dropped.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const GITHUB_PREFIX: &str = "https://github.com/";

/// Owner/name pair identifying a GitHub repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse a repository URL into a RepoRef
    pub fn parse(url: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidRepositoryUrl(format!("{} ({})", url, reason));

        let rest = url.trim().strip_prefix(GITHUB_PREFIX)
            .ok_or_else(|| invalid("must start with https://github.com/"))?;

        // Drop query string and fragment
        let rest = rest.split(['?', '#']).next().unwrap_or_default();

        let mut segments = rest.split('/');
        let owner = segments.next()
            .filter(|s| is_valid_segment(s))
            .ok_or_else(|| invalid("missing owner"))?;
        let name = segments.next()
            .map(|s| s.strip_suffix(".git").unwrap_or(s))
            .filter(|s| is_valid_segment(s))
            .ok_or_else(|| invalid("missing repository name"))?;

        Ok(Self::new(owner, name))
    }

    /// `owner/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Canonical web URL
    pub fn html_url(&self) -> String {
        format!("{}{}/{}", GITHUB_PREFIX, self.owner, self.name)
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.chars().any(char::is_whitespace)
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name())
    }
}

impl FromStr for RepoRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_url() {
        let repo = RepoRef::parse("https://github.com/ssafy/potless").unwrap();
        assert_eq!(repo.owner, "ssafy");
        assert_eq!(repo.name, "potless");
        assert_eq!(repo.full_name(), "ssafy/potless");
        assert_eq!(repo.html_url(), "https://github.com/ssafy/potless");
    }

    #[test]
    fn test_parse_tolerates_suffixes() {
        for url in [
            "https://github.com/ssafy/potless/",
            "https://github.com/ssafy/potless.git",
            "https://github.com/ssafy/potless/tree/main/src",
            "https://github.com/ssafy/potless?tab=readme",
            "https://github.com/ssafy/potless#readme",
            "  https://github.com/ssafy/potless  ",
        ] {
            assert_eq!(RepoRef::parse(url).unwrap(), RepoRef::new("ssafy", "potless"), "{}", url);
        }
    }

    #[test]
    fn test_invalid_urls() {
        for url in [
            "",
            "github.com/ssafy/potless",
            "http://github.com/ssafy/potless",
            "https://gitlab.com/ssafy/potless",
            "https://github.com/",
            "https://github.com/ssafy",
            "https://github.com/ssafy/",
            "https://github.com//potless",
            "https://github.com/ssafy/.git",
            "https://github.com/ss afy/potless",
        ] {
            let err = RepoRef::parse(url).unwrap_err();
            assert!(matches!(err, Error::InvalidRepositoryUrl(_)), "{}", url);
        }
    }
}
