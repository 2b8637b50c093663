//! README text mining
//!
//! Best-effort heuristics over Markdown prose. Nothing here is guaranteed to
//! be correct; everything here is guaranteed not to panic.
//!
//! Three things are extracted:
//! - tech-stack mentions from a "tech stack" style section
//! - a feature list from the numbered subsections of a "주요기능" heading
//! - challenges from a "기획배경" heading or a "문제:" / "도전 과제:" label

use crate::{Error, Result};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;

/// Solution text paired with every extracted challenge
pub const CANNED_SOLUTION: &str =
    "해결 방안: AI 기술과 데이터 분석을 활용한 자동화된 포트홀 관리 시스템 구축";

const TECH_STACK_LABELS: &str = r"(?i)(tech stack|기술 스택|사용 기술|technologies)";

const TECH_TOKENS: &str = r"(?i)`([^`]+)`|\*\*([^*]+)\*\*|#[ \t]*([^\n]+)|\b(react|vue|angular|node|python|java|spring|django|flask|mysql|postgresql|mongodb)\b";

const NUMBERED_SUBSECTION: &str = r"^\s*###\s*(\d+)\.\s*(.+?)\s*$";

const BULLET: &str = r"^\s*[-*+]\s+(.+?)\s*$";

const FEATURE_HEADING: &str = "주요기능";

const BACKGROUND_HEADING: &str = "기획배경";

const CHALLENGE_LABELS: &[&str] = &["문제", "도전 과제"];

/// A challenge and the solution paired with it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Challenge {
    pub challenge: String,
    pub solution: String,
}

impl Challenge {
    fn canned(challenge: impl Into<String>) -> Self {
        Self {
            challenge: challenge.into(),
            solution: CANNED_SOLUTION.to_string(),
        }
    }
}

/// Everything mined from one README
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadmeInsights {
    pub tech_stack: BTreeSet<String>,
    pub features: Vec<String>,
    pub challenges: Vec<Challenge>,
}

impl ReadmeInsights {
    pub fn is_empty(&self) -> bool {
        self.tech_stack.is_empty() && self.features.is_empty() && self.challenges.is_empty()
    }
}

/// Compiled patterns for README mining
pub struct ReadmeScanner {
    tech_labels: Regex,
    tech_tokens: Regex,
    numbered_subsection: Regex,
    bullet: Regex,
}

impl ReadmeScanner {
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| Error::ReadmeParseFailure(e.to_string()))
        };

        Ok(Self {
            tech_labels: compile(TECH_STACK_LABELS)?,
            tech_tokens: compile(TECH_TOKENS)?,
            numbered_subsection: compile(NUMBERED_SUBSECTION)?,
            bullet: compile(BULLET)?,
        })
    }

    /// Run every extraction over `readme`
    pub fn scan(&self, readme: &str) -> ReadmeInsights {
        ReadmeInsights {
            tech_stack: self.tech_stack(readme),
            features: self.features(readme),
            challenges: self.challenges(readme),
        }
    }

    /// Tech-stack tokens from the first tech-stack section.
    ///
    /// The section starts at the earliest label that sits on a heading line
    /// or is followed by a colon, and runs to the next `##` marker. Tokens are
    /// lower-cased, so mentions differing only in case collapse.
    pub fn tech_stack(&self, readme: &str) -> BTreeSet<String> {
        let mut stack = BTreeSet::new();

        let Some(start) = self.tech_stack_start(readme) else {
            return stack;
        };

        let rest = &readme[start..];
        let body = match rest.find("##") {
            Some(end) => &rest[..end],
            None => rest,
        };

        for caps in self.tech_tokens.captures_iter(body) {
            let token = caps.iter().skip(1).flatten().next().map(|m| m.as_str().trim());
            if let Some(token) = token.filter(|t| !t.is_empty()) {
                stack.insert(token.to_lowercase());
            }
        }

        stack
    }

    /// Byte offset where the tech-stack body begins, after the label and any
    /// colon/whitespace.
    fn tech_stack_start(&self, readme: &str) -> Option<usize> {
        self.tech_labels.find_iter(readme).find_map(|label| {
            let line_start = readme[..label.start()].rfind('\n').map_or(0, |i| i + 1);
            let is_heading = readme[line_start..label.start()].trim_start().starts_with('#');

            let after = &readme[label.end()..];
            let skipped = after.len() - after.trim_start_matches(|c: char| c == ':' || c.is_whitespace()).len();
            let has_colon = after.trim_start_matches([' ', '\t']).starts_with(':');

            (is_heading || has_colon).then_some(label.end() + skipped)
        })
    }

    /// Features from the numbered `### <n>. <title>` subsections under the
    /// first heading containing "주요기능".
    pub fn features(&self, readme: &str) -> Vec<String> {
        let lines: Vec<&str> = readme.lines().collect();

        let Some((idx, level)) = find_heading(&lines, |line| line.to_lowercase().contains(FEATURE_HEADING)) else {
            return Vec::new();
        };

        // Numbered subsections may share the heading's level; they stay in the body
        let body = section_body(&lines, idx, level, |line| self.numbered_subsection.is_match(line));

        let mut features = Vec::new();
        let mut current: Option<(String, Vec<String>)> = None;

        for line in body {
            if let Some(caps) = self.numbered_subsection.captures(line) {
                if let Some(done) = current.take() {
                    features.push(format_feature(done));
                }
                current = Some((caps[2].to_string(), Vec::new()));
            } else if heading_level(line).is_some() {
                if let Some(done) = current.take() {
                    features.push(format_feature(done));
                }
            } else if let Some((_, details)) = current.as_mut() {
                if let Some(caps) = self.bullet.captures(line) {
                    details.push(caps[1].to_string());
                }
            }
        }
        if let Some(done) = current.take() {
            features.push(format_feature(done));
        }

        features
    }

    /// Challenges from the first matching pattern, in order: a "기획배경"
    /// heading, a line starting with "문제:", a line starting with "도전 과제:".
    ///
    /// Only the first pattern that matches is used, even if it yields nothing.
    pub fn challenges(&self, readme: &str) -> Vec<Challenge> {
        let lines: Vec<&str> = readme.lines().collect();

        let body = if let Some((idx, level)) = find_heading(&lines, |line| line.contains(BACKGROUND_HEADING)) {
            section_body(&lines, idx, level, |_| false).join("\n")
        } else if let Some(body) = CHALLENGE_LABELS.iter().find_map(|label| labelled_body(&lines, label)) {
            body
        } else {
            return Vec::new();
        };

        let bullets: Vec<&str> = body
            .lines()
            .filter_map(|line| self.bullet.captures(line))
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect();

        if bullets.is_empty() {
            vec![Challenge::canned(body.trim())]
        } else {
            bullets.into_iter().map(Challenge::canned).collect()
        }
    }
}

fn format_feature((title, details): (String, Vec<String>)) -> String {
    if details.is_empty() {
        title
    } else {
        format!("{}: {}", title, details.join(", "))
    }
}

/// Heading level (number of leading `#`) of a Markdown heading line
fn heading_level(line: &str) -> Option<usize> {
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    (level > 0).then_some(level)
}

/// First heading line matching `pred`, with its level
fn find_heading(lines: &[&str], pred: impl Fn(&str) -> bool) -> Option<(usize, usize)> {
    lines.iter().enumerate().find_map(|(idx, line)| {
        heading_level(line)
            .filter(|_| pred(line))
            .map(|level| (idx, level))
    })
}

/// Lines after the heading at `idx`, up to the next heading of the same or a
/// higher level. Headings for which `keep` returns true do not end the body.
fn section_body<'a>(
    lines: &[&'a str],
    idx: usize,
    level: usize,
    keep: impl Fn(&str) -> bool,
) -> Vec<&'a str> {
    lines[idx + 1..]
        .iter()
        .take_while(|line| match heading_level(line) {
            Some(l) => l > level || keep(line),
            None => true,
        })
        .copied()
        .collect()
}

/// Body of a `<label>:` line: the rest of that line plus the following lines
/// up to the next heading.
fn labelled_body(lines: &[&str], label: &str) -> Option<String> {
    lines.iter().enumerate().find_map(|(idx, line)| {
        let rest = line.trim_start().strip_prefix(label)?;
        let rest = rest.trim_start().strip_prefix(':')?;

        let mut body = vec![rest];
        body.extend(
            lines[idx + 1..]
                .iter()
                .take_while(|l| heading_level(l).is_none())
                .copied(),
        );
        Some(body.join("\n"))
    })
}
