//! Project template - the default document new projects start from
//!
//! The template is a JSON object keyed by section (`basicInfo`,
//! `technicalInfo`, ...). A wrapping `projectInfo` object is accepted too.
//! Sections missing from the template start empty.

use std::path::Path;
use serde_json::Value;

use crate::codec::{self, Fragment};
use crate::github::Extraction;
use crate::section::SectionKind;
use crate::{Error, Result};

/// Template shipped with the binary, used when no path is configured
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/project_info_template.json");

/// A loaded project template
#[derive(Debug, Clone)]
pub struct ProjectTemplate {
    sections: Fragment,
}

impl ProjectTemplate {
    /// Load from `path`, or the built-in template if `path` is `None`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)?;
                Self::parse(&contents)
                    .map_err(|e| Error::Template(format!("{}: {}", path.display(), e)))
            }
            None => Self::builtin(),
        }
    }

    /// The built-in template
    pub fn builtin() -> Result<Self> {
        Self::parse(DEFAULT_TEMPLATE)
    }

    /// Parse a template document
    pub fn parse(contents: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(contents)
            .map_err(|e| Error::Template(format!("invalid JSON: {}", e)))?;

        let Value::Object(mut root) = value else {
            return Err(Error::Template("template must be a JSON object".to_string()));
        };

        let sections = match root.remove("projectInfo") {
            Some(Value::Object(inner)) => inner,
            Some(_) => return Err(Error::Template("projectInfo must be an object".to_string())),
            None => root,
        };

        for (key, value) in &sections {
            if !value.is_object() {
                return Err(Error::Template(format!("section {} must be an object", key)));
            }
            if key.parse::<SectionKind>().is_err() {
                tracing::warn!("Template key {} is not a known section, ignoring", key);
            }
        }

        Ok(Self { sections })
    }

    /// Fragment for `kind`, empty if the template does not define it
    pub fn section(&self, kind: SectionKind) -> Fragment {
        match self.sections.get(kind.as_str()) {
            Some(Value::Object(fragment)) => fragment.clone(),
            _ => codec::empty_fragment(kind),
        }
    }

    /// Replace a whole section
    pub fn set_section(&mut self, kind: SectionKind, fragment: Fragment) {
        self.sections.insert(kind.as_str().to_string(), Value::Object(fragment));
    }

    /// Shallow-merge `fragment` into a section: its keys overwrite, other
    /// keys keep their template values.
    pub fn merge_section(&mut self, kind: SectionKind, fragment: Fragment) {
        let mut merged = self.section(kind);
        merged.extend(fragment);
        self.set_section(kind, merged);
    }

    /// Apply a GitHub extraction: `githubInfo` is overwritten,
    /// `technicalInfo` is merged.
    pub fn apply_extraction(&mut self, extraction: &Extraction) {
        self.set_section(SectionKind::GithubInfo, extraction.github_info.clone());
        self.merge_section(SectionKind::TechnicalInfo, extraction.technical_info.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtin_template_covers_every_section() {
        let template = ProjectTemplate::builtin().unwrap();
        for kind in SectionKind::all() {
            let fragment = template.section(*kind);
            assert_eq!(fragment, codec::empty_fragment(*kind), "{}", kind);
        }
    }

    #[test]
    fn test_wrapped_template() {
        let template = ProjectTemplate::parse(
            r#"{"projectInfo": {"basicInfo": {"projectName": "Seed"}}, "timestamp": {}}"#,
        )
        .unwrap();
        assert_eq!(template.section(SectionKind::BasicInfo)["projectName"], json!("Seed"));
        assert_eq!(template.section(SectionKind::CodeQuality), codec::empty_fragment(SectionKind::CodeQuality));
    }

    #[test]
    fn test_invalid_templates() {
        assert!(matches!(ProjectTemplate::parse("[]"), Err(Error::Template(_))));
        assert!(matches!(ProjectTemplate::parse("{"), Err(Error::Template(_))));
        assert!(matches!(ProjectTemplate::parse(r#"{"basicInfo": 3}"#), Err(Error::Template(_))));
    }

    #[test]
    fn test_merge_keeps_unlisted_keys() {
        let mut template = ProjectTemplate::parse(
            r#"{"technicalInfo": {"deployment": ["Docker"], "frontendTech": ["Flutter"]}}"#,
        )
        .unwrap();

        let update = json!({ "frontendTech": ["TypeScript"] });
        template.merge_section(SectionKind::TechnicalInfo, update.as_object().cloned().unwrap());

        let merged = template.section(SectionKind::TechnicalInfo);
        assert_eq!(merged["frontendTech"], json!(["TypeScript"]));
        assert_eq!(merged["deployment"], json!(["Docker"]));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("template.json");
        std::fs::write(&path, r#"{"githubInfo": {"repositoryUrl": "n/a"}}"#).unwrap();

        let template = ProjectTemplate::load(Some(&path)).unwrap();
        assert_eq!(template.section(SectionKind::GithubInfo)["repositoryUrl"], json!("n/a"));

        let missing = ProjectTemplate::load(Some(&dir.path().join("nope.json")));
        assert!(matches!(missing, Err(Error::Io(_))));
    }
}
