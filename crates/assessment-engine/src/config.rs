use std::fs;
use std::path::Path;

use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{ConfigError, EngineError};

pub const DEFAULT_TITLE_TEMPLATE: &str = "{{job_title}} Assessment";
pub const DEFAULT_DESCRIPTION_TEMPLATE: &str = "Technical assessment for {{job_title}} position";

/// Engine settings. Every field has a default, so `{}` or an empty file is a
/// valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Handlebars template for the title of a newly created assessment.
    pub title_template: String,
    /// Handlebars template for the description of a newly created assessment.
    pub description_template: String,
    /// Refuse to save assessments with a blank title.
    pub require_title: bool,
    /// Refuse to save assessments whose dependency graph has issues.
    pub check_dependencies: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title_template: DEFAULT_TITLE_TEMPLATE.into(),
            description_template: DEFAULT_DESCRIPTION_TEMPLATE.into(),
            require_title: true,
            check_dependencies: true,
        }
    }
}

/// Title and description seeded into a new assessment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAssessmentText {
    pub title: String,
    pub description: String,
}

impl EngineConfig {
    pub fn from_json_str(config_json: &str) -> Result<Self, ConfigError> {
        let config = if config_json.trim().is_empty() {
            EngineConfig::default()
        } else {
            serde_json::from_str(config_json).map_err(ConfigError::Parse)?
        };
        config.check_templates()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn new_assessment_text(&self, job_title: &str) -> Result<NewAssessmentText, EngineError> {
        let engine = template_engine();
        let data = json!({ "job_title": job_title });
        Ok(NewAssessmentText {
            title: engine.render_template(&self.title_template, &data)?,
            description: engine.render_template(&self.description_template, &data)?,
        })
    }

    fn check_templates(&self) -> Result<(), ConfigError> {
        let engine = template_engine();
        let sample = json!({ "job_title": "Sample" });
        for (name, template) in [
            ("title_template", &self.title_template),
            ("description_template", &self.description_template),
        ] {
            engine
                .render_template(template, &sample)
                .map_err(|source| ConfigError::Template {
                    name,
                    source: Box::new(source),
                })?;
        }
        Ok(())
    }
}

fn template_engine() -> Handlebars<'static> {
    let mut engine = Handlebars::new();
    engine.set_strict_mode(true);
    engine.register_escape_fn(handlebars::no_escape);
    engine
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = EngineConfig::from_json_str("  ").expect("config");
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let config =
            EngineConfig::from_json_str(r#"{ "require_title": false }"#).expect("config");
        assert!(!config.require_title);
        assert!(config.check_dependencies);
        assert_eq!(config.title_template, DEFAULT_TITLE_TEMPLATE);
    }

    #[test]
    fn default_templates_match_job_title() {
        let text = EngineConfig::default()
            .new_assessment_text("Platform Engineer")
            .expect("render");
        assert_eq!(text.title, "Platform Engineer Assessment");
        assert_eq!(
            text.description,
            "Technical assessment for Platform Engineer position"
        );
    }

    #[test]
    fn titles_are_not_html_escaped() {
        let text = EngineConfig::default()
            .new_assessment_text("R&D <Lead>")
            .expect("render");
        assert_eq!(text.title, "R&D <Lead> Assessment");
    }

    #[test]
    fn unknown_template_variables_are_rejected() {
        let error = EngineConfig::from_json_str(r#"{ "title_template": "{{team}} quiz" }"#)
            .expect_err("strict mode");
        assert!(matches!(
            error,
            ConfigError::Template {
                name: "title_template",
                ..
            }
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            EngineConfig::from_json_str("{ nope"),
            Err(ConfigError::Parse(_))
        ));
    }
}
