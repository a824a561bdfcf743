//! Business context: what the company is about, expressed as content
//! pillars with keyword lists. Drives relevance scoring and pillar tagging.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::normalize_keyword;
use crate::ConfigError;

/// One content pillar: a named theme plus the keywords that signal it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pillar {
    pub name: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BusinessContext {
    /// Free-text description of the business, sent to remote scorers.
    pub description: String,
    pub pillars: Vec<Pillar>,
}

impl BusinessContext {
    /// Names of pillars whose keywords overlap the given trend keyword or
    /// its related keywords. Matching is on normalized text; a pillar
    /// keyword matches when it is contained in the trend keyword or equals
    /// a related keyword.
    #[must_use]
    pub fn matching_pillars(&self, keyword: &str, related: &[String]) -> Vec<String> {
        let keyword_norm = normalize_keyword(keyword);
        let related_norm: HashSet<String> =
            related.iter().map(|r| normalize_keyword(r)).collect();

        let mut matched = Vec::new();
        for pillar in &self.pillars {
            let hit = pillar.keywords.iter().any(|pk| {
                let pk_norm = normalize_keyword(pk);
                keyword_norm.contains(&pk_norm) || related_norm.contains(&pk_norm)
            });
            if hit {
                matched.push(pillar.name.clone());
            }
        }
        matched
    }

    /// Total number of pillar keywords across the context.
    #[must_use]
    pub fn keyword_count(&self) -> usize {
        self.pillars.iter().map(|p| p.keywords.len()).sum()
    }
}

/// Load and validate the business context from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_business_context(path: &Path) -> Result<BusinessContext, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ContextFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let context: BusinessContext =
        serde_yaml::from_str(&content).map_err(ConfigError::ContextFileParse)?;

    validate_context(&context)?;

    Ok(context)
}

fn validate_context(context: &BusinessContext) -> Result<(), ConfigError> {
    if context.pillars.is_empty() {
        return Err(ConfigError::Validation(
            "business context must define at least one pillar".to_string(),
        ));
    }

    let mut seen_names = HashSet::new();
    for pillar in &context.pillars {
        if pillar.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "pillar name must be non-empty".to_string(),
            ));
        }

        if pillar.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "pillar '{}' has no usable keywords",
                pillar.name
            )));
        }

        let lower_name = pillar.name.to_lowercase();
        if !seen_names.insert(lower_name) {
            return Err(ConfigError::Validation(format!(
                "duplicate pillar name: '{}'",
                pillar.name
            )));
        }
    }

    Ok(())
}
