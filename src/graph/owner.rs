//! Package owner classification
//!
//! Owners are decided by precedence-ordered pattern tests against the package
//! name: first the published names of the configured repositories, then each
//! configured rule in order. The first match wins; nothing matching yields
//! [`DEFAULT_OWNER`].

use regex::Regex;

use crate::config::OwnersConfig;
use crate::repository::RepositoryDescriptor;

/// Owner assigned when no test matches
pub const DEFAULT_OWNER: &str = "other";

/// Classifier built once per graph build from the repository list
#[derive(Debug, Clone)]
pub struct OwnerClassifier {
    rules: Vec<(Regex, String)>,
}

impl OwnerClassifier {
    /// Build the classifier.
    ///
    /// Repository `build_name`s are matched literally. With no `build_name`
    /// configured the organization test is skipped entirely, since an empty
    /// alternation would match every package.
    pub fn new(
        repositories: &[RepositoryDescriptor],
        config: &OwnersConfig,
    ) -> Result<Self, regex::Error> {
        let mut rules = Vec::with_capacity(config.rules.len() + 1);

        let build_names: Vec<String> = repositories
            .iter()
            .filter_map(|r| r.build_name.as_deref())
            .filter(|name| !name.is_empty())
            .map(regex::escape)
            .collect();
        if !build_names.is_empty() {
            rules.push((
                Regex::new(&build_names.join("|"))?,
                config.organization.clone(),
            ));
        }

        for rule in &config.rules {
            rules.push((Regex::new(&rule.pattern)?, rule.owner.clone()));
        }

        Ok(Self { rules })
    }

    /// Owner label for a package name
    pub fn classify(&self, package: &str) -> &str {
        self.rules
            .iter()
            .find(|(pattern, _)| pattern.is_match(package))
            .map(|(_, owner)| owner.as_str())
            .unwrap_or(DEFAULT_OWNER)
    }
}
