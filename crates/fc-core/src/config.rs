//! Run-level configuration attached to emitted catalog entities.
//!
//! These values are opaque to the classifier; they only surface in catalog
//! metadata and in the synthesized owner group.

use serde::{Deserialize, Serialize};

use crate::{CatalogError, normalize};

pub const DEFAULT_TEAM_NAME: &str = "team-a";
pub const DEFAULT_LIFECYCLE: &str = "production";
pub const DEFAULT_REPO_SLUG: &str = "org/repo";
pub const DEFAULT_NAMESPACE: &str = "default";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RunConfig {
    pub team_name: String,
    /// Owner group name; falls back to `team_name` when unset.
    pub owner: Option<String>,
    pub lifecycle: String,
    pub repo_slug: String,
    pub namespace: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            team_name: DEFAULT_TEAM_NAME.to_string(),
            owner: None,
            lifecycle: DEFAULT_LIFECYCLE.to_string(),
            repo_slug: DEFAULT_REPO_SLUG.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl RunConfig {
    /// Canonical name of the synthesized team group.
    #[must_use]
    pub fn group_name(&self) -> String {
        normalize(&self.team_name)
    }

    /// Catalog reference of the owning group (`group:<name>`).
    #[must_use]
    pub fn owner_ref(&self) -> String {
        let owner = self
            .owner
            .as_deref()
            .filter(|owner| !owner.trim().is_empty())
            .unwrap_or(&self.team_name);
        format!("group:{}", normalize(owner))
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        let required = [
            ("team_name", &self.team_name),
            ("lifecycle", &self.lifecycle),
            ("repo_slug", &self.repo_slug),
            ("namespace", &self.namespace),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(CatalogError::configuration(field, "must not be blank"));
            }
        }
        if normalize(&self.team_name).trim_matches('-').is_empty() {
            return Err(CatalogError::configuration(
                "team_name",
                "does not contain any identifier characters",
            ));
        }
        Ok(())
    }
}
