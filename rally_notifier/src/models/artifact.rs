//! rally.artifact — A defect or user story linked from source-control history.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Defect,
    UserStory,
}

impl ArtifactKind {
    /// Map a Rally `_type` tag to an artifact kind. Other work item types are not tracked.
    pub fn from_rally_type(type_tag: &str) -> Option<Self> {
        match type_tag {
            "Defect" => Some(Self::Defect),
            "HierarchicalRequirement" => Some(Self::UserStory),
            _ => None,
        }
    }

    /// Path segment used by Rally's detail pages.
    pub fn detail_segment(self) -> &'static str {
        match self {
            Self::Defect => "defect",
            Self::UserStory => "userstory",
        }
    }
}

/// Identity is `(kind, id)`; the remaining fields are display data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    kind: ArtifactKind,
    id: String,
    formatted_id: String,
    title: String,
    link: String,
}

impl Artifact {
    pub fn new(
        kind: ArtifactKind,
        id: impl Into<String>,
        formatted_id: impl Into<String>,
        title: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            id: id.into(),
            formatted_id: formatted_id.into(),
            title: title.into(),
            link: link.into(),
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn formatted_id(&self) -> &str {
        &self.formatted_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn link(&self) -> &str {
        &self.link
    }
}

impl PartialEq for Artifact {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.id == other.id
    }
}

impl Eq for Artifact {}

impl Hash for Artifact {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.id.hash(state);
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.id, self.title)
    }
}

/// Build a Rally UI deep link for an artifact.
pub fn detail_link(base_url: &str, kind: ArtifactKind, id: &str) -> String {
    let base = base_url.strip_suffix('/').unwrap_or(base_url);
    format!("{base}/detail/{}/{id}", kind.detail_segment())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_ignores_display_fields() {
        let a = Artifact::new(ArtifactKind::Defect, "12", "DE12", "Crash on start", "x");
        let b = Artifact::new(ArtifactKind::Defect, "12", "DE12", "Renamed", "y");
        let c = Artifact::new(ArtifactKind::UserStory, "12", "US12", "Crash on start", "x");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn classifies_rally_type_tags() {
        assert_eq!(ArtifactKind::from_rally_type("Defect"), Some(ArtifactKind::Defect));
        assert_eq!(
            ArtifactKind::from_rally_type("HierarchicalRequirement"),
            Some(ArtifactKind::UserStory)
        );
        assert_eq!(ArtifactKind::from_rally_type("Task"), None);
    }

    #[test]
    fn detail_link_strips_one_trailing_slash() {
        assert_eq!(
            detail_link("https://rally1.rallydev.com/#/", ArtifactKind::Defect, "42"),
            "https://rally1.rallydev.com/#/detail/defect/42"
        );
        assert_eq!(
            detail_link("https://rally1.rallydev.com/#", ArtifactKind::UserStory, "7"),
            "https://rally1.rallydev.com/#/detail/userstory/7"
        );
    }

    #[test]
    fn displays_id_and_title() {
        let a = Artifact::new(ArtifactKind::Defect, "12", "DE12", "Crash on start", "x");
        assert_eq!(a.to_string(), "12 - Crash on start");
    }
}
