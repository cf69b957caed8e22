//! rally.build_data — The per-build Rally action: linked defects and user stories.

use std::sync::{PoisonError, RwLock};

use serde::{Serialize, Serializer};

use super::artifact::{Artifact, ArtifactKind};

pub const ICON_FILE_NAME: &str = "/plugin/rally_build/rally.png";
pub const DISPLAY_NAME: &str = "Rally";
pub const URL_NAME: &str = "rally";

/// Deduplicated, insertion-ordered artifact sets. Safe to fill from several threads.
#[derive(Debug, Default)]
pub struct BuildData {
    defects: RwLock<Vec<Artifact>>,
    user_stories: RwLock<Vec<Artifact>>,
}

impl BuildData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an artifact. Returns `false` when an artifact with the same identity is present.
    pub fn add_artifact(&self, artifact: Artifact) -> bool {
        let set = match artifact.kind() {
            ArtifactKind::Defect => &self.defects,
            ArtifactKind::UserStory => &self.user_stories,
        };
        let mut set = set.write().unwrap_or_else(PoisonError::into_inner);
        if set.contains(&artifact) {
            return false;
        }
        set.push(artifact);
        true
    }

    /// Merged view, defects first.
    pub fn artifacts(&self) -> Vec<Artifact> {
        let mut all = self.defects();
        all.extend(self.user_stories());
        all
    }

    pub fn defects(&self) -> Vec<Artifact> {
        self.defects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn user_stories(&self) -> Vec<Artifact> {
        self.user_stories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts().is_empty()
    }

    pub fn icon_file_name(&self) -> &'static str {
        ICON_FILE_NAME
    }

    pub fn display_name(&self) -> &'static str {
        DISPLAY_NAME
    }

    pub fn url_name(&self) -> &'static str {
        URL_NAME
    }
}

#[derive(Serialize)]
struct BuildDataView<'a> {
    icon_file_name: &'a str,
    display_name: &'a str,
    url_name: &'a str,
    defects: Vec<Artifact>,
    user_stories: Vec<Artifact>,
}

impl Serialize for BuildData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        BuildDataView {
            icon_file_name: self.icon_file_name(),
            display_name: self.display_name(),
            url_name: self.url_name(),
            defects: self.defects(),
            user_stories: self.user_stories(),
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn defect(id: &str) -> Artifact {
        Artifact::new(ArtifactKind::Defect, id, format!("DE{id}"), "Broken", "link")
    }

    fn story(id: &str) -> Artifact {
        Artifact::new(ArtifactKind::UserStory, id, format!("US{id}"), "Feature", "link")
    }

    #[test]
    fn duplicate_identity_is_not_inserted_twice() {
        let data = BuildData::new();
        assert!(data.add_artifact(defect("1")));
        assert!(!data.add_artifact(defect("1")));
        assert!(data.add_artifact(story("1")));

        assert_eq!(data.defects().len(), 1);
        assert_eq!(data.user_stories().len(), 1);
        assert_eq!(data.artifacts().len(), 2);
    }

    #[test]
    fn merged_view_lists_defects_before_stories() {
        let data = BuildData::new();
        data.add_artifact(story("9"));
        data.add_artifact(defect("3"));

        let ids: Vec<_> = data
            .artifacts()
            .iter()
            .map(|a| a.formatted_id().to_string())
            .collect();
        assert_eq!(ids, vec!["DE3", "US9"]);
    }

    #[test]
    fn concurrent_inserts_are_deduplicated() {
        let data = Arc::new(BuildData::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let data = Arc::clone(&data);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        data.add_artifact(defect(&i.to_string()));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(data.defects().len(), 50);
    }

    #[test]
    fn serializes_action_metadata_with_groups() {
        let data = BuildData::new();
        data.add_artifact(defect("5"));

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["display_name"], "Rally");
        assert_eq!(json["url_name"], "rally");
        assert_eq!(json["icon_file_name"], ICON_FILE_NAME);
        assert_eq!(json["defects"][0]["formatted_id"], "DE5");
        assert_eq!(json["user_stories"].as_array().unwrap().len(), 0);
    }
}
