//! rally.project — Resolved references to a Rally project and its build definition.

/// A project resolved by exact name match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRef {
    pub object_id: String,
    pub reference: String,
}

impl ProjectRef {
    /// Relative reference of the project's build definition collection.
    pub fn build_definitions_ref(&self) -> String {
        format!("project/{}/BuildDefinitions", self.object_id)
    }
}

/// A build definition scoped to a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDefinitionRef {
    pub reference: String,
}
