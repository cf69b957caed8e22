//! WSAPI query and create requests, and the envelopes Rally answers with.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

/// Exact-match (or other operator) filter, rendered as `(Field op "value")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFilter {
    field: String,
    operator: String,
    value: String,
}

impl QueryFilter {
    pub fn new(field: &str, operator: &str, value: &str) -> Self {
        Self {
            field: field.to_string(),
            operator: operator.to_string(),
            value: value.to_string(),
        }
    }

    pub fn equals(field: &str, value: &str) -> Self {
        Self::new(field, "=", value)
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for QueryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.value.replace('\\', "\\\\").replace('"', "\\\"");
        write!(f, "({} {} \"{}\")", self.field, self.operator, value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Fetch {
    #[default]
    All,
    Fields(Vec<String>),
}

impl Fetch {
    pub fn as_param(&self) -> String {
        match self {
            Self::All => "true".to_string(),
            Self::Fields(fields) => fields.join(","),
        }
    }
}

/// What a query runs against: a type endpoint or a collection reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryTarget {
    Type(String),
    Collection(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub target: QueryTarget,
    pub filter: Option<QueryFilter>,
    pub fetch: Fetch,
    pub workspace: Option<String>,
    /// Maximum number of results to collect across pages. `None` collects all.
    pub limit: Option<usize>,
}

impl QueryRequest {
    pub fn new(type_name: &str) -> Self {
        Self::with_target(QueryTarget::Type(type_name.to_string()))
    }

    /// Query a collection by reference; absolute WSAPI URLs are made relative.
    pub fn collection(reference: &str) -> Self {
        Self::with_target(QueryTarget::Collection(relative_ref(reference)))
    }

    fn with_target(target: QueryTarget) -> Self {
        Self {
            target,
            filter: None,
            fetch: Fetch::All,
            workspace: None,
            limit: None,
        }
    }

    pub fn filter(mut self, filter: QueryFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn fetch(mut self, fetch: Fetch) -> Self {
        self.fetch = fetch;
        self
    }

    pub fn workspace(mut self, workspace: Option<&str>) -> Self {
        self.workspace = workspace.map(str::to_string);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Path below the WSAPI root.
    pub fn path(&self) -> &str {
        match &self.target {
            QueryTarget::Type(name) | QueryTarget::Collection(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateRequest {
    pub type_name: String,
    pub object: Value,
}

impl CreateRequest {
    pub fn new(type_name: &str, object: Value) -> Self {
        Self {
            type_name: type_name.to_string(),
            object,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryResponse {
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub total_result_count: usize,
    #[serde(default)]
    pub results: Vec<Value>,
}

impl QueryResponse {
    pub fn was_successful(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn first(&self) -> Option<&Value> {
        self.results.first()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateResponse {
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub object: Option<Value>,
}

impl CreateResponse {
    pub fn was_successful(&self) -> bool {
        self.errors.is_empty()
    }

    /// `_ref` of the created object.
    pub fn reference(&self) -> Option<&str> {
        self.object.as_ref().and_then(|o| o["_ref"].as_str())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct QueryEnvelope {
    #[serde(rename = "QueryResult")]
    pub query_result: QueryResponse,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateEnvelope {
    #[serde(rename = "CreateResult")]
    pub create_result: CreateResponse,
}

/// Strip the host and `/slm/webservice/<version>/` prefix from a WSAPI reference.
pub fn relative_ref(reference: &str) -> String {
    match reference.find("/webservice/") {
        Some(idx) => {
            let rest = &reference[idx + "/webservice/".len()..];
            rest.split_once('/')
                .map(|(_, path)| path)
                .unwrap_or(rest)
                .to_string()
        }
        None => reference.trim_start_matches('/').to_string(),
    }
}

/// Read a field that Rally may send either as a string or a number.
pub fn string_field(object: &Value, field: &str) -> Option<String> {
    match &object[field] {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_quotes_and_escapes_value() {
        assert_eq!(
            QueryFilter::equals("Name", "Mobile App").to_string(),
            "(Name = \"Mobile App\")"
        );
        assert_eq!(
            QueryFilter::equals("Name", "say \"hi\"").to_string(),
            "(Name = \"say \\\"hi\\\"\")"
        );
    }

    #[test]
    fn collection_refs_become_relative() {
        assert_eq!(
            relative_ref("https://rally1.rallydev.com/slm/webservice/v2.0/Changeset/77/Artifacts"),
            "Changeset/77/Artifacts"
        );
        assert_eq!(relative_ref("/project/12/BuildDefinitions"), "project/12/BuildDefinitions");
        assert_eq!(
            QueryRequest::collection("https://x/slm/webservice/v2.0/Project/1/BuildDefinitions")
                .path(),
            "Project/1/BuildDefinitions"
        );
    }

    #[test]
    fn decodes_query_envelope() {
        let envelope: QueryEnvelope = serde_json::from_value(json!({
            "QueryResult": {
                "Errors": [],
                "Warnings": ["deprecated"],
                "TotalResultCount": 3,
                "StartIndex": 1,
                "PageSize": 1,
                "Results": [{ "_ref": "r1" }]
            }
        }))
        .unwrap();
        let rsp = envelope.query_result;

        assert!(rsp.was_successful());
        assert_eq!(rsp.total_result_count, 3);
        assert_eq!(rsp.first().unwrap()["_ref"], "r1");
    }

    #[test]
    fn failed_create_has_no_reference() {
        let envelope: CreateEnvelope = serde_json::from_value(json!({
            "CreateResult": { "Errors": ["Not authorized"], "Warnings": [] }
        }))
        .unwrap();

        assert!(!envelope.create_result.was_successful());
        assert_eq!(envelope.create_result.reference(), None);
    }

    #[test]
    fn string_field_accepts_numbers() {
        let object = json!({ "ObjectID": 1234, "FormattedID": "DE1", "Missing": null });
        assert_eq!(string_field(&object, "ObjectID").as_deref(), Some("1234"));
        assert_eq!(string_field(&object, "FormattedID").as_deref(), Some("DE1"));
        assert_eq!(string_field(&object, "Missing"), None);
    }
}
