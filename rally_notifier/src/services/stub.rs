//! Queued-response Rally transport for service tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::RallyError;
use crate::rally::{CreateRequest, CreateResponse, QueryRequest, QueryResponse, RallyTransport};

#[derive(Debug, Default)]
pub struct StubTransport {
    queries: Mutex<Vec<QueryRequest>>,
    creates: Mutex<Vec<CreateRequest>>,
    query_responses: Mutex<VecDeque<Result<QueryResponse, RallyError>>>,
    create_responses: Mutex<VecDeque<Result<CreateResponse, RallyError>>>,
}

impl StubTransport {
    pub fn push_query(&self, response: Result<QueryResponse, RallyError>) {
        self.query_responses.lock().unwrap().push_back(response);
    }

    pub fn push_create(&self, response: Result<CreateResponse, RallyError>) {
        self.create_responses.lock().unwrap().push_back(response);
    }

    pub fn queries(&self) -> Vec<QueryRequest> {
        self.queries.lock().unwrap().clone()
    }

    pub fn creates(&self) -> Vec<CreateRequest> {
        self.creates.lock().unwrap().clone()
    }
}

#[async_trait]
impl RallyTransport for StubTransport {
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, RallyError> {
        self.queries.lock().unwrap().push(request.clone());
        self.query_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RallyError::Request("stub transport has no more queued queries".into())))
    }

    async fn create(&self, request: &CreateRequest) -> Result<CreateResponse, RallyError> {
        self.creates.lock().unwrap().push(request.clone());
        self.create_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RallyError::Request("stub transport has no more queued creates".into())))
    }
}

pub fn found(results: Vec<Value>) -> Result<QueryResponse, RallyError> {
    Ok(QueryResponse {
        total_result_count: results.len(),
        results,
        ..QueryResponse::default()
    })
}

pub fn empty() -> Result<QueryResponse, RallyError> {
    found(Vec::new())
}

pub fn query_error(message: &str) -> Result<QueryResponse, RallyError> {
    Ok(QueryResponse {
        errors: vec![message.to_string()],
        ..QueryResponse::default()
    })
}

pub fn created(reference: &str) -> Result<CreateResponse, RallyError> {
    Ok(CreateResponse {
        object: Some(json!({ "_ref": reference })),
        ..CreateResponse::default()
    })
}

pub fn create_error(message: &str) -> Result<CreateResponse, RallyError> {
    Ok(CreateResponse {
        errors: vec![message.to_string()],
        ..CreateResponse::default()
    })
}

pub fn project_json(object_id: u64) -> Value {
    json!({
        "_ref": format!("https://rally1.rallydev.com/slm/webservice/v2.0/project/{object_id}"),
        "ObjectID": object_id,
        "Name": "Mobile",
    })
}

pub fn changeset_json(id: u64, artifact_count: u64) -> Value {
    json!({
        "_ref": format!("https://rally1.rallydev.com/slm/webservice/v2.0/changeset/{id}"),
        "ObjectID": id,
        "Artifacts": {
            "_ref": format!("https://rally1.rallydev.com/slm/webservice/v2.0/Changeset/{id}/Artifacts"),
            "Count": artifact_count,
        },
    })
}

pub fn artifact_json(type_tag: &str, object_id: u64, formatted_id: &str, title: &str) -> Value {
    json!({
        "_type": type_tag,
        "ObjectID": object_id,
        "FormattedID": formatted_id,
        "_refObjectName": title,
    })
}
