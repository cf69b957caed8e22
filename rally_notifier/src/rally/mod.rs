//! Rally WSAPI v2.0 client — request types, responses, and the HTTP transport.

pub mod request;
pub mod transport;

pub use request::{CreateRequest, CreateResponse, Fetch, QueryFilter, QueryRequest, QueryResponse};
pub use transport::{HttpTransport, RallyTransport};
