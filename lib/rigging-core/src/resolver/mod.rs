//! Parameter resolvers: metadata plus call arguments to URL, headers, query and payload.
//!
//! Every resolver is a pure function of the method metadata and the positional
//! arguments of one call. Binding errors are raised here, before anything is
//! dispatched.

mod body;
mod headers;
mod query;
mod url;

pub use body::{Payload, resolve_body};
pub use headers::resolve_headers;
pub use query::resolve_query;
pub use url::resolve_url;
