//! Per-method declarations and the per-service metadata table.
//!
//! A [`MethodMetadata`] records everything declared about one service method:
//! verb and path template, static and argument-bound headers and query
//! parameters, body bindings, transformers and response handling. Argument
//! bindings map a positional argument index to a name; values are read from
//! the call arguments when a request is assembled.
//!
//! # Example
//!
//! ```
//! use rigging_core::{Method, MethodMetadata, ServiceMetadata};
//!
//! let service = ServiceMetadata::new("/api/v1").method(
//!     "getPost",
//!     MethodMetadata::builder(Method::Get, "/posts/{id}")
//!         .path_param(0, "id")
//!         .query_param(1, "fields")
//!         .build(),
//! );
//!
//! let metadata = service.get_metadata("getPost").expect("declared");
//! assert_eq!(metadata.path(), "/posts/{id}");
//! assert!(service.get_metadata("deletePost").is_err());
//! ```

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use serde_json::Value;

use crate::{
    Body, ConfigOverride, ConvertTo, Error, Headers, Method, RequestTransformer, ResponseTransformer,
    ResponseType, Result,
};

/// Serialization of list-valued query parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ArrayFormat {
    /// `k[0]=a&k[1]=b`
    Indices,
    /// `k[]=a&k[]=b`
    #[default]
    Brackets,
    /// `k=a&k=b`
    Repeat,
    /// `k=a,b`
    Comma,
}

/// A GraphQL operation sent as the request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphQl {
    /// The query document.
    pub query: String,
    /// The operation to run, when the document holds several.
    pub operation_name: Option<String>,
}

/// Argument bindings: argument index to name, in declaration order.
pub type Bindings = IndexMap<usize, String>;

/// Everything declared about one service method.
#[derive(Clone)]
pub struct MethodMetadata {
    pub(crate) method: Option<Method>,
    pub(crate) path: String,
    pub(crate) ignore_base_path: bool,
    pub(crate) path_params: Bindings,
    pub(crate) headers: IndexMap<String, Value>,
    pub(crate) header_params: Bindings,
    pub(crate) header_map_index: Option<usize>,
    pub(crate) query: IndexMap<String, Value>,
    pub(crate) query_params: Bindings,
    pub(crate) query_map_index: Option<usize>,
    pub(crate) array_format: ArrayFormat,
    pub(crate) body_index: Option<usize>,
    pub(crate) fields: Bindings,
    pub(crate) field_map_index: Option<usize>,
    pub(crate) parts: Bindings,
    pub(crate) graphql: Option<GraphQl>,
    pub(crate) graphql_variables_index: Option<usize>,
    pub(crate) response_type: Option<ResponseType>,
    pub(crate) request_transformers: Vec<RequestTransformer>,
    pub(crate) response_transformers: Vec<ResponseTransformer>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) response_status: Option<u16>,
    pub(crate) convert_to: Option<ConvertTo>,
    pub(crate) deprecated: Option<Option<String>>,
    pub(crate) config: ConfigOverride,
}

impl Default for MethodMetadata {
    fn default() -> Self {
        let mut headers = IndexMap::new();
        headers.insert(
            "Content-Type".to_string(),
            Value::from(crate::ContentType::Json.as_str()),
        );
        Self {
            method: None,
            path: String::new(),
            ignore_base_path: false,
            path_params: Bindings::new(),
            headers,
            header_params: Bindings::new(),
            header_map_index: None,
            query: IndexMap::new(),
            query_params: Bindings::new(),
            query_map_index: None,
            array_format: ArrayFormat::default(),
            body_index: None,
            fields: Bindings::new(),
            field_map_index: None,
            parts: Bindings::new(),
            graphql: None,
            graphql_variables_index: None,
            response_type: None,
            request_transformers: Vec::new(),
            response_transformers: Vec::new(),
            timeout: None,
            response_status: None,
            convert_to: None,
            deprecated: None,
            config: ConfigOverride::default(),
        }
    }
}

impl MethodMetadata {
    /// Start declaring a method with the given verb and path template.
    #[must_use]
    pub fn builder(method: Method, path: impl Into<String>) -> MethodMetadataBuilder {
        MethodMetadataBuilder::new(Some(method), path.into())
    }

    /// Start declaring a method without HTTP verb.
    ///
    /// Invoking such a method fails with [`Error::NoHttpMethod`].
    #[must_use]
    pub fn builder_without_method() -> MethodMetadataBuilder {
        MethodMetadataBuilder::new(None, String::new())
    }

    /// HTTP verb, if declared.
    #[must_use]
    pub const fn method(&self) -> Option<Method> {
        self.method
    }

    /// Path template (may be an absolute URL).
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Static headers, including the default `Content-Type`.
    #[must_use]
    pub const fn static_headers(&self) -> &IndexMap<String, Value> {
        &self.headers
    }

    /// Method-level timeout.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Declared conversion target.
    #[must_use]
    pub const fn convert_to(&self) -> Option<&ConvertTo> {
        self.convert_to.as_ref()
    }

    /// Declared success status (informational only).
    #[must_use]
    pub const fn response_status(&self) -> Option<u16> {
        self.response_status
    }

    /// Returns `true` if the method is deprecated.
    #[must_use]
    pub const fn is_deprecated(&self) -> bool {
        self.deprecated.is_some()
    }

    /// Deprecation hint, if any.
    #[must_use]
    pub fn deprecation_hint(&self) -> Option<&str> {
        self.deprecated.as_ref().and_then(Option::as_deref)
    }
}

impl std::fmt::Debug for MethodMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodMetadata")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("headers", &self.headers)
            .field("query", &self.query)
            .field("path_params", &self.path_params)
            .field("body_index", &self.body_index)
            .field("fields", &self.fields)
            .field("parts", &self.parts)
            .field("request_transformers", &self.request_transformers.len())
            .field("response_transformers", &self.response_transformers.len())
            .field("convert_to", &self.convert_to)
            .finish_non_exhaustive()
    }
}

/// Set `name` in a static header map, replacing any casing of the same name.
fn set_static_header(headers: &mut IndexMap<String, Value>, name: String, value: Value) {
    headers.retain(|key, _| !key.eq_ignore_ascii_case(&name));
    headers.insert(name, value);
}

/// Builder for [`MethodMetadata`], one call per declaration.
#[derive(Debug, Clone)]
pub struct MethodMetadataBuilder {
    metadata: MethodMetadata,
}

impl MethodMetadataBuilder {
    fn new(method: Option<Method>, path: String) -> Self {
        Self {
            metadata: MethodMetadata {
                method,
                path,
                ..MethodMetadata::default()
            },
        }
    }

    /// Resolve the path against the endpoint only, skipping the service base path.
    #[must_use]
    pub fn ignore_base_path(mut self) -> Self {
        self.metadata.ignore_base_path = true;
        self
    }

    /// Substitute `{name}` in the path with argument `index`.
    #[must_use]
    pub fn path_param(mut self, index: usize, name: impl Into<String>) -> Self {
        self.metadata.path_params.insert(index, name.into());
        self
    }

    /// Add a static header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        set_static_header(&mut self.metadata.headers, name.into(), value.into());
        self
    }

    /// Add several static headers.
    #[must_use]
    pub fn headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        for (name, value) in headers {
            set_static_header(&mut self.metadata.headers, name.into(), value.into());
        }
        self
    }

    /// Bind argument `index` to header `name`.
    #[must_use]
    pub fn header_param(mut self, index: usize, name: impl Into<String>) -> Self {
        self.metadata.header_params.insert(index, name.into());
        self
    }

    /// Bind argument `index` as a map of headers.
    #[must_use]
    pub const fn header_map(mut self, index: usize) -> Self {
        self.metadata.header_map_index = Some(index);
        self
    }

    /// Add a static query parameter.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.query.insert(name.into(), value.into());
        self
    }

    /// Add several static query parameters.
    #[must_use]
    pub fn queries<K, V>(mut self, queries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.metadata.query.extend(
            queries
                .into_iter()
                .map(|(name, value)| (name.into(), value.into())),
        );
        self
    }

    /// Bind argument `index` to query parameter `name`.
    #[must_use]
    pub fn query_param(mut self, index: usize, name: impl Into<String>) -> Self {
        self.metadata.query_params.insert(index, name.into());
        self
    }

    /// Bind argument `index` as a map of query parameters.
    #[must_use]
    pub const fn query_map(mut self, index: usize) -> Self {
        self.metadata.query_map_index = Some(index);
        self
    }

    /// Serialization of list-valued query parameters.
    #[must_use]
    pub const fn query_array_format(mut self, format: ArrayFormat) -> Self {
        self.metadata.array_format = format;
        self
    }

    /// Bind argument `index` as the request body.
    #[must_use]
    pub const fn body(mut self, index: usize) -> Self {
        self.metadata.body_index = Some(index);
        self
    }

    /// Bind argument `index` to body field `name`.
    #[must_use]
    pub fn field(mut self, index: usize, name: impl Into<String>) -> Self {
        self.metadata.fields.insert(index, name.into());
        self
    }

    /// Bind argument `index` as a map of body fields.
    #[must_use]
    pub const fn field_map(mut self, index: usize) -> Self {
        self.metadata.field_map_index = Some(index);
        self
    }

    /// Bind argument `index` to multipart part `name`.
    #[must_use]
    pub fn part(mut self, index: usize, name: impl Into<String>) -> Self {
        self.metadata.parts.insert(index, name.into());
        self
    }

    /// Send the body form URL-encoded.
    #[must_use]
    pub fn form_url_encoded(self) -> Self {
        self.header(
            "Content-Type",
            "application/x-www-form-urlencoded;charset=utf-8",
        )
    }

    /// Send the body as `multipart/form-data`.
    #[must_use]
    pub fn multipart(self) -> Self {
        self.header("Content-Type", crate::ContentType::Multipart.as_str())
    }

    /// Send a GraphQL operation as the body.
    #[must_use]
    pub fn graphql(mut self, query: impl Into<String>, operation_name: Option<&str>) -> Self {
        self.metadata.graphql = Some(GraphQl {
            query: query.into(),
            operation_name: operation_name.map(str::to_string),
        });
        self
    }

    /// Bind argument `index` as the GraphQL variables.
    #[must_use]
    pub const fn graphql_variables(mut self, index: usize) -> Self {
        self.metadata.graphql_variables_index = Some(index);
        self
    }

    /// How the response body is decoded.
    #[must_use]
    pub const fn response_type(mut self, response_type: ResponseType) -> Self {
        self.metadata.response_type = Some(response_type);
        self
    }

    /// Append a request transformer.
    #[must_use]
    pub fn request_transformer<F>(mut self, transformer: F) -> Self
    where
        F: Fn(Body, &Headers) -> Result<Body> + Send + Sync + 'static,
    {
        self.metadata.request_transformers.push(Arc::new(transformer));
        self
    }

    /// Append a response transformer.
    #[must_use]
    pub fn response_transformer<F>(mut self, transformer: F) -> Self
    where
        F: Fn(Value, &Headers) -> Result<Value> + Send + Sync + 'static,
    {
        self.metadata
            .response_transformers
            .push(Arc::new(transformer));
        self
    }

    /// Method-level timeout, overriding the service default.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.metadata.timeout = Some(timeout);
        self
    }

    /// Declare the expected success status (informational only).
    #[must_use]
    pub const fn response_status(mut self, status: u16) -> Self {
        self.metadata.response_status = Some(status);
        self
    }

    /// Raw overrides applied last to the request descriptor.
    #[must_use]
    pub fn config(mut self, config: ConfigOverride) -> Self {
        self.metadata.config = config;
        self
    }

    /// Convert response data into a declared type.
    #[must_use]
    pub const fn convert_to(mut self, convert_to: ConvertTo) -> Self {
        self.metadata.convert_to = Some(convert_to);
        self
    }

    /// Mark the method as deprecated; every call logs a warning.
    #[must_use]
    pub fn deprecated(mut self, hint: Option<&str>) -> Self {
        self.metadata.deprecated = Some(hint.map(str::to_string));
        self
    }

    /// Finish the declaration.
    #[must_use]
    pub fn build(self) -> MethodMetadata {
        self.metadata
    }
}

/// Metadata table of one service: base path and methods by name.
#[derive(Debug, Clone, Default)]
pub struct ServiceMetadata {
    base_path: String,
    methods: IndexMap<String, MethodMetadata>,
}

impl ServiceMetadata {
    /// Create a table with the given base path.
    #[must_use]
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            methods: IndexMap::new(),
        }
    }

    /// Register a method, replacing any previous declaration under that name.
    #[must_use]
    pub fn method(mut self, name: impl Into<String>, metadata: MethodMetadata) -> Self {
        self.methods.insert(name.into(), metadata);
        self
    }

    /// Path prefix shared by all methods.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Metadata of method `name`.
    pub fn get_metadata(&self, name: &str) -> Result<&MethodMetadata> {
        self.methods
            .get(name)
            .ok_or_else(|| Error::MethodNotFound(name.to_string()))
    }

    /// Declared method names, in registration order.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }
}
