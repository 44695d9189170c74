//! Declarative HTTP client.
//!
//! Declare an API as [`ServiceMetadata`], one [`MethodMetadata`] per method,
//! then call the methods by name through a [`Service`].
//!
//! # Example
//!
//! ```ignore
//! use rigging::prelude::*;
//!
//! let metadata = ServiceMetadata::new("/users").method(
//!     "get_user",
//!     MethodMetadata::builder(Method::Get, "/{id}").path_param(0, "id").build(),
//! );
//!
//! let users = ServiceBuilder::new()
//!     .endpoint("https://api.example.com")
//!     .inline_response_body()
//!     .build(metadata);
//!
//! let user: User = users.invoke("get_user", &args![42]).await?.json()?;
//! ```

mod client;
mod history;
mod interceptor;
pub mod middleware;
pub mod prelude;
mod service;

pub use client::{BoxedService, HyperClient, HyperClientBuilder, ServiceFuture};
pub use history::History;
pub use interceptor::{InterceptorHandle, Interceptors, RequestInterceptor, ResponseInterceptor};
pub use service::{Completion, OnComplete, Service, ServiceBuilder};

pub use tower;

pub use rigging_core::{
    Arg, ArrayFormat, BindingError, Body, ContentType, ConvertTo, Error, Form, GraphQl, Headers,
    HttpClient, LogLevel, LoggerOptions, Method, MethodMetadata, MethodMetadataBuilder, Part,
    PartDescriptor, PartValue, QueryValue, Reply, Request, RequestBuilder, Response, ResponseType,
    Result, ServiceMetadata, Validate, Violation, args, from_json, to_form, to_json,
};
pub use rigging_core::{ConfigOverride, DEFAULT_TIMEOUT};
