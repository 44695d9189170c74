//! Request assembly and response pipeline engine for the rigging HTTP client.
//!
//! A service method is described by a [`MethodMetadata`]. For each call the
//! engine:
//! - resolves URL, headers, query and body payload from the call [`Arg`]s
//!   ([`resolve_url`], [`resolve_headers`], [`resolve_query`], [`resolve_body`]),
//! - serializes the payload according to the content type
//!   ([`create_data_resolver`]),
//! - assembles the [`Request`] descriptor ([`make_config`]),
//! - and, once an [`HttpClient`] returned a response, decodes, converts and
//!   validates it ([`process_response`]).

mod body;
mod client;
mod config_builder;
mod convert;
mod data_resolver;
mod error;
mod headers;
mod metadata;
mod method;
mod multipart;
mod pipeline;
pub mod prelude;
mod request;
mod resolver;
mod response;
mod transform;
mod value;

pub use body::{Body, ContentType, from_json, from_value, to_form, to_json};
pub use client::HttpClient;
pub use config_builder::{BuilderConfig, ConfigOverride, DEFAULT_TIMEOUT, make_config};
pub use convert::{ConvertTo, Converted, Validate, Violation};
pub use data_resolver::{
    DataResolver, FormUrlEncodedResolver, JsonResolver, MultipartResolver, TextResolver,
    create_data_resolver,
};
pub use error::{BindingError, Error, Result};
pub use headers::Headers;
pub use metadata::{
    ArrayFormat, Bindings, GraphQl, MethodMetadata, MethodMetadataBuilder, ServiceMetadata,
};
pub use method::Method;
pub use multipart::{Form, Part, PartDescriptor, PartValue};
pub use pipeline::{PipelineOptions, decode, process_response};
pub use request::{Request, RequestBuilder};
pub use resolver::{Payload, resolve_body, resolve_headers, resolve_query, resolve_url};
pub use response::{Reply, Response};
pub use transform::{
    LogLevel, LoggerOptions, RequestTransformer, ResponseTransformer, ResponseType,
    logging_transformer,
};
pub use value::{Arg, QueryValue, scalar_to_string};
