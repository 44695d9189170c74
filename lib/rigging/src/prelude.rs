//! Common imports.
//!
//! ```ignore
//! use rigging::prelude::*;
//! ```

pub use crate::{
    Arg, ArrayFormat, ConvertTo, Error, HttpClient, HyperClient, LogLevel, LoggerOptions, Method,
    MethodMetadata, PartDescriptor, Reply, Request, Response, ResponseType, Result, Service,
    ServiceBuilder, ServiceMetadata, Validate, Violation, args,
};
pub use serde::{Deserialize, Serialize};
