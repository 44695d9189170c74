//! Prelude module for convenient imports.
//!
//! ```ignore
//! use rigging_core::prelude::*;
//! ```

pub use crate::{
    Arg, ArrayFormat, Body, ConvertTo, Error, HttpClient, Method, MethodMetadata, PartDescriptor,
    Reply, Request, Response, ResponseType, Result, ServiceMetadata, Validate, Violation, args,
};
