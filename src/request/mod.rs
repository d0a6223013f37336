//! Request construction: parameters, encodings, options and the builder.
//!
//! [`RequestBuilder::build`] is a pure function from
//! `(method, path, params, options)` to an [`HttpRequest`](crate::transport::HttpRequest).

mod builder;
mod encode;
mod multipart;
mod options;
mod params;

#[cfg(test)]
mod builder_tests;
#[cfg(test)]
mod encode_tests;

pub use builder::{BINDINGS_VERSION, BuildError, RequestBuilder, headers};
pub use encode::{FormField, decode_form, encode_form, flatten};
pub use multipart::{FormDataEncoder, MultipartBody, MultipartEncoder};
pub use options::{ApiBase, ApiMode, RequestOptions, ResolvedOptions};
pub use params::{FilePart, ParamValue, Params};
