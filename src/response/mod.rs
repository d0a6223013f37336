//! Response handling: success/error classification and object decoding.

mod object;
mod parser;


pub use object::{
    ApiObject, Constructor, CustomObject, ListObject, ObjectRegistry, Record, SearchResultObject,
    deserialize,
};
pub use parser::{ApiResult, REQUEST_ID_HEADER, parse_response, request_id};
