//! Generic API objects decoded from JSON by their `object` type tag.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ApiErrorInfo, Error, ErrorKind};

/// A JSON object with typed accessors.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Wraps a JSON map.
    #[must_use]
    pub const fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// The `id` field.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.get_str("id")
    }

    /// The `object` type tag.
    #[must_use]
    pub fn object_type(&self) -> Option<&str> {
        self.get_str("object")
    }

    /// Raw field access.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// A string field.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// An integer field.
    #[must_use]
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    /// A boolean field.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// A nested object field.
    #[must_use]
    pub fn get_record(&self, key: &str) -> Option<Self> {
        match self.0.get(key) {
            Some(Value::Object(map)) => Some(Self(map.clone())),
            _ => None,
        }
    }

    /// The underlying map.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Converts back into a JSON value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// A page of objects (`"object": "list"`).
#[derive(Debug)]
pub struct ListObject {
    /// Decoded items.
    pub data: Vec<ApiObject>,
    /// Whether more pages exist.
    pub has_more: bool,
    /// URL of the list endpoint.
    pub url: Option<String>,
}

/// A page of search results (`"object": "search_result"`).
#[derive(Debug)]
pub struct SearchResultObject {
    /// Decoded items.
    pub data: Vec<ApiObject>,
    /// Whether more pages exist.
    pub has_more: bool,
    /// Cursor for the next page.
    pub next_page: Option<String>,
    /// Total number of matches, when the server reports it.
    pub total_count: Option<i64>,
    /// URL of the search endpoint.
    pub url: Option<String>,
}

/// A caller-defined object type produced by a registered constructor.
pub trait CustomObject: fmt::Debug + Send + Sync {
    /// The underlying record.
    fn record(&self) -> &Record;

    /// Upcast for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;
}

/// A decoded API object.
#[derive(Debug)]
pub enum ApiObject {
    /// A list page.
    List(ListObject),
    /// A search result page.
    SearchResult(SearchResultObject),
    /// Any object without a registered constructor.
    Record(Record),
    /// An object built by a registered constructor.
    Custom(Box<dyn CustomObject>),
}

impl ApiObject {
    /// Returns the record, for record and custom objects.
    #[must_use]
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            Self::Custom(custom) => Some(custom.record()),
            Self::List(_) | Self::SearchResult(_) => None,
        }
    }

    /// Downcasts a custom object to its concrete type.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        match self {
            Self::Custom(custom) => custom.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }
}

/// Builds an [`ApiObject`] from a record; nested values are decoded through
/// the registry passed in.
pub type Constructor = fn(Record, &ObjectRegistry) -> ApiObject;

/// Maps `object` type tags to constructors.
///
/// Tags without a constructor decode to [`ApiObject::Record`].
#[derive(Clone)]
pub struct ObjectRegistry {
    constructors: HashMap<String, Constructor>,
}

impl ObjectRegistry {
    /// A registry with no constructors; everything decodes to a record.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Registers a constructor for `tag`, replacing any previous one.
    pub fn register(&mut self, tag: impl Into<String>, constructor: Constructor) {
        self.constructors.insert(tag.into(), constructor);
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, tag: impl Into<String>, constructor: Constructor) -> Self {
        self.register(tag, constructor);
        self
    }

    /// Returns true if `tag` has a constructor.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.constructors.contains_key(tag)
    }

    /// Decodes a JSON object. Returns `None` for non-object values.
    #[must_use]
    pub fn convert(&self, value: Value) -> Option<ApiObject> {
        let Value::Object(map) = value else {
            return None;
        };
        let record = Record(map);
        let constructor = record
            .object_type()
            .and_then(|tag| self.constructors.get(tag))
            .copied();
        Some(match constructor {
            Some(constructor) => constructor(record, self),
            None => ApiObject::Record(record),
        })
    }

    fn convert_items(&self, record: &Record) -> Vec<ApiObject> {
        match record.get("data") {
            Some(Value::Array(items)) => items
                .iter()
                .cloned()
                .filter_map(|item| self.convert(item))
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl Default for ObjectRegistry {
    fn default() -> Self {
        Self::empty()
            .with("list", list_constructor)
            .with("search_result", search_result_constructor)
    }
}

impl fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.constructors.keys().collect();
        tags.sort();
        f.debug_struct("ObjectRegistry").field("tags", &tags).finish()
    }
}

fn list_constructor(record: Record, registry: &ObjectRegistry) -> ApiObject {
    ApiObject::List(ListObject {
        data: registry.convert_items(&record),
        has_more: record.get_bool("has_more").unwrap_or(false),
        url: record.get_str("url").map(str::to_string),
    })
}

fn search_result_constructor(record: Record, registry: &ObjectRegistry) -> ApiObject {
    ApiObject::SearchResult(SearchResultObject {
        data: registry.convert_items(&record),
        has_more: record.get_bool("has_more").unwrap_or(false),
        next_page: record.get_str("next_page").map(str::to_string),
        total_count: record.get_i64("total_count"),
        url: record.get_str("url").map(str::to_string),
    })
}

/// Decodes a JSON string through the default registry.
///
/// # Errors
///
/// Returns an `APIError` if the input is not a JSON object.
pub fn deserialize(data: &str) -> Result<ApiObject, Error> {
    let value: Value = serde_json::from_str(data).map_err(|e| {
        ApiErrorInfo::new(ErrorKind::Api, format!("Invalid JSON object: {e}"))
    })?;
    ObjectRegistry::default()
        .convert(value)
        .ok_or_else(|| ApiErrorInfo::new(ErrorKind::Api, "Expected a JSON object").into())
}
