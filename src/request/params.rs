//! Ordered request parameters.

use serde_json::{Map, Value};

use super::BuildError;

/// A file attached to a request, sent as a multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// File name reported to the server.
    pub filename: String,
    /// MIME type; `application/octet-stream` when absent.
    pub content_type: Option<String>,
    /// File contents.
    pub data: Vec<u8>,
}

impl FilePart {
    /// Creates a file part.
    #[must_use]
    pub fn new(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            data: data.into(),
        }
    }

    /// Sets the MIME type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// A single parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Text value.
    String(String),
    /// Integer value.
    Integer(i64),
    /// Floating point value.
    Float(f64),
    /// Boolean value.
    Bool(bool),
    /// Explicit empty value; the API treats it as "unset this field".
    Null,
    /// Indexed list, encoded as `key[0]`, `key[1]`, ...
    List(Vec<ParamValue>),
    /// Nested map, encoded as `key[sub]`.
    Map(Params),
    /// File upload; forces a multipart body.
    File(FilePart),
}

impl ParamValue {
    /// Returns true if this value or anything nested in it is a file.
    #[must_use]
    pub fn contains_file(&self) -> bool {
        match self {
            Self::File(_) => true,
            Self::List(items) => items.iter().any(Self::contains_file),
            Self::Map(params) => params.has_file(),
            _ => false,
        }
    }

    /// Returns the text value, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Scalar text as it appears on the wire. Containers and files have none.
    #[must_use]
    pub fn to_form_text(&self) -> Option<String> {
        match self {
            Self::String(s) => Some(s.clone()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Null => Some(String::new()),
            Self::List(_) | Self::Map(_) | Self::File(_) => None,
        }
    }

    /// Converts every leaf to its wire text, the shape a decoded form has.
    ///
    /// Empty lists and maps become empty strings since they are sent as an
    /// empty value.
    #[must_use]
    pub fn stringified(&self) -> Self {
        match self {
            Self::List(items) if items.is_empty() => Self::String(String::new()),
            Self::Map(params) if params.is_empty() => Self::String(String::new()),
            Self::List(items) => Self::List(items.iter().map(Self::stringified).collect()),
            Self::Map(params) => Self::Map(params.stringified()),
            Self::File(_) => self.clone(),
            scalar => Self::String(scalar.to_form_text().unwrap_or_default()),
        }
    }

    fn to_json(&self) -> Result<Value, BuildError> {
        Ok(match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Integer(i) => Value::from(*i),
            Self::Float(f) => Value::from(*f),
            Self::Bool(b) => Value::Bool(*b),
            Self::Null => Value::Null,
            Self::List(items) => Value::Array(
                items
                    .iter()
                    .map(Self::to_json)
                    .collect::<Result<_, _>>()?,
            ),
            Self::Map(params) => params.to_json()?,
            Self::File(file) => {
                return Err(BuildError::InvalidParam(format!(
                    "file '{}' cannot be sent in a JSON body",
                    file.filename
                )));
            }
        })
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Params> for ParamValue {
    fn from(value: Params) -> Self {
        Self::Map(value)
    }
}

impl From<FilePart> for ParamValue {
    fn from(value: FilePart) -> Self {
        Self::File(value)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

/// Ordered list of `(key, value)` request parameters.
///
/// Order is preserved on the wire so the same params always produce the
/// same request.
///
/// # Example
///
/// ```
/// use stripe_core::request::Params;
///
/// let params = Params::new()
///     .with("amount", 2000)
///     .with("currency", "usd")
///     .with("metadata", Params::new().with("order", "6735"));
///
/// assert_eq!(params.len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Params(Vec<(String, ParamValue)>);

impl Params {
    /// Creates an empty parameter list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a parameter, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.push(key, value);
        self
    }

    /// Appends a parameter.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.push((key.into(), value.into()));
    }

    /// Returns the first value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns the value under `key`, inserting the result of `default` first
    /// if the key is absent.
    pub fn get_or_insert_with(
        &mut self,
        key: &str,
        default: impl FnOnce() -> ParamValue,
    ) -> &mut ParamValue {
        let index = match self.0.iter().position(|(k, _)| k == key) {
            Some(index) => index,
            None => {
                self.0.push((key.to_string(), default()));
                self.0.len() - 1
            }
        };
        &mut self.0[index].1
    }

    /// Iterates over parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of top-level parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if any parameter is, or contains, a file.
    #[must_use]
    pub fn has_file(&self) -> bool {
        self.0.iter().any(|(_, v)| v.contains_file())
    }

    /// See [`ParamValue::stringified`].
    #[must_use]
    pub fn stringified(&self) -> Self {
        Self(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.stringified()))
                .collect(),
        )
    }

    /// Converts the parameters to a JSON object for preview-mode bodies.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidParam`] if a file is present.
    pub fn to_json(&self) -> Result<Value, BuildError> {
        let mut map = Map::new();
        for (key, value) in &self.0 {
            map.insert(key.clone(), value.to_json()?);
        }
        Ok(Value::Object(map))
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = &'a (String, ParamValue);
    type IntoIter = std::slice::Iter<'a, (String, ParamValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
