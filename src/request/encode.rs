//! Bracket-notation form encoding.
//!
//! Nested maps become `metadata[order]=1`, lists become `items[0][price]=p_1`.
//! Brackets are left unescaped; keys and values are otherwise
//! percent-encoded with `url::form_urlencoded`.

use url::form_urlencoded;

use super::BuildError;
use super::params::{FilePart, ParamValue, Params};

/// A flattened `(key, value)` pair. Text is owned since numbers are rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum FormField<'a> {
    /// Text field.
    Text {
        /// Bracketed key.
        key: String,
        /// Rendered value.
        value: String,
    },
    /// File field.
    File {
        /// Bracketed key.
        key: String,
        /// Attached file.
        file: &'a FilePart,
    },
}

impl FormField<'_> {
    /// Bracketed key of this field.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Text { key, .. } | Self::File { key, .. } => key,
        }
    }
}

/// Flattens nested params into bracketed `(key, value)` fields in order.
#[must_use]
pub fn flatten(params: &Params) -> Vec<FormField<'_>> {
    let mut fields = Vec::new();
    for (key, value) in params {
        flatten_value(key.clone(), value, &mut fields);
    }
    fields
}

fn flatten_value<'a>(key: String, value: &'a ParamValue, out: &mut Vec<FormField<'a>>) {
    match value {
        ParamValue::Map(params) if params.is_empty() => out.push(FormField::Text {
            key,
            value: String::new(),
        }),
        ParamValue::List(items) if items.is_empty() => out.push(FormField::Text {
            key,
            value: String::new(),
        }),
        ParamValue::Map(params) => {
            for (sub, value) in params {
                flatten_value(format!("{key}[{sub}]"), value, out);
            }
        }
        ParamValue::List(items) => {
            for (index, value) in items.iter().enumerate() {
                flatten_value(format!("{key}[{index}]"), value, out);
            }
        }
        ParamValue::File(file) => out.push(FormField::File { key, file }),
        scalar => out.push(FormField::Text {
            key,
            value: scalar.to_form_text().unwrap_or_default(),
        }),
    }
}

/// Encodes params as `application/x-www-form-urlencoded`.
///
/// # Errors
///
/// Returns [`BuildError::InvalidParam`] if a file is present; files need a
/// multipart body.
pub fn encode_form(params: &Params) -> Result<String, BuildError> {
    let mut pairs = Vec::new();
    for field in flatten(params) {
        match field {
            FormField::Text { key, value } => {
                pairs.push(format!("{}={}", encode_key(&key), encode_component(&value)));
            }
            FormField::File { key, .. } => {
                return Err(BuildError::InvalidParam(format!(
                    "file parameter '{key}' requires a multipart body"
                )));
            }
        }
    }
    Ok(pairs.join("&"))
}

fn encode_component(s: &str) -> String {
    form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

/// Percent-encodes each key segment but keeps the brackets readable.
fn encode_key(key: &str) -> String {
    let (base, segments) = split_key(key);
    let mut out = encode_component(base);
    for segment in segments {
        out.push('[');
        out.push_str(&encode_component(segment));
        out.push(']');
    }
    out
}

/// Splits `a[b][0]` into `("a", ["b", "0"])`. A key without a well-formed
/// bracket suffix is returned whole.
fn split_key(key: &str) -> (&str, Vec<&str>) {
    let Some(open) = key.find('[') else {
        return (key, Vec::new());
    };
    let (base, mut rest) = key.split_at(open);
    if base.is_empty() {
        return (key, Vec::new());
    }

    let mut segments = Vec::new();
    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(close) = stripped.find(']') else {
            return (key, Vec::new());
        };
        segments.push(&stripped[..close]);
        rest = &stripped[close + 1..];
    }

    if rest.is_empty() {
        (base, segments)
    } else {
        (key, Vec::new())
    }
}

/// Parses a bracket-notation form string back into params.
///
/// Form data is untyped, so every leaf comes back as
/// [`ParamValue::String`]. `[]` and contiguous indices from `[0]` build lists;
/// any other segment builds a map. A list that later meets a key it cannot
/// hold (`[tier]`, or an index past its end) turns into a map keyed by the
/// indices seen so far, so maps with numeric keys such as `metadata[1]`
/// survive a round trip. Keys `0..n` in order are indistinguishable from a
/// list on the wire and decode as one.
///
/// # Errors
///
/// Returns [`BuildError::InvalidParam`] when a key is used both as a scalar
/// and as a container.
pub fn decode_form(input: &str) -> Result<Params, BuildError> {
    let mut params = Params::new();
    for (key, value) in form_urlencoded::parse(input.as_bytes()) {
        let (base, segments) = split_key(&key);
        insert_path(&mut params, base, &segments, value.into_owned())
            .map_err(|reason| BuildError::InvalidParam(format!("{key}: {reason}")))?;
    }
    Ok(params)
}

/// Position `segment` addresses in a list of `len` items: `[]` appends, a
/// canonical index up to `len` reads or appends. `None` means map key.
fn list_position(segment: &str, len: usize) -> Option<usize> {
    if segment.is_empty() {
        return Some(len);
    }
    let canonical = segment.bytes().all(|b| b.is_ascii_digit())
        && (segment == "0" || !segment.starts_with('0'));
    if !canonical {
        return None;
    }
    segment.parse::<usize>().ok().filter(|&index| index <= len)
}

fn container_for(segment: &str) -> ParamValue {
    if list_position(segment, 0).is_some() {
        ParamValue::List(Vec::new())
    } else {
        ParamValue::Map(Params::new())
    }
}

fn index_map(items: Vec<ParamValue>) -> Params {
    let mut params = Params::new();
    for (index, item) in items.into_iter().enumerate() {
        params.push(index.to_string(), item);
    }
    params
}

fn insert_path(
    params: &mut Params,
    key: &str,
    rest: &[&str],
    value: String,
) -> Result<(), &'static str> {
    let Some((next, _)) = rest.split_first() else {
        params.push(key, value);
        return Ok(());
    };
    let slot = params.get_or_insert_with(key, || container_for(next));
    insert_into(slot, rest, value)
}

fn insert_into(slot: &mut ParamValue, path: &[&str], value: String) -> Result<(), &'static str> {
    let Some((segment, rest)) = path.split_first() else {
        return Err("empty key path");
    };

    if let ParamValue::List(items) = slot {
        if list_position(segment, items.len()).is_none() {
            let items = std::mem::take(items);
            *slot = ParamValue::Map(index_map(items));
        }
    }

    match slot {
        ParamValue::Map(params) => insert_path(params, segment, rest, value),
        ParamValue::List(items) => {
            let index = list_position(segment, items.len()).ok_or("list index out of range")?;

            let Some((next, _)) = rest.split_first() else {
                if index == items.len() {
                    items.push(ParamValue::String(value));
                } else {
                    items[index] = ParamValue::String(value);
                }
                return Ok(());
            };

            if index == items.len() {
                items.push(container_for(next));
            }
            insert_into(&mut items[index], rest, value)
        }
        _ => Err("key is used both as a value and as a container"),
    }
}
