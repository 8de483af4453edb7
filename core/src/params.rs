//! Ordered request parameters and their bracketed form encoding.
//!
//! Nested maps flatten to `card[name]=value`, lists of scalars to
//! `tags[]=a&tags[]=b`. Key segments and values are percent-encoded; the
//! brackets themselves stay literal. The same encoding is used for GET query
//! strings and for form bodies.

use std::borrow::Cow;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

/// Parameters that cannot be put on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("parameter keys must not be empty")]
    EmptyKey,

    #[error("parameters must serialize to an object, got {0}")]
    NotAnObject(&'static str),

    #[error("`{0}` nests a list or map inside a list")]
    NestedList(String),

    #[error("`{0}` is not a finite number")]
    NonFinite(String),

    #[error("could not serialize parameters: {0}")]
    Serialize(String),

    #[error("malformed form pair `{0}`")]
    MalformedPair(String),

    #[error("`{0}` is used with conflicting shapes")]
    Conflict(String),
}

/// A single parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// A list of scalars.
    List(Vec<ParamValue>),
    Map(Params),
}

impl ParamValue {
    fn is_scalar(&self) -> bool {
        !matches!(self, ParamValue::List(_) | ParamValue::Map(_))
    }

    fn scalar_string(&self, key: &str) -> Result<Cow<'_, str>, EncodingError> {
        match self {
            ParamValue::Str(s) => Ok(Cow::Borrowed(s)),
            ParamValue::Int(i) => Ok(Cow::Owned(i.to_string())),
            ParamValue::Bool(b) => Ok(Cow::Borrowed(if *b { "true" } else { "false" })),
            ParamValue::Float(f) if f.is_finite() => Ok(Cow::Owned(f.to_string())),
            ParamValue::Float(_) => Err(EncodingError::NonFinite(key.to_string())),
            ParamValue::List(_) | ParamValue::Map(_) => {
                Err(EncodingError::NestedList(key.to_string()))
            }
        }
    }
}

/// An ordered mapping of parameter names to values.
///
/// Insertion order is kept and is the order used on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, ParamValue)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Params::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Set `key`, replacing an existing value in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merge `other` into `self`; keys present in both take `other`'s value.
    pub fn merge(&mut self, other: Params) {
        for (key, value) in other.entries {
            self.set(key, value);
        }
    }

    /// Convert any serializable value (a parameter struct, a map, a
    /// `serde_json::Value` or `Params` itself) into `Params`.
    ///
    /// `null` members are dropped so unset optional fields never reach the
    /// wire.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, EncodingError> {
        let value =
            serde_json::to_value(value).map_err(|e| EncodingError::Serialize(e.to_string()))?;
        Self::from_json(value)
    }

    pub fn from_json(value: Value) -> Result<Self, EncodingError> {
        match value {
            Value::Object(map) => Self::from_map(map, None),
            Value::Null => Ok(Self::new()),
            Value::Bool(_) => Err(EncodingError::NotAnObject("a boolean")),
            Value::Number(_) => Err(EncodingError::NotAnObject("a number")),
            Value::String(_) => Err(EncodingError::NotAnObject("a string")),
            Value::Array(_) => Err(EncodingError::NotAnObject("an array")),
        }
    }

    fn from_map(map: Map<String, Value>, parent: Option<&str>) -> Result<Self, EncodingError> {
        let mut params = Params::new();
        for (key, value) in map {
            let path = match parent {
                Some(parent) => format!("{parent}[{key}]"),
                None => key.clone(),
            };
            if let Some(value) = convert(value, &path)? {
                params.entries.push((key, value));
            }
        }
        Ok(params)
    }

    /// Encode as `application/x-www-form-urlencoded` with bracketed keys.
    ///
    /// An empty list or map encodes as an empty value (`key=`).
    pub fn encode(&self) -> Result<String, EncodingError> {
        let mut pairs = Vec::new();
        for (key, value) in &self.entries {
            if key.is_empty() {
                return Err(EncodingError::EmptyKey);
            }
            push_pairs(&mut pairs, urlencoding::encode(key).into_owned(), value)?;
        }
        Ok(pairs.join("&"))
    }

    /// Parse a query string or form body produced by [`Params::encode`].
    ///
    /// Every value comes back as `ParamValue::Str`. `+` is read as a space.
    pub fn decode(input: &str) -> Result<Self, EncodingError> {
        let mut params = Params::new();
        for pair in input.split('&').filter(|p| !p.is_empty()) {
            let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
            let (base, segments) =
                split_key(raw_key).ok_or_else(|| EncodingError::MalformedPair(pair.to_string()))?;
            let base = unescape(base, pair)?;
            let segments = segments
                .into_iter()
                .map(|s| unescape(s, pair))
                .collect::<Result<Vec<_>, _>>()?;
            let value = unescape(raw_value, pair)?;
            params.insert_path(base, &segments, value, pair)?;
        }
        Ok(params)
    }

    fn insert_path(
        &mut self,
        key: String,
        segments: &[String],
        value: String,
        pair: &str,
    ) -> Result<(), EncodingError> {
        let Some((first, rest)) = segments.split_first() else {
            if self.get(&key).is_some() {
                return Err(EncodingError::Conflict(key));
            }
            self.entries.push((key, ParamValue::Str(value)));
            return Ok(());
        };

        if first.is_empty() {
            if !rest.is_empty() {
                return Err(EncodingError::MalformedPair(pair.to_string()));
            }
            match self.entry(key.clone(), || ParamValue::List(Vec::new())) {
                ParamValue::List(items) => {
                    items.push(ParamValue::Str(value));
                    Ok(())
                }
                _ => Err(EncodingError::Conflict(key)),
            }
        } else {
            match self.entry(key.clone(), || ParamValue::Map(Params::new())) {
                ParamValue::Map(inner) => inner.insert_path(first.clone(), rest, value, pair),
                _ => Err(EncodingError::Conflict(key)),
            }
        }
    }

    fn entry(&mut self, key: String, default: impl FnOnce() -> ParamValue) -> &mut ParamValue {
        let index = match self.entries.iter().position(|(k, _)| *k == key) {
            Some(index) => index,
            None => {
                self.entries.push((key, default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].1
    }
}

fn convert(value: Value, path: &str) -> Result<Option<ParamValue>, EncodingError> {
    let value = match value {
        Value::Null => return Ok(None),
        Value::Bool(b) => ParamValue::Bool(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                ParamValue::Int(i)
            } else if n.is_u64() {
                ParamValue::Str(n.to_string())
            } else {
                ParamValue::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => ParamValue::Str(s),
        Value::Array(items) => {
            let mut list = Vec::with_capacity(items.len());
            for item in items {
                match convert(item, path)? {
                    Some(item) if item.is_scalar() => list.push(item),
                    Some(_) => return Err(EncodingError::NestedList(path.to_string())),
                    None => {}
                }
            }
            ParamValue::List(list)
        }
        Value::Object(map) => ParamValue::Map(Params::from_map(map, Some(path))?),
    };
    Ok(Some(value))
}

fn push_pairs(
    pairs: &mut Vec<String>,
    prefix: String,
    value: &ParamValue,
) -> Result<(), EncodingError> {
    match value {
        ParamValue::List(items) if items.is_empty() => pairs.push(format!("{prefix}=")),
        ParamValue::List(items) => {
            for item in items {
                let item = item.scalar_string(&prefix)?;
                pairs.push(format!("{prefix}[]={}", urlencoding::encode(&item)));
            }
        }
        ParamValue::Map(map) if map.is_empty() => pairs.push(format!("{prefix}=")),
        ParamValue::Map(map) => {
            for (key, value) in &map.entries {
                if key.is_empty() {
                    return Err(EncodingError::EmptyKey);
                }
                push_pairs(pairs, format!("{prefix}[{}]", urlencoding::encode(key)), value)?;
            }
        }
        scalar => {
            let text = scalar.scalar_string(&prefix)?;
            pairs.push(format!("{prefix}={}", urlencoding::encode(&text)));
        }
    }
    Ok(())
}

/// Split `card[address][city]` into `card` and `["address", "city"]`.
fn split_key(raw: &str) -> Option<(&str, Vec<&str>)> {
    let (base, mut rest) = match raw.find('[') {
        Some(index) => (&raw[..index], &raw[index..]),
        None => (raw, ""),
    };
    if base.is_empty() {
        return None;
    }
    let mut segments = Vec::new();
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[')?;
        let close = inner.find(']')?;
        segments.push(&inner[..close]);
        rest = &inner[close + 1..];
    }
    Some((base, segments))
}

fn unescape(raw: &str, pair: &str) -> Result<String, EncodingError> {
    urlencoding::decode(&raw.replace('+', " "))
        .map(Cow::into_owned)
        .map_err(|_| EncodingError::MalformedPair(pair.to_string()))
}

impl Serialize for Params {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ParamValue::Str(s) => serializer.serialize_str(s),
            ParamValue::Int(i) => serializer.serialize_i64(*i),
            ParamValue::Float(f) => serializer.serialize_f64(*f),
            ParamValue::Bool(b) => serializer.serialize_bool(*b),
            ParamValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            ParamValue::Map(params) => params.serialize(serializer),
        }
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (key, value) in iter {
            params.set(key, value);
        }
        params
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        ParamValue::Str(value.clone())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(value) => ParamValue::Int(value),
            Err(_) => ParamValue::Str(value.to_string()),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<Params> for ParamValue {
    fn from(value: Params) -> Self {
        ParamValue::Map(value)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(values: Vec<T>) -> Self {
        ParamValue::List(values.into_iter().map(Into::into).collect())
    }
}
