//! Target shape descriptors.
//!
//! A resource operation picks `Single<T>` or `ListOf<T>` at the call site;
//! the response mapper only asks the descriptor to decode a parsed JSON
//! value. The descriptors are zero-sized and carry no state.

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::list::{decode_list, List};

/// A resource type returned by the API.
///
/// `OBJECT` is the value of the JSON `object` tag. A response whose tag
/// names a different object is rejected instead of being coerced.
pub trait Entity: DeserializeOwned {
    const OBJECT: &'static str;
}

/// Why a JSON value did not fit the requested shape.
#[derive(Debug, Error)]
pub enum ShapeError {
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("expected object `{expected}`, got `{found}`")]
    ObjectMismatch { expected: &'static str, found: String },

    #[error("list envelope has no `data` array")]
    MissingData,

    #[error("data[{index}]: {source}")]
    Item {
        index: usize,
        source: Box<ShapeError>,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Entity,
    List,
}

/// What a successful response should decode into.
pub trait TargetShape {
    type Output;

    fn kind(&self) -> ShapeKind;

    fn decode(&self, value: Value) -> Result<Self::Output, ShapeError>;
}

/// Decode the response as a single `T`.
pub struct Single<T>(PhantomData<fn() -> T>);

/// Decode the response as a `List<T>` envelope.
pub struct ListOf<T>(PhantomData<fn() -> T>);

impl<T> Single<T> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> ListOf<T> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: Entity> TargetShape for Single<T> {
    type Output = T;

    fn kind(&self) -> ShapeKind {
        ShapeKind::Entity
    }

    fn decode(&self, value: Value) -> Result<T, ShapeError> {
        decode_entity(value)
    }
}

impl<T: Entity> TargetShape for ListOf<T> {
    type Output = List<T>;

    fn kind(&self) -> ShapeKind {
        ShapeKind::List
    }

    fn decode(&self, value: Value) -> Result<List<T>, ShapeError> {
        decode_list(value)
    }
}

pub fn decode_entity<T: Entity>(value: Value) -> Result<T, ShapeError> {
    match &value {
        Value::Object(map) => check_object_tag(map, T::OBJECT)?,
        other => return Err(ShapeError::NotAnObject(json_type(other))),
    }
    Ok(serde_json::from_value(value)?)
}

pub(crate) fn check_object_tag(map: &Map<String, Value>, expected: &'static str) -> Result<(), ShapeError> {
    match map.get("object") {
        None | Some(Value::Null) => Ok(()),
        Some(Value::String(found)) if found == expected => Ok(()),
        Some(Value::String(found)) => Err(ShapeError::ObjectMismatch {
            expected,
            found: found.clone(),
        }),
        Some(other) => Err(ShapeError::ObjectMismatch {
            expected,
            found: json_type(other).to_string(),
        }),
    }
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// Manual impls so the descriptors stay `Copy`/`Default` whatever `T` is.

impl<T> Default for Single<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Single<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Single<T> {}

impl<T> fmt::Debug for Single<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Single<{}>", type_name::<T>())
    }
}

impl<T> Default for ListOf<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ListOf<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ListOf<T> {}

impl<T> fmt::Debug for ListOf<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListOf<{}>", type_name::<T>())
    }
}
