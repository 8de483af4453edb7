//! Paginated list envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::shape::{check_object_tag, decode_entity, json_type, Entity, ShapeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Chronological,
    ReverseChronological,
    #[serde(other)]
    Unknown,
}

/// An ordered page of entities of one type.
#[derive(Debug, Clone, PartialEq)]
pub struct List<T> {
    pub location: Option<String>,
    pub data: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub order: Option<SortOrder>,
}

impl<T> List<T> {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Offset just past this page, saturating at `u64::MAX`.
    fn end(&self) -> u64 {
        self.offset.saturating_add(self.data.len() as u64)
    }

    /// Whether entries remain past this page.
    pub fn has_more(&self) -> bool {
        self.end() < self.total
    }

    /// Parameters for the following page, keeping this page's window and
    /// ordering. `None` on the last page.
    pub fn next_page(&self) -> Option<ListParams> {
        if !self.has_more() {
            return None;
        }
        Some(ListParams {
            offset: Some(self.end()),
            limit: Some(self.limit),
            from: self.from,
            to: self.to,
            order: self.order.filter(|o| *o != SortOrder::Unknown),
        })
    }
}

impl<T> IntoIterator for List<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a List<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

/// Pagination fields of the envelope; `data` is decoded separately.
#[derive(Deserialize)]
struct Envelope {
    location: Option<String>,
    total: u64,
    offset: u64,
    limit: u64,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    order: Option<SortOrder>,
}

/// Decode a list envelope. Any item that does not decode as `T` fails the
/// whole list.
pub(crate) fn decode_list<T: Entity>(value: Value) -> Result<List<T>, ShapeError> {
    let mut map = match value {
        Value::Object(map) => map,
        other => return Err(ShapeError::NotAnObject(json_type(&other))),
    };
    check_object_tag(&map, "list")?;
    let items = match map.remove("data") {
        Some(Value::Array(items)) => items,
        _ => return Err(ShapeError::MissingData),
    };
    let envelope: Envelope = serde_json::from_value(Value::Object(map))?;

    let data = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            decode_entity(item).map_err(|source| ShapeError::Item {
                index,
                source: Box::new(source),
            })
        })
        .collect::<Result<Vec<T>, _>>()?;

    Ok(List {
        location: envelope.location,
        data,
        total: envelope.total,
        offset: envelope.offset,
        limit: envelope.limit,
        from: envelope.from,
        to: envelope.to,
        order: envelope.order,
    })
}

// Lets entities embed lists (a customer's cards) with the same strictness.
impl<'de, T: Entity> Deserialize<'de> for List<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        decode_list(value).map_err(serde::de::Error::custom)
    }
}

/// Window and ordering for list operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn since(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    pub fn until(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = Some(order);
        self
    }
}
