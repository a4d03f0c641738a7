use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

use crate::error::{json_kind, PageError, PageResult};

/// Identity of a placed component within one page. Stored either as a number
/// or as a string, depending on which editor wrote the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum InstanceId {
    Number(i64),
    Text(String),
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceId::Number(n) => write!(f, "{}", n),
            InstanceId::Text(s) => f.write_str(s),
        }
    }
}

/// One placed component: `{ "id", "type", "props" }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComponentInstance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<InstanceId>,
    #[serde(rename = "type")]
    pub kind: String,
    pub props: Map<String, Value>,
}

impl ComponentInstance {
    pub fn new(id: impl Into<InstanceId>, kind: impl Into<String>, props: Map<String, Value>) -> Self {
        Self {
            id: Some(id.into()),
            kind: kind.into(),
            props,
        }
    }

    /// Decode one stored element. Returns `None` only for non-object values.
    ///
    /// Numbers outside `i64` keep their JSON text; ids that are neither numbers
    /// nor strings are dropped; a missing `type`
    /// becomes the empty string; `props` stored as `null` or `[]` become an
    /// empty mapping.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let id = match map.get("id") {
            Some(Value::Number(n)) => Some(
                n.as_i64()
                    .map_or_else(|| InstanceId::Text(n.to_string()), InstanceId::Number),
            ),
            Some(Value::String(s)) => Some(InstanceId::Text(s.clone())),
            _ => None,
        };
        let kind = map
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let props = match map.get("props") {
            Some(Value::Object(props)) => props.clone(),
            _ => Map::new(),
        };
        Some(Self { id, kind, props })
    }

    /// Key used for rendering: the instance id, or the position when the
    /// stored element has none.
    pub fn render_key(&self, index: usize) -> String {
        match &self.id {
            Some(id) => id.to_string(),
            None => format!("instance-{}", index),
        }
    }
}

impl From<i64> for InstanceId {
    fn from(n: i64) -> Self {
        InstanceId::Number(n)
    }
}

impl From<&str> for InstanceId {
    fn from(s: &str) -> Self {
        InstanceId::Text(s.to_string())
    }
}

impl From<String> for InstanceId {
    fn from(s: String) -> Self {
        InstanceId::Text(s)
    }
}

impl<'de> Deserialize<'de> for ComponentInstance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        ComponentInstance::from_value(&value)
            .ok_or_else(|| serde::de::Error::custom("component instance must be an object"))
    }
}

/// Ordered body of a page. Order is document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageContent {
    pub instances: Vec<ComponentInstance>,
}

impl PageContent {
    pub fn new(instances: Vec<ComponentInstance>) -> Self {
        Self { instances }
    }

    /// Decode the stored `content` of a page.
    ///
    /// `null` and blank strings give an empty page. A string is parsed as JSON
    /// once. An object is read as a legacy index-keyed list, values in stored
    /// order. Elements that are not objects are skipped.
    pub fn normalize(raw: &Value) -> PageResult<Self> {
        let parsed;
        let value = match raw {
            Value::Null => return Ok(Self::default()),
            Value::String(text) if text.trim().is_empty() => return Ok(Self::default()),
            Value::String(text) => {
                parsed = serde_json::from_str::<Value>(text)?;
                &parsed
            }
            other => other,
        };

        let items: Vec<&Value> = match value {
            Value::Null => Vec::new(),
            Value::Array(items) => items.iter().collect(),
            Value::Object(map) => map.values().collect(),
            other => {
                return Err(PageError::ContentNotAnArray {
                    found: json_kind(other),
                })
            }
        };

        let mut instances = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match ComponentInstance::from_value(item) {
                Some(instance) => instances.push(instance),
                None => tracing::warn!(
                    index,
                    found = %json_kind(item),
                    "skipping page content entry that is not a component"
                ),
            }
        }
        Ok(Self { instances })
    }

    pub fn from_json(json: &str) -> PageResult<Self> {
        Self::normalize(&Value::String(json.to_string()))
    }

    /// Instance ids must be unique within a page.
    pub fn validate(&self) -> PageResult<()> {
        let mut seen = HashSet::new();
        for id in self.instances.iter().filter_map(|i| i.id.as_ref()) {
            if !seen.insert(id) {
                return Err(PageError::DuplicateId { id: id.to_string() });
            }
        }
        Ok(())
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Array(Vec::new()))
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ComponentInstance> {
        self.instances.iter()
    }
}

impl<'a> IntoIterator for &'a PageContent {
    type Item = &'a ComponentInstance;
    type IntoIter = std::slice::Iter<'a, ComponentInstance>;

    fn into_iter(self) -> Self::IntoIter {
        self.instances.iter()
    }
}
