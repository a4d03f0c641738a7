use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Value};

use crate::error::{json_kind, PageError, PageResult};

/// Name of the free-form class field every component schema carries.
pub const EXTRA_CLASSES_FIELD: &str = "extraClasses";

/// Canonical `{ "properties": { ... } }` shape of a component's editable schema.
///
/// Property definitions are kept as raw JSON so that keys this crate does not
/// model, and property kinds it does not know, survive a decode/encode cycle
/// untouched. Top-level keys other than `properties` are carried in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentSchema {
    pub properties: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ComponentSchema {
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Typed view of one property definition.
    pub fn property_spec(&self, name: &str) -> Option<PropertySpec> {
        self.properties.get(name).map(PropertySpec::from_value)
    }

    /// Canonical JSON form, `properties` first.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert(
            "properties".to_string(),
            Value::Object(self.properties.clone()),
        );
        for (key, value) in &self.extra {
            map.insert(key.clone(), value.clone());
        }
        Value::Object(map)
    }
}

/// What [`normalize_schema`] did to the `extraClasses` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaChange {
    /// The standard field was missing and has been added.
    AddedExtraClasses,
    /// The schema already defines `extraClasses`; its definition was left alone.
    AlreadyPresent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSchema {
    pub schema: ComponentSchema,
    pub change: SchemaChange,
}

/// The definition injected for components that lack an `extraClasses` field.
pub fn extra_classes_property() -> Value {
    json!({
        "type": "text",
        "label": "Tailwind Classes",
        "default": null,
        "description": "Additional Tailwind CSS classes to apply to the component"
    })
}

/// Decode a stored schema value into its canonical shape.
///
/// Accepted inputs, tried in order:
/// - a JSON string, which is parsed once;
/// - an object, or an array (keys become the element indices);
/// - a non-empty mapping without a `properties` key, which is taken to be the
///   properties themselves (rows written before the wrapper existed).
///
/// An empty mapping has no recognisable structure and is rejected with
/// [`PageError::MissingProperties`].
pub fn decode_schema(raw: &Value) -> PageResult<ComponentSchema> {
    let parsed;
    let value = match raw {
        Value::String(text) => {
            parsed = serde_json::from_str::<Value>(text)?;
            &parsed
        }
        other => other,
    };

    let map = as_mapping(value)?;

    let Some(properties) = map.get("properties") else {
        if map.is_empty() {
            return Err(PageError::MissingProperties);
        }
        return Ok(ComponentSchema {
            properties: map,
            extra: Map::new(),
        });
    };

    let properties = properties_mapping(properties)?;
    let extra = map
        .into_iter()
        .filter(|(key, _)| key != "properties")
        .collect();

    Ok(ComponentSchema { properties, extra })
}

/// Decode a stored schema and make sure it defines `extraClasses`.
///
/// An existing `extraClasses` definition is never overwritten.
pub fn normalize_schema(raw: &Value) -> PageResult<NormalizedSchema> {
    let mut schema = decode_schema(raw)?;

    let change = if schema.has_property(EXTRA_CLASSES_FIELD) {
        SchemaChange::AlreadyPresent
    } else {
        schema
            .properties
            .insert(EXTRA_CLASSES_FIELD.to_string(), extra_classes_property());
        SchemaChange::AddedExtraClasses
    };

    Ok(NormalizedSchema { schema, change })
}

fn as_mapping(value: &Value) -> PageResult<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map.clone()),
        Value::Array(items) => Ok(items
            .iter()
            .enumerate()
            .map(|(index, item)| (index.to_string(), item.clone()))
            .collect()),
        other => Err(PageError::SchemaNotAMapping {
            found: json_kind(other),
        }),
    }
}

fn properties_mapping(value: &Value) -> PageResult<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map.clone()),
        // An empty list is how an empty mapping round-trips through some stores.
        Value::Array(items) if items.is_empty() => Ok(Map::new()),
        other => Err(PageError::InvalidProperties {
            found: json_kind(other),
        }),
    }
}

// ─── Property definitions ───────────────────────────────────────────────────

/// Kind of an editable property. Unknown kinds are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PropertyKind {
    #[default]
    Text,
    Textarea,
    Color,
    Boolean,
    Select,
    Number,
    Image,
    Url,
    Other(String),
}

impl PropertyKind {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "text" => PropertyKind::Text,
            "textarea" => PropertyKind::Textarea,
            "color" => PropertyKind::Color,
            "boolean" => PropertyKind::Boolean,
            "select" => PropertyKind::Select,
            "number" => PropertyKind::Number,
            "image" => PropertyKind::Image,
            "url" => PropertyKind::Url,
            other => PropertyKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PropertyKind::Text => "text",
            PropertyKind::Textarea => "textarea",
            PropertyKind::Color => "color",
            PropertyKind::Boolean => "boolean",
            PropertyKind::Select => "select",
            PropertyKind::Number => "number",
            PropertyKind::Image => "image",
            PropertyKind::Url => "url",
            PropertyKind::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, PropertyKind::Other(_))
    }

    /// Widget the schema editor uses for this kind.
    pub fn widget(&self) -> EditorWidget {
        match self {
            PropertyKind::Textarea => EditorWidget::TextArea,
            PropertyKind::Color => EditorWidget::ColorPicker,
            PropertyKind::Boolean => EditorWidget::Toggle,
            PropertyKind::Select => EditorWidget::Dropdown,
            PropertyKind::Number => EditorWidget::NumberInput,
            PropertyKind::Image => EditorWidget::MediaPicker,
            PropertyKind::Url => EditorWidget::UrlInput,
            PropertyKind::Text | PropertyKind::Other(_) => EditorWidget::TextInput,
        }
    }
}

impl Serialize for PropertyKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Typed view of one entry of `schema.properties`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PropertySpec {
    #[serde(rename = "type")]
    pub kind: PropertyKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub default: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<Value>>,
}

impl PropertySpec {
    /// Read a property definition, tolerating missing or mistyped keys.
    pub fn from_value(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return PropertySpec::default();
        };
        PropertySpec {
            kind: map
                .get("type")
                .and_then(Value::as_str)
                .map(PropertyKind::parse)
                .unwrap_or_default(),
            label: map.get("label").and_then(Value::as_str).map(str::to_string),
            default: map.get("default").cloned().unwrap_or(Value::Null),
            description: map
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            options: map.get("options").and_then(Value::as_array).cloned(),
        }
    }
}

// ─── Editor fields ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorWidget {
    TextInput,
    TextArea,
    ColorPicker,
    Toggle,
    Dropdown,
    NumberInput,
    MediaPicker,
    UrlInput,
}

/// One editable field as presented by the schema editor.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorField {
    pub name: String,
    pub label: String,
    pub kind: PropertyKind,
    pub widget: EditorWidget,
    pub default: Value,
    pub description: Option<String>,
    pub options: Vec<Value>,
}

/// Editable fields of a schema, in schema order.
pub fn editor_fields(schema: &ComponentSchema) -> Vec<EditorField> {
    schema
        .properties
        .iter()
        .map(|(name, value)| {
            let spec = PropertySpec::from_value(value);
            EditorField {
                name: name.clone(),
                label: spec.label.unwrap_or_else(|| name.clone()),
                widget: spec.kind.widget(),
                kind: spec.kind,
                default: spec.default,
                description: spec.description,
                options: spec.options.unwrap_or_default(),
            }
        })
        .collect()
}
