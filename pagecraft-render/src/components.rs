use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::content::ComponentInstance;
use crate::dynamic::DynamicAi;
use crate::error::{PageError, PageResult};
use crate::media::MediaRef;

/// Built-in component kinds. Lookup is an exact match on the stored `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Heading,
    Text,
    Button,
    Image,
    Divider,
    Spacer,
    Hero,
    Features,
    Testimonials,
    CallToAction,
    Pricing,
    ProductGrid,
    DynamicAi,
}

impl BlockKind {
    pub const ALL: [BlockKind; 13] = [
        BlockKind::Heading,
        BlockKind::Text,
        BlockKind::Button,
        BlockKind::Image,
        BlockKind::Divider,
        BlockKind::Spacer,
        BlockKind::Hero,
        BlockKind::Features,
        BlockKind::Testimonials,
        BlockKind::CallToAction,
        BlockKind::Pricing,
        BlockKind::ProductGrid,
        BlockKind::DynamicAi,
    ];

    pub fn from_key(key: &str) -> Option<Self> {
        BlockKind::ALL.into_iter().find(|k| k.key() == key)
    }

    pub fn key(self) -> &'static str {
        match self {
            BlockKind::Heading => "heading",
            BlockKind::Text => "text",
            BlockKind::Button => "button",
            BlockKind::Image => "image",
            BlockKind::Divider => "divider",
            BlockKind::Spacer => "spacer",
            BlockKind::Hero => "hero",
            BlockKind::Features => "features",
            BlockKind::Testimonials => "testimonials",
            BlockKind::CallToAction => "cta",
            BlockKind::Pricing => "pricing",
            BlockKind::ProductGrid => "product-grid",
            BlockKind::DynamicAi => "dynamic-ai",
        }
    }
}

/// A component instance resolved to its typed props.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading(Heading),
    Text(Text),
    Button(Button),
    Image(Image),
    Divider(Divider),
    Spacer(Spacer),
    Hero(Hero),
    Features(Features),
    Testimonials(Testimonials),
    CallToAction(CallToAction),
    Pricing(Pricing),
    ProductGrid(ProductGrid),
    DynamicAi(DynamicAi),
    /// A `type` with no renderer; carries the literal type string.
    Unknown(String),
}

impl Block {
    /// Resolve an instance's `type` and decode its props.
    ///
    /// Unknown types are not an error. Props that do not fit the kind's shape
    /// return [`PageError::InvalidProps`].
    pub fn from_instance(instance: &ComponentInstance) -> PageResult<Block> {
        let Some(kind) = BlockKind::from_key(&instance.kind) else {
            return Ok(Block::Unknown(instance.kind.clone()));
        };
        let props = Value::Object(instance.props.clone());
        let block = match kind {
            BlockKind::Heading => Block::Heading(decode(kind, props)?),
            BlockKind::Text => Block::Text(decode(kind, props)?),
            BlockKind::Button => Block::Button(decode(kind, props)?),
            BlockKind::Image => Block::Image(decode(kind, props)?),
            BlockKind::Divider => Block::Divider(decode(kind, props)?),
            BlockKind::Spacer => Block::Spacer(decode(kind, props)?),
            BlockKind::Hero => Block::Hero(decode(kind, props)?),
            BlockKind::Features => Block::Features(decode(kind, props)?),
            BlockKind::Testimonials => Block::Testimonials(decode(kind, props)?),
            BlockKind::CallToAction => Block::CallToAction(decode(kind, props)?),
            BlockKind::Pricing => Block::Pricing(decode(kind, props)?),
            BlockKind::ProductGrid => Block::ProductGrid(decode(kind, props)?),
            BlockKind::DynamicAi => Block::DynamicAi(decode(kind, props)?),
        };
        Ok(block)
    }

    pub fn kind(&self) -> Option<BlockKind> {
        Some(match self {
            Block::Heading(_) => BlockKind::Heading,
            Block::Text(_) => BlockKind::Text,
            Block::Button(_) => BlockKind::Button,
            Block::Image(_) => BlockKind::Image,
            Block::Divider(_) => BlockKind::Divider,
            Block::Spacer(_) => BlockKind::Spacer,
            Block::Hero(_) => BlockKind::Hero,
            Block::Features(_) => BlockKind::Features,
            Block::Testimonials(_) => BlockKind::Testimonials,
            Block::CallToAction(_) => BlockKind::CallToAction,
            Block::Pricing(_) => BlockKind::Pricing,
            Block::ProductGrid(_) => BlockKind::ProductGrid,
            Block::DynamicAi(_) => BlockKind::DynamicAi,
            Block::Unknown(_) => return None,
        })
    }

    pub fn extra_classes(&self) -> Option<&str> {
        match self {
            Block::Heading(x) => x.extra_classes.as_deref(),
            Block::Text(x) => x.extra_classes.as_deref(),
            Block::Button(x) => x.extra_classes.as_deref(),
            Block::Image(x) => x.extra_classes.as_deref(),
            Block::Divider(x) => x.extra_classes.as_deref(),
            Block::Spacer(x) => x.extra_classes.as_deref(),
            Block::Hero(x) => x.extra_classes.as_deref(),
            Block::Features(x) => x.extra_classes.as_deref(),
            Block::Testimonials(x) => x.extra_classes.as_deref(),
            Block::CallToAction(x) => x.extra_classes.as_deref(),
            Block::Pricing(x) => x.extra_classes.as_deref(),
            Block::ProductGrid(x) => x.extra_classes.as_deref(),
            Block::DynamicAi(_) | Block::Unknown(_) => None,
        }
    }
}

fn decode<T: DeserializeOwned>(kind: BlockKind, props: Value) -> PageResult<T> {
    serde_json::from_value(props).map_err(|e| PageError::InvalidProps {
        kind: kind.key().to_string(),
        reason: e.to_string(),
    })
}

// ─── Shared prop types ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn as_css(self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

/// Heading level, stored as `2`, `"2"` or `"h2"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    pub fn new(level: u8) -> Option<Self> {
        (1..=6).contains(&level).then_some(Self(level))
    }

    pub fn tag(self) -> &'static str {
        match self.0 {
            1 => "h1",
            2 => "h2",
            3 => "h3",
            4 => "h4",
            5 => "h5",
            _ => "h6",
        }
    }
}

impl Default for HeadingLevel {
    fn default() -> Self {
        Self(2)
    }
}

impl<'de> Deserialize<'de> for HeadingLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let level = match &value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim_start_matches(['h', 'H']).parse::<u64>().ok(),
            Value::Null => return Ok(HeadingLevel::default()),
            _ => None,
        };
        level
            .and_then(|l| u8::try_from(l).ok())
            .and_then(HeadingLevel::new)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid heading level {}", value)))
    }
}

/// Accepts `12`, `"12"` or `null`.
fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid number {}", value))),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid number {}", value))),
        _ => Err(serde::de::Error::custom(format!("invalid number {}", value))),
    }
}

/// Treats `null` and `""` as absent.
fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        other => serde_json::from_value(other)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Accepts booleans, `"true"`/`"false"`, `1`/`0` and `null`.
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(n.as_i64().unwrap_or(0) != 0),
        Value::String(s) => match s.as_str() {
            "true" | "1" | "on" => Ok(true),
            "false" | "0" | "off" | "" => Ok(false),
            _ => Err(serde::de::Error::custom(format!("invalid boolean {}", value))),
        },
        _ => Err(serde::de::Error::custom(format!("invalid boolean {}", value))),
    }
}

// ─── Basic blocks ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Heading {
    pub text: String,
    pub level: HeadingLevel,
    #[serde(deserialize_with = "blank_as_none")]
    pub align: Option<TextAlign>,
    pub extra_classes: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextFormat {
    #[default]
    Plain,
    Markdown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Text {
    pub content: String,
    pub format: TextFormat,
    #[serde(deserialize_with = "blank_as_none")]
    pub align: Option<TextAlign>,
    pub extra_classes: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonVariant {
    #[default]
    Primary,
    Secondary,
    Outline,
    Link,
}

impl ButtonVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            ButtonVariant::Primary => "primary",
            ButtonVariant::Secondary => "secondary",
            ButtonVariant::Outline => "outline",
            ButtonVariant::Link => "link",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Button {
    pub text: String,
    pub url: Option<String>,
    pub variant: ButtonVariant,
    #[serde(deserialize_with = "lenient_bool")]
    pub new_tab: bool,
    pub extra_classes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Image {
    pub src: Option<MediaRef>,
    pub alt: String,
    pub caption: Option<String>,
    #[serde(deserialize_with = "lenient_u32")]
    pub width: Option<u32>,
    #[serde(deserialize_with = "lenient_u32")]
    pub height: Option<u32>,
    pub extra_classes: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DividerStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Divider {
    pub style: DividerStyle,
    pub extra_classes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Spacer {
    #[serde(deserialize_with = "lenient_u32")]
    pub height: Option<u32>,
    pub extra_classes: Option<String>,
}

// ─── Marketing blocks ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Hero {
    pub title: String,
    pub subtitle: Option<String>,
    pub background_image: Option<MediaRef>,
    pub button_text: Option<String>,
    pub button_url: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    pub align: Option<TextAlign>,
    pub extra_classes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureItem {
    pub title: String,
    pub description: String,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Features {
    pub title: Option<String>,
    pub items: Vec<FeatureItem>,
    #[serde(deserialize_with = "lenient_u32")]
    pub columns: Option<u32>,
    pub extra_classes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Testimonial {
    pub quote: String,
    pub author: String,
    pub role: Option<String>,
    pub avatar: Option<MediaRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Testimonials {
    pub title: Option<String>,
    pub items: Vec<Testimonial>,
    pub extra_classes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallToAction {
    pub title: String,
    pub text: Option<String>,
    pub button_text: Option<String>,
    pub button_url: Option<String>,
    pub extra_classes: Option<String>,
}

// ─── Commerce blocks ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PricingPlan {
    pub name: String,
    /// Number or preformatted string.
    pub price: Value,
    pub period: Option<String>,
    pub features: Vec<String>,
    pub button_text: Option<String>,
    pub button_url: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub highlighted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pricing {
    pub title: Option<String>,
    pub plans: Vec<PricingPlan>,
    pub extra_classes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Product {
    pub name: String,
    pub price: Value,
    pub image: Option<MediaRef>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductGrid {
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient_u32")]
    pub columns: Option<u32>,
    #[serde(deserialize_with = "lenient_u32")]
    pub limit: Option<u32>,
    /// Inline products; when absent the grid reads `products` from page data.
    pub products: Option<Vec<Product>>,
    pub extra_classes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn instance(kind: &str, props: Value) -> ComponentInstance {
        let props = match props {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        ComponentInstance::new(1, kind, props)
    }

    #[test]
    fn every_kind_round_trips_its_key() {
        for kind in BlockKind::ALL {
            assert_eq!(BlockKind::from_key(kind.key()), Some(kind));
        }
        assert_eq!(BlockKind::from_key("Heading"), None);
    }

    #[test]
    fn unknown_type_is_not_an_error() {
        let block = Block::from_instance(&instance("carousel", json!({}))).unwrap();
        assert_eq!(block, Block::Unknown("carousel".into()));
        assert_eq!(block.kind(), None);
    }

    #[test]
    fn heading_level_accepts_stored_shapes() {
        for raw in [json!(3), json!("3"), json!("h3")] {
            let block = Block::from_instance(&instance("heading", json!({ "text": "x", "level": raw }))).unwrap();
            let Block::Heading(h) = block else { panic!("expected heading") };
            assert_eq!(h.level.tag(), "h3");
        }
    }

    #[test]
    fn heading_level_out_of_range_is_invalid() {
        let err = Block::from_instance(&instance("heading", json!({ "level": 9 }))).unwrap_err();
        assert!(matches!(err, PageError::InvalidProps { ref kind, .. } if kind == "heading"));
    }

    #[test]
    fn missing_props_use_defaults() {
        let Block::Button(b) = Block::from_instance(&instance("button", json!({}))).unwrap() else {
            panic!("expected button")
        };
        assert_eq!(b.variant, ButtonVariant::Primary);
        assert!(!b.new_tab);
    }

    #[test]
    fn form_style_values_are_accepted() {
        let Block::Image(img) = Block::from_instance(&instance(
            "image",
            json!({ "src": 12, "width": "640", "height": "", "extraClasses": "rounded" }),
        ))
        .unwrap() else {
            panic!("expected image")
        };
        assert_eq!(img.src, Some(MediaRef::Id(12)));
        assert_eq!(img.width, Some(640));
        assert_eq!(img.height, None);
        assert_eq!(img.extra_classes.as_deref(), Some("rounded"));
    }

    #[test]
    fn extra_classes_are_exposed() {
        let block = Block::from_instance(&instance(
            "cta",
            json!({ "title": "Go", "extraClasses": "p-[12]" }),
        ))
        .unwrap();
        assert_eq!(block.extra_classes(), Some("p-[12]"));
    }
}
