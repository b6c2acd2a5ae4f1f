use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::kinds::{
    ButtonBlock, DividerBlock, Frontmatter, HtmlBlock, ImageBlock, ListBlock, SpacerBlock,
    TextBlock, TextElement, VideoBlock,
};

/// Stable identifier of a block.
///
/// Assigned once at creation and used as the only reconciliation key for
/// edits, drag state and rendering keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(format!("block-{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Discriminant of a [`BlockBody`], used for kind checks and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Text,
    Image,
    Video,
    Divider,
    Button,
    Spacer,
    List,
    Html,
    Frontmatter,
    Unsupported,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlockKind::Text => "text",
            BlockKind::Image => "image",
            BlockKind::Video => "video",
            BlockKind::Divider => "divider",
            BlockKind::Button => "button",
            BlockKind::Spacer => "spacer",
            BlockKind::List => "list",
            BlockKind::Html => "html",
            BlockKind::Frontmatter => "frontmatter",
            BlockKind::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

/// Type-specific payload of a block.
///
/// On the wire the variant is the `type` field of the block object and the
/// payload fields sit next to it. Types this build does not know about are
/// kept in [`BlockBody::Unsupported`] with their fields untouched, so that a
/// composition written by a newer (or older) client survives a load/save.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockBody {
    Text(TextBlock),
    Image(ImageBlock),
    Video(VideoBlock),
    Divider(DividerBlock),
    Button(ButtonBlock),
    Spacer(SpacerBlock),
    List(ListBlock),
    Html(HtmlBlock),
    Frontmatter(Frontmatter),
    Unsupported {
        type_name: String,
        fields: Map<String, Value>,
    },
}

impl BlockBody {
    pub fn kind(&self) -> BlockKind {
        match self {
            BlockBody::Text(_) => BlockKind::Text,
            BlockBody::Image(_) => BlockKind::Image,
            BlockBody::Video(_) => BlockKind::Video,
            BlockBody::Divider(_) => BlockKind::Divider,
            BlockBody::Button(_) => BlockKind::Button,
            BlockBody::Spacer(_) => BlockKind::Spacer,
            BlockBody::List(_) => BlockKind::List,
            BlockBody::Html(_) => BlockKind::Html,
            BlockBody::Frontmatter(_) => BlockKind::Frontmatter,
            BlockBody::Unsupported { .. } => BlockKind::Unsupported,
        }
    }

    /// The wire name written to the `type` field.
    pub fn type_name(&self) -> &str {
        match self {
            BlockBody::Text(_) => "text",
            BlockBody::Image(_) => "image",
            BlockBody::Video(_) => "video",
            BlockBody::Divider(_) => "divider",
            BlockBody::Button(_) => "button",
            BlockBody::Spacer(_) => "spacer",
            BlockBody::List(_) => "list",
            BlockBody::Html(_) => "html",
            BlockBody::Frontmatter(_) => "frontmatter",
            BlockBody::Unsupported { type_name, .. } => type_name,
        }
    }

    /// Two bodies are the same kind when their variants match. Unsupported
    /// bodies additionally need the same wire type name.
    pub fn same_kind(&self, other: &BlockBody) -> bool {
        match (self, other) {
            (
                BlockBody::Unsupported { type_name: a, .. },
                BlockBody::Unsupported { type_name: b, .. },
            ) => a == b,
            _ => self.kind() == other.kind(),
        }
    }

    /// Build a body from a wire type name and the remaining fields.
    ///
    /// Unknown types, and known types whose fields do not parse (for example
    /// an enum value written by a newer client), are kept as
    /// [`BlockBody::Unsupported`] so they survive a save unchanged.
    pub fn from_parts(type_name: &str, fields: Map<String, Value>) -> Self {
        match Self::parse_known(type_name, &fields) {
            Some(Ok(body)) => return body,
            Some(Err(err)) => {
                log::warn!("Keeping unreadable '{type_name}' block as unsupported: {err}");
            }
            None => log::debug!("Keeping block of unknown type '{type_name}' as unsupported"),
        }
        BlockBody::Unsupported {
            type_name: type_name.to_string(),
            fields,
        }
    }

    fn parse_known(
        type_name: &str,
        fields: &Map<String, Value>,
    ) -> Option<serde_json::Result<Self>> {
        fn parse<T: de::DeserializeOwned>(
            fields: &Map<String, Value>,
            wrap: fn(T) -> BlockBody,
        ) -> Option<serde_json::Result<BlockBody>> {
            Some(serde_json::from_value(Value::Object(fields.clone())).map(wrap))
        }
        match type_name {
            "text" => parse(fields, BlockBody::Text),
            "image" => parse(fields, BlockBody::Image),
            "video" => parse(fields, BlockBody::Video),
            "divider" => parse(fields, BlockBody::Divider),
            "button" => parse(fields, BlockBody::Button),
            "spacer" => parse(fields, BlockBody::Spacer),
            "list" => parse(fields, BlockBody::List),
            "html" => parse(fields, BlockBody::Html),
            "frontmatter" => parse(fields, BlockBody::Frontmatter),
            _ => None,
        }
    }

    fn payload(&self) -> serde_json::Result<Map<String, Value>> {
        let value = match self {
            BlockBody::Text(b) => serde_json::to_value(b)?,
            BlockBody::Image(b) => serde_json::to_value(b)?,
            BlockBody::Video(b) => serde_json::to_value(b)?,
            BlockBody::Divider(b) => serde_json::to_value(b)?,
            BlockBody::Button(b) => serde_json::to_value(b)?,
            BlockBody::Spacer(b) => serde_json::to_value(b)?,
            BlockBody::List(b) => serde_json::to_value(b)?,
            BlockBody::Html(b) => serde_json::to_value(b)?,
            BlockBody::Frontmatter(b) => serde_json::to_value(b)?,
            BlockBody::Unsupported { fields, .. } => return Ok(fields.clone()),
        };
        Ok(match value {
            Value::Object(fields) => fields,
            _ => Map::new(),
        })
    }
}

impl Serialize for BlockBody {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut fields = self.payload().map_err(ser::Error::custom)?;
        fields.insert("type".to_string(), Value::String(self.type_name().to_string()));
        fields.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BlockBody {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Map::<String, Value>::deserialize(deserializer)?;
        let type_name = match fields.remove("type") {
            Some(Value::String(type_name)) => type_name,
            Some(other) => {
                return Err(de::Error::custom(format!(
                    "block type must be a string, found {other}"
                )));
            }
            None => return Err(de::Error::missing_field("type")),
        };
        Ok(BlockBody::from_parts(&type_name, fields))
    }
}

/// One discrete, independently editable unit of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlock {
    pub id: BlockId,
    /// Render position. Dense and equal to the array index after every edit.
    #[serde(default)]
    pub order: usize,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub styles: BTreeMap<String, Value>,
    /// Provenance and debug information, never rendered.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
    /// Reference to a class in the selected stylesheet.
    #[serde(default, alias = "cssClass", skip_serializing_if = "Option::is_none")]
    pub css_class_name: Option<String>,
    #[serde(flatten)]
    pub body: BlockBody,
}

impl ContentBlock {
    /// Create a block with a fresh id. `order` is assigned when the block is
    /// placed in a list.
    pub fn new(body: BlockBody) -> Self {
        Self {
            id: BlockId::generate(),
            order: 0,
            styles: BTreeMap::new(),
            metadata: BTreeMap::new(),
            css_class_name: None,
            body,
        }
    }

    pub fn with_id(mut self, id: impl Into<BlockId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_css_class(mut self, class_name: impl Into<String>) -> Self {
        self.css_class_name = Some(class_name.into());
        self
    }

    pub fn with_style(mut self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.styles.insert(property.into(), value.into());
        self
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(BlockBody::Text(TextBlock::new(content)))
    }

    pub fn heading(level: u8, content: impl Into<String>) -> Self {
        let mut text = TextBlock::new(content);
        text.element = TextElement::heading(level);
        Self::new(BlockBody::Text(text))
    }

    pub fn image(url: impl Into<String>, alt: impl Into<String>) -> Self {
        Self::new(BlockBody::Image(ImageBlock::new(url, alt)))
    }

    pub fn kind(&self) -> BlockKind {
        self.body.kind()
    }
}

impl From<String> for BlockId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
