//! Title and description extraction per item type.

use crate::board::BoardItem;

/// Titles longer than this are cut.
pub const MAX_TITLE_CHARS: usize = 100;

/// Board item types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemKind {
    StickyNote,
    Text,
    Shape,
    Card,
    AppCard,
    Frame,
    Document,
    MindmapNode,
    Image,
    Embed,
    Connector,
    /// Any type this crate has no dedicated rule for
    Other(String),
}

impl ItemKind {
    /// Parse the API's type string.
    pub fn parse(item_type: &str) -> Self {
        match item_type {
            "sticky_note" => Self::StickyNote,
            "text" => Self::Text,
            "shape" => Self::Shape,
            "card" => Self::Card,
            "app_card" => Self::AppCard,
            "frame" => Self::Frame,
            "document" => Self::Document,
            "mindmap_node" => Self::MindmapNode,
            "image" => Self::Image,
            "embed" => Self::Embed,
            "connector" => Self::Connector,
            other => Self::Other(other.to_string()),
        }
    }

    /// The API's type string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::StickyNote => "sticky_note",
            Self::Text => "text",
            Self::Shape => "shape",
            Self::Card => "card",
            Self::AppCard => "app_card",
            Self::Frame => "frame",
            Self::Document => "document",
            Self::MindmapNode => "mindmap_node",
            Self::Image => "image",
            Self::Embed => "embed",
            Self::Connector => "connector",
            Self::Other(s) => s,
        }
    }

    /// Whether items of this kind are edges rather than steps.
    pub fn is_connector(&self) -> bool {
        matches!(self, Self::Connector)
    }

    /// `data` fields tried in order for the title.
    fn title_fields(&self) -> &'static [&'static str] {
        match self {
            Self::StickyNote | Self::Text | Self::Shape => &["content", "text"],
            Self::Card | Self::AppCard => &["title"],
            Self::Frame | Self::Document => &["title"],
            Self::MindmapNode => &["content"],
            Self::Image => &["title"],
            Self::Embed => &["title", "url"],
            Self::Connector | Self::Other(_) => &["content", "text", "title"],
        }
    }

    /// Whether `data.description` is carried over.
    fn has_description(&self) -> bool {
        matches!(self, Self::Card | Self::AppCard)
    }

    /// Title used when no field yields one.
    fn placeholder(&self, item_type: &str, id: &str) -> String {
        match self {
            Self::Image => format!("Image {}", id),
            _ => format!("{} {}", item_type, id),
        }
    }
}

/// Title and description of an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemContent {
    pub title: String,
    pub description: Option<String>,
}

/// Read a non-empty string field from an item's data.
fn data_str<'a>(item: &'a BoardItem, field: &str) -> Option<&'a str> {
    item.data.get(field).and_then(|v| v.as_str()).filter(|s| !s.is_empty())
}

/// Extract the display title and description of an item.
pub fn extract_content(item: &BoardItem) -> ItemContent {
    let kind = ItemKind::parse(&item.item_type);

    let title = kind
        .title_fields()
        .iter()
        .find_map(|field| data_str(item, field))
        .map(String::from)
        .unwrap_or_else(|| kind.placeholder(&item.item_type, &item.id));

    let description = if kind.has_description() {
        data_str(item, "description").map(String::from)
    } else {
        None
    };

    ItemContent { title: title.chars().take(MAX_TITLE_CHARS).collect(), description }
}
