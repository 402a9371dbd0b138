//! # Pagekit Markup
//!
//! Converts between raw HTML and the page tree of `pagekit-document`.
//!
//! Two codecs share one forgiving parser and one top-level walk:
//!
//! - [`Codec::Semantic`] classifies markup into typed elements (heading,
//!   text, image, button, newsletter, ...) that can be edited field by field.
//! - [`Codec::Lossless`] keeps every section verbatim as a single opaque
//!   `html` element.
//!
//! Both codecs agree on which top-level nodes are sections.
//!
//! `<header>` and `<footer>` become the global navbar and footer under both
//! codecs. Script and style content is never traversed.
//!
//! The reverse direction is [`serialize_markup`] / [`render_page`]. Output
//! written in [`SerializeMode::Authoring`] carries `data-pb-*` markers and
//! restores exactly under either codec; a tree made only of opaque elements
//! survives `parse(serialize(tree))` unchanged apart from ids.

mod convert;
pub mod dom;
pub mod entities;
mod error;
pub mod lexer;
pub mod markers;
mod lossless;
mod semantic;
mod serializer;

pub use error::{MarkupError, MarkupResult};
pub use serializer::{render_page, serialize_document, serialize_markup, SerializeOptions};

use pagekit_document::{Document, NodeFactory, Section};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, instrument};

/// Which converter turns markup into a tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    Semantic,
    #[default]
    Lossless,
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Codec::Semantic => write!(f, "semantic"),
            Codec::Lossless => write!(f, "lossless"),
        }
    }
}

impl FromStr for Codec {
    type Err = MarkupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "semantic" => Ok(Codec::Semantic),
            "lossless" => Ok(Codec::Lossless),
            other => Err(MarkupError::UnknownCodec(other.to_string())),
        }
    }
}

/// Flavour of serialized markup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerializeMode {
    /// Annotated for a lossless trip back into the editor
    #[default]
    Authoring,
    /// Clean HTML for preview and export
    Publish,
}

impl fmt::Display for SerializeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializeMode::Authoring => write!(f, "authoring"),
            SerializeMode::Publish => write!(f, "publish"),
        }
    }
}

impl FromStr for SerializeMode {
    type Err = MarkupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "authoring" => Ok(SerializeMode::Authoring),
            "publish" => Ok(SerializeMode::Publish),
            other => Err(MarkupError::UnknownMode(other.to_string())),
        }
    }
}

/// Converter output: the page sections plus whichever global slots the
/// markup defined
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedMarkup {
    pub sections: Vec<Section>,
    pub global_navbar: Option<Section>,
    pub global_footer: Option<Section>,
}

impl ParsedMarkup {
    pub fn element_count(&self) -> usize {
        fn count_columns(columns: &[pagekit_document::Column]) -> usize {
            columns
                .iter()
                .flat_map(|c| &c.elements)
                .map(|e| 1 + e.columns.as_deref().map_or(0, count_columns))
                .sum()
        }

        self.sections
            .iter()
            .chain(&self.global_navbar)
            .chain(&self.global_footer)
            .map(|s| count_columns(&s.columns))
            .sum()
    }

    /// New single-page document holding this markup
    pub fn into_document(self, factory: &mut NodeFactory, page_name: &str) -> Document {
        let mut page = factory.create_page(page_name);
        page.layout = self.sections;

        let mut doc = Document::new(page);
        doc.global_navbar = self.global_navbar;
        doc.global_footer = self.global_footer;
        doc
    }
}

/// Convert an HTML document or fragment into sections and global slots.
///
/// Never fails: malformed markup degrades to the smallest possible loss
/// (one leaf, one marker) and the reason is logged.
#[instrument(skip(html, factory), fields(bytes = html.len()))]
pub fn parse_markup(html: &str, codec: Codec, factory: &mut NodeFactory) -> ParsedMarkup {
    let parsed = match codec {
        Codec::Semantic => convert::convert(&semantic::Semantic, html, factory),
        Codec::Lossless => convert::convert(&lossless::Lossless, html, factory),
    };

    debug!(
        sections = parsed.sections.len(),
        elements = parsed.element_count(),
        navbar = parsed.global_navbar.is_some(),
        footer = parsed.global_footer.is_some(),
        "Parsed markup"
    );
    parsed
}
