//! Semantic codec: classifies markup into typed, field-editable elements.
//!
//! Lossy by nature. Inline formatting inside text is flattened, unknown
//! leaves are dropped, and only the first grid/flex container of a section
//! becomes columns.

use crate::convert::{is_skipped, ContentCodec};
use crate::dom::{DomDocument, DomElement, DomNode, DomText};
use pagekit_document::{
    width_label, Column, Element, ElementKind, NodeFactory, Props, Section,
};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Formatting tags that may sit inside a text block without making it a container
const INLINE_TAGS: &[&str] = &[
    "span", "strong", "em", "b", "i", "u", "s", "small", "br", "code", "mark", "sup", "sub",
    "abbr", "time",
];

/// Tags that read as a text block when they hold only inline content
const TEXT_BLOCK_TAGS: &[&str] = &["div", "span", "li", "label", "strong", "em", "small"];

pub(crate) struct Semantic;

impl ContentCodec for Semantic {
    fn section(
        &self,
        _doc: &DomDocument,
        el: &DomElement,
        factory: &mut NodeFactory,
    ) -> Option<Section> {
        is_section_like(el).then(|| section(el, factory))
    }

    fn loose_text(
        &self,
        _doc: &DomDocument,
        text: &DomText,
        _factory: &mut NodeFactory,
    ) -> Option<Section> {
        debug!(offset = text.span.start, "Skipping loose top-level text");
        None
    }

    fn column_content(
        &self,
        _doc: &DomDocument,
        node: &DomNode,
        factory: &mut NodeFactory,
    ) -> Vec<Element> {
        let mut out = Vec::new();
        if let DomNode::Element(el) = node {
            Collector::new(factory).visit(el, &mut out);
        }
        out
    }

    fn navbar(&self, _doc: &DomDocument, el: &DomElement, factory: &mut NodeFactory) -> Section {
        factory.navbar(navbar_props(el))
    }

    fn footer(&self, _doc: &DomDocument, el: &DomElement, factory: &mut NodeFactory) -> Section {
        factory.footer(footer_props(el))
    }
}

/// A `<section>`, or a block with children, more than 50 characters of
/// text, or any heading/paragraph/image/button/input inside it
pub(crate) fn is_section_like(el: &DomElement) -> bool {
    match el.tag.as_str() {
        "section" => true,
        "div" | "article" | "aside" => {
            el.has_element_children()
                || el.text_content().chars().count() > 50
                || el.contains(&|e: &DomElement| {
                    e.is_heading() || matches!(e.tag.as_str(), "p" | "img" | "button" | "input")
                })
        }
        _ => false,
    }
}

/// `{ logo, links }` scraped from a `<header>`
pub(crate) fn navbar_props(el: &DomElement) -> Props {
    let logo = el
        .find(&|e: &DomElement| e.has_class("font-bold"))
        .map(DomElement::text_content)
        .unwrap_or_default();
    let links = el
        .find(&|e: &DomElement| e.tag == "nav")
        .map(|nav| links_in(nav))
        .unwrap_or_default();

    let mut props = Props::new();
    props.insert("logo".to_string(), Value::from(logo));
    props.insert("links".to_string(), Value::Array(links));
    props
}

/// `{ text, links }` scraped from a `<footer>`
pub(crate) fn footer_props(el: &DomElement) -> Props {
    let text = el
        .find(&|e: &DomElement| e.tag == "p")
        .map(DomElement::text_content)
        .unwrap_or_else(|| el.text_content());

    let mut props = Props::new();
    props.insert("text".to_string(), Value::from(text));
    props.insert("links".to_string(), Value::Array(links_in(el)));
    props
}

fn links_in(el: &DomElement) -> Vec<Value> {
    el.find_all(&|e: &DomElement| e.tag == "a")
        .into_iter()
        .map(|a| json!({ "text": a.text_content(), "href": a.attr("href").unwrap_or("") }))
        .collect()
}

fn is_email_input(el: &DomElement) -> bool {
    el.tag == "input"
        && el
            .attr("type")
            .map_or(false, |t| t.eq_ignore_ascii_case("email"))
}

fn is_newsletter(el: &DomElement) -> bool {
    (el.tag == "form" || el.has_class("newsletter") || el.has_class("subscribe"))
        && el.contains(&is_email_input)
}

fn is_grid(el: &DomElement) -> bool {
    let by_class = el.classes().any(|c| {
        matches!(c, "grid" | "flex" | "inline-flex" | "inline-grid")
            || c.ends_with(":grid")
            || c.ends_with(":flex")
    });
    let by_style = el.attr("style").map_or(false, |style| {
        let style: String = style.chars().filter(|c| !c.is_whitespace()).collect();
        style.contains("display:flex") || style.contains("display:grid")
    });
    if !(by_class || by_style) || el.tag == "form" {
        return false;
    }

    let cells: Vec<&DomElement> = el.element_children().collect();
    cells.len() >= 2
        && !cells.iter().any(|c| is_email_input(c))
        && !cells.iter().all(|c| matches!(c.tag.as_str(), "a" | "button"))
}

/// First grid container, the node itself included
fn find_grid(el: &DomElement) -> Option<&DomElement> {
    if is_grid(el) {
        return Some(el);
    }
    el.find(&is_grid)
}

fn is_inline_only(el: &DomElement) -> bool {
    el.element_children()
        .all(|c| INLINE_TAGS.contains(&c.tag.as_str()))
}

fn class_name(el: &DomElement) -> Option<String> {
    el.attr("class")
        .map(str::trim)
        .filter(|class| !class.is_empty())
        .map(str::to_string)
}

fn section(el: &DomElement, factory: &mut NodeFactory) -> Section {
    let mut section = factory.create_section();
    if let Some(class) = class_name(el) {
        section.props.insert("className".to_string(), Value::from(class));
    }

    let grid = find_grid(el);
    if let Some(grid) = grid.filter(|grid| std::ptr::eq(*grid, el)) {
        section.columns = Collector::new(factory).grid_columns(grid);
        return section;
    }

    let mut elements = Collector::new(factory).with_grid(grid).collect(el);
    let promoted = elements.len() == 1 && elements[0].kind == ElementKind::InnerSection;
    match elements.pop() {
        Some(inner) if promoted => {
            section.columns = inner.columns.unwrap_or_default();
        }
        last => {
            elements.extend(last);
            let mut column = factory.create_column("100%");
            column.elements = elements;
            section.columns.push(column);
        }
    }
    section
}

struct Collector<'f, 'd> {
    factory: &'f mut NodeFactory,
    grid: Option<&'d DomElement>,
    in_nav: bool,
}

impl<'f, 'd> Collector<'f, 'd> {
    fn new(factory: &'f mut NodeFactory) -> Self {
        Self {
            factory,
            grid: None,
            in_nav: false,
        }
    }

    fn with_grid(mut self, grid: Option<&'d DomElement>) -> Self {
        self.grid = grid;
        self
    }

    /// Elements for the children of `container`, in document order
    fn collect(&mut self, container: &DomElement) -> Vec<Element> {
        let children: Vec<&DomElement> = container
            .element_children()
            .filter(|c| !is_skipped(&c.tag))
            .collect();
        let (captions, consumed) = newsletter_captions(&children);

        let mut out = Vec::new();
        for (index, child) in children.iter().enumerate() {
            if consumed.contains(&index) {
                continue;
            }
            if is_newsletter(child) {
                let caption = captions.get(&index).copied().unwrap_or_default();
                out.push(self.newsletter(child, caption));
                continue;
            }
            self.visit(child, &mut out);
        }
        out
    }

    fn visit(&mut self, el: &DomElement, out: &mut Vec<Element>) {
        if self.grid.map_or(false, |grid| std::ptr::eq(grid, el)) {
            let columns = self.grid_columns(el);
            let mut inner = self.typed(ElementKind::InnerSection, Props::new(), el);
            inner.columns = Some(columns);
            out.push(inner);
            return;
        }
        if is_newsletter(el) {
            out.push(self.newsletter(el, Caption::default()));
            return;
        }
        if self.in_nav && el.tag == "a" {
            return;
        }
        if let Some(element) = self.leaf(el) {
            out.push(element);
            return;
        }
        if el.has_element_children() {
            let in_nav = self.in_nav;
            self.in_nav = in_nav || el.tag == "nav";
            out.extend(self.collect(el));
            self.in_nav = in_nav;
        } else {
            debug!(tag = %el.tag, "Skipping unrecognized leaf");
        }
    }

    /// One equal-width column per grid cell
    fn grid_columns(&mut self, grid: &DomElement) -> Vec<Column> {
        let cells: Vec<&DomElement> = grid
            .element_children()
            .filter(|c| !is_skipped(&c.tag))
            .collect();
        let width = width_label(100.0 / cells.len().max(1) as f64);

        let outer = self.grid.take();
        let columns = cells
            .into_iter()
            .map(|cell| {
                let mut elements = Vec::new();
                self.visit(cell, &mut elements);
                let mut column = self.factory.create_column(&width);
                column.elements = elements;
                column
            })
            .collect();
        self.grid = outer;
        columns
    }

    fn leaf(&mut self, el: &DomElement) -> Option<Element> {
        let tag = el.tag.as_str();
        let (kind, props) = match tag {
            _ if el.is_heading() => (
                ElementKind::Heading,
                json!({ "text": el.text_content(), "tag": tag }),
            ),
            "p" | "blockquote" => {
                let text = el.text_content();
                if text.is_empty() {
                    return None;
                }
                (ElementKind::Text, json!({ "text": text }))
            }
            "img" => (ElementKind::Image, image_props(el)),
            "button" => (
                ElementKind::Button,
                json!({ "text": el.text_content(), "link": "" }),
            ),
            "a" => {
                let href = el.attr("href").unwrap_or("");
                let text = el.text_content();
                let only_image = text.is_empty()
                    && el.element_children().count() == 1
                    && el.element_children().all(|c| c.tag == "img");
                if only_image {
                    let img = el.element_children().next()?;
                    let mut props = image_props(img);
                    props["link"] = Value::from(href);
                    (ElementKind::Image, props)
                } else if text.is_empty() {
                    return None;
                } else {
                    (ElementKind::Button, json!({ "text": text, "link": href }))
                }
            }
            "hr" => (ElementKind::Divider, json!({})),
            "video" => {
                let url = el
                    .attr("src")
                    .or_else(|| {
                        el.find(&|e: &DomElement| e.tag == "source")
                            .and_then(|source| source.attr("src"))
                    })
                    .unwrap_or("");
                (ElementKind::Video, json!({ "url": url }))
            }
            "iframe" => (
                ElementKind::Video,
                json!({ "url": el.attr("src").unwrap_or("") }),
            ),
            _ if TEXT_BLOCK_TAGS.contains(&tag) && is_inline_only(el) => {
                let text = el.text_content();
                if text.is_empty() {
                    return None;
                }
                (ElementKind::Text, json!({ "text": text }))
            }
            _ => return None,
        };

        let props = match props {
            Value::Object(props) => props,
            _ => Props::new(),
        };
        Some(self.typed(kind, props, el))
    }

    fn newsletter(&mut self, form: &DomElement, caption: Caption<'_>) -> Element {
        let mut props = Props::new();

        let title = form
            .find(&|e: &DomElement| e.is_heading())
            .or(caption.title)
            .map(DomElement::text_content);
        let subtitle = form
            .find(&|e: &DomElement| e.tag == "p")
            .or(caption.subtitle)
            .map(DomElement::text_content);
        let button_text = form
            .find(&|e: &DomElement| e.tag == "button")
            .map(DomElement::text_content)
            .filter(|text| !text.is_empty())
            .or_else(|| {
                form.find(&|e: &DomElement| {
                    e.tag == "input" && e.attr("type").map_or(false, |t| t.eq_ignore_ascii_case("submit"))
                })
                .and_then(|submit| submit.attr("value"))
                .map(str::to_string)
            });
        let placeholder = form
            .find(&is_email_input)
            .and_then(|input| input.attr("placeholder"))
            .map(str::to_string);

        for (key, value) in [
            ("title", title),
            ("subtitle", subtitle),
            ("buttonText", button_text),
            ("placeholder", placeholder),
        ] {
            if let Some(value) = value {
                props.insert(key.to_string(), Value::from(value));
            }
        }
        self.typed(ElementKind::Newsletter, props, form)
    }

    fn typed(&mut self, kind: ElementKind, mut props: Props, source: &DomElement) -> Element {
        if let Some(class) = class_name(source) {
            props.insert("className".to_string(), Value::from(class));
        }
        self.factory.create_element_with(kind, &props)
    }
}

fn image_props(img: &DomElement) -> Value {
    json!({
        "src": img.attr("src").unwrap_or(""),
        "alt": img.attr("alt").unwrap_or(""),
    })
}

/// Heading/paragraph siblings that caption a newsletter form
#[derive(Debug, Clone, Copy, Default)]
struct Caption<'d> {
    title: Option<&'d DomElement>,
    subtitle: Option<&'d DomElement>,
}

/// For each newsletter among `children`, the nearest preceding heading and
/// paragraph siblings it absorbs (only when the form has none of its own),
/// plus the set of absorbed sibling indices.
fn newsletter_captions<'d>(
    children: &[&'d DomElement],
) -> (HashMap<usize, Caption<'d>>, HashSet<usize>) {
    let mut captions = HashMap::new();
    let mut consumed = HashSet::new();

    for (index, child) in children.iter().enumerate() {
        if !is_newsletter(child) {
            continue;
        }
        let wants_title = !child.contains(&|e: &DomElement| e.is_heading());
        let wants_subtitle = !child.contains(&|e: &DomElement| e.tag == "p");

        let mut caption = Caption::default();
        for prior in (0..index).rev() {
            let sibling = children[prior];
            if is_newsletter(sibling) || consumed.contains(&prior) {
                break;
            }
            if wants_title && caption.title.is_none() && sibling.is_heading() {
                caption.title = Some(sibling);
                consumed.insert(prior);
            } else if wants_subtitle && caption.subtitle.is_none() && sibling.tag == "p" {
                caption.subtitle = Some(sibling);
                consumed.insert(prior);
            }
        }
        captions.insert(index, caption);
    }
    (captions, consumed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagekit_document::IdGenerator;

    fn factory() -> NodeFactory {
        NodeFactory::with_ids(IdGenerator::from_seed("semantic"))
    }

    fn first(source: &str) -> DomElement {
        let doc = DomDocument::parse(source);
        doc.children
            .into_iter()
            .find_map(|n| match n {
                DomNode::Element(el) => Some(el),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_section_like() {
        assert!(is_section_like(&first("<section></section>")));
        assert!(is_section_like(&first("<div><span>x</span></div>")));
        assert!(is_section_like(&first(&format!("<div>{}</div>", "x".repeat(51)))));
        assert!(!is_section_like(&first("<div>short</div>")));
        assert!(!is_section_like(&first("<span><p>x</p></span>")));
    }

    #[test]
    fn test_leaf_classification() {
        let el = first(
            r#"<section>
                <h1 class="title">Hello</h1>
                <p>Some <b>bold</b> copy</p>
                <img src="/a.png" alt="A">
                <a href="/buy">Buy</a>
                <button>Go</button>
                <hr>
                <iframe src="https://video.example/1"></iframe>
                <span>Inline note</span><canvas></canvas>
            </section>"#,
        );
        let mut factory = factory();
        let section = section(&el, &mut factory);
        let elements = &section.columns[0].elements;

        let kinds: Vec<&str> = elements.iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(
            kinds,
            vec!["heading", "text", "image", "button", "button", "divider", "video", "text"]
        );
        assert_eq!(elements[0].prop_str("tag"), Some("h1"));
        assert_eq!(elements[0].prop_str("className"), Some("title"));
        assert_eq!(elements[1].prop_str("text"), Some("Some bold copy"));
        assert_eq!(elements[3].prop_str("link"), Some("/buy"));
        assert_eq!(elements[4].prop_str("link"), Some(""));
        assert_eq!(elements[6].prop_str("url"), Some("https://video.example/1"));
        // text-bearing span becomes text, the empty canvas is skipped
        assert_eq!(elements[7].prop_str("text"), Some("Inline note"));
    }

    #[test]
    fn test_grid_children_become_columns() {
        let el = first(
            r#"<section><div class="grid md:grid-cols-3">
                <div><h3>One</h3></div><div><h3>Two</h3></div><div><h3>Three</h3></div>
            </div></section>"#,
        );
        let mut factory = factory();
        let section = section(&el, &mut factory);

        assert_eq!(section.columns.len(), 3);
        assert_eq!(section.columns[0].width(), Some("33.33%"));
        assert_eq!(section.columns[2].elements[0].prop_str("text"), Some("Three"));
    }

    #[test]
    fn test_grid_beside_content_becomes_inner_section() {
        let el = first(
            r#"<section><h2>Features</h2><div class="flex"><p>A</p><p>B</p></div></section>"#,
        );
        let mut factory = factory();
        let section = section(&el, &mut factory);

        assert_eq!(section.columns.len(), 1);
        let elements = &section.columns[0].elements;
        assert_eq!(elements[0].kind, ElementKind::Heading);
        assert_eq!(elements[1].kind, ElementKind::InnerSection);
        assert_eq!(elements[1].columns.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn test_link_rows_are_not_grids() {
        let el = first(r#"<div class="flex"><a href="/a">A</a><a href="/b">B</a></div>"#);
        assert!(!is_grid(&el));
    }

    #[test]
    fn test_newsletter_absorbs_captions() {
        let el = first(
            r#"<section>
                <h2>Stay in touch</h2>
                <p>Monthly news, no spam.</p>
                <form><input type="email" placeholder="you@site.com"><button>Join</button></form>
            </section>"#,
        );
        let mut factory = factory();
        let section = section(&el, &mut factory);
        let elements = &section.columns[0].elements;

        assert_eq!(elements.len(), 1);
        let newsletter = &elements[0];
        assert_eq!(newsletter.kind, ElementKind::Newsletter);
        assert_eq!(newsletter.prop_str("title"), Some("Stay in touch"));
        assert_eq!(newsletter.prop_str("subtitle"), Some("Monthly news, no spam."));
        assert_eq!(newsletter.prop_str("buttonText"), Some("Join"));
        assert_eq!(newsletter.prop_str("placeholder"), Some("you@site.com"));
    }

    #[test]
    fn test_anchors_in_nav_are_not_buttons() {
        let el = first(r#"<section><nav><a href="/a">A</a></nav><a href="/b">B</a></section>"#);
        let mut factory = factory();
        let section = section(&el, &mut factory);
        let elements = &section.columns[0].elements;

        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].prop_str("link"), Some("/b"));
    }

    #[test]
    fn test_navbar_and_footer_props() {
        let header = first(
            r#"<header><div class="font-bold">Acme</div><nav><a href="/">Home</a><a href="/about">About</a></nav></header>"#,
        );
        let props = navbar_props(&header);
        assert_eq!(props["logo"], json!("Acme"));
        assert_eq!(props["links"][1], json!({ "text": "About", "href": "/about" }));

        let footer = first(r#"<footer><p>© 2024 Acme</p><a href="/terms">Terms</a></footer>"#);
        let props = footer_props(&footer);
        assert_eq!(props["text"], json!("© 2024 Acme"));
        assert_eq!(props["links"].as_array().map(Vec::len), Some(1));
    }
}
