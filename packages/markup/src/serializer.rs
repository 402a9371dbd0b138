//! Tree → markup.
//!
//! `Authoring` output carries `data-pb-*` markers so either codec can
//! restore the tree; `Publish` output is plain HTML for preview and export.
//! Opaque markup is always written back verbatim.

use crate::convert::is_skipped;
use crate::dom::{DomDocument, DomNode};
use crate::entities::{escape_attr, escape_text};
use crate::markers::{self, props_attr};
use crate::semantic::is_section_like;
use crate::{ParsedMarkup, SerializeMode};
use pagekit_document::{Column, Document, Element, ElementKind, Page, Section, SectionKind};
use serde_json::Value;

/// Options for markup serialization
#[derive(Debug, Clone)]
pub struct SerializeOptions {
    pub mode: SerializeMode,
    /// One node per line, indented
    pub pretty: bool,
    /// Indentation string
    pub indent: String,
    /// Wrap the output in `<!DOCTYPE html><html>…<body>`
    pub full_document: bool,
    /// `<title>` of a full document
    pub title: String,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            mode: SerializeMode::Authoring,
            pretty: true,
            indent: "  ".to_string(),
            full_document: false,
            title: "Page".to_string(),
        }
    }
}

impl SerializeOptions {
    pub fn publish() -> Self {
        Self {
            mode: SerializeMode::Publish,
            full_document: true,
            ..Self::default()
        }
    }
}

struct Context {
    options: SerializeOptions,
    depth: usize,
    buffer: String,
}

impl Context {
    fn new(options: SerializeOptions) -> Self {
        Self {
            options,
            depth: 0,
            buffer: String::new(),
        }
    }

    fn authoring(&self) -> bool {
        self.options.mode == SerializeMode::Authoring
    }

    fn add(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn add_line(&mut self, text: &str) {
        if self.options.pretty {
            self.add_indent();
        }
        self.add(text);
        if self.options.pretty {
            self.add("\n");
        }
    }

    fn add_indent(&mut self) {
        let indent = self.options.indent.clone();
        for _ in 0..self.depth {
            self.add(&indent);
        }
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn dedent(&mut self) {
        if self.depth > 0 {
            self.depth -= 1;
        }
    }

    fn get_output(self) -> String {
        self.buffer
    }
}

/// Serialize converter output (sections plus global slots)
pub fn serialize_markup(markup: &ParsedMarkup, options: &SerializeOptions) -> String {
    render(
        &markup.sections,
        markup.global_navbar.as_ref(),
        markup.global_footer.as_ref(),
        options,
    )
}

/// Serialize one page framed by the given global slots
pub fn render_page(
    page: &Page,
    navbar: Option<&Section>,
    footer: Option<&Section>,
    options: &SerializeOptions,
) -> String {
    render(&page.layout, navbar, footer, options)
}

/// Serialize a page of `doc`, `None` when the page does not exist
pub fn serialize_document(
    doc: &Document,
    page_id: &str,
    options: &SerializeOptions,
) -> Option<String> {
    let page = doc.page(page_id)?;
    Some(render_page(
        page,
        doc.global_navbar.as_ref(),
        doc.global_footer.as_ref(),
        options,
    ))
}

fn render(
    sections: &[Section],
    navbar: Option<&Section>,
    footer: Option<&Section>,
    options: &SerializeOptions,
) -> String {
    let mut ctx = Context::new(options.clone());

    if options.full_document {
        ctx.add_line("<!DOCTYPE html>");
        ctx.add_line("<html>");
        ctx.indent();
        ctx.add_line("<head>");
        ctx.indent();
        ctx.add_line("<meta charset=\"utf-8\">");
        ctx.add_line(&format!("<title>{}</title>", escape_text(&options.title)));
        ctx.dedent();
        ctx.add_line("</head>");
        ctx.add_line("<body>");
        ctx.indent();
    }

    if let Some(navbar) = navbar {
        render_slot(navbar, SectionKind::Navbar, &mut ctx);
    }
    for section in sections {
        render_section(section, &mut ctx);
    }
    if let Some(footer) = footer {
        render_slot(footer, SectionKind::Footer, &mut ctx);
    }

    if options.full_document {
        ctx.dedent();
        ctx.add_line("</body>");
        ctx.dedent();
        ctx.add_line("</html>");
    }

    ctx.get_output()
}

fn render_slot(slot: &Section, kind: SectionKind, ctx: &mut Context) {
    if let Some(original) = slot
        .props
        .get("originalHtml")
        .and_then(Value::as_str)
        .filter(|html| !html.is_empty())
    {
        ctx.add_line(original);
        return;
    }

    let tag = if kind == SectionKind::Footer { "footer" } else { "header" };
    let marker = if ctx.authoring() {
        props_attr(&slot.props)
    } else {
        String::new()
    };
    ctx.add_line(&format!("<{}{}{}>", tag, class_attr(&slot.props), marker));
    ctx.indent();

    let links = links_html(slot.props.get("links"));
    if kind == SectionKind::Footer {
        let text = slot.props.get("text").and_then(Value::as_str).unwrap_or("");
        ctx.add_line(&format!("<p>{}</p>", escape_text(text)));
        if !links.is_empty() {
            ctx.add_line(&format!("<nav>{}</nav>", links));
        }
    } else {
        let logo = slot.props.get("logo").and_then(Value::as_str).unwrap_or("");
        ctx.add_line(&format!(
            "<div class=\"font-bold\">{}</div>",
            escape_text(logo)
        ));
        ctx.add_line(&format!("<nav>{}</nav>", links));
    }

    render_columns(&slot.columns, ctx);
    ctx.dedent();
    ctx.add_line(&format!("</{}>", tag));
}

fn links_html(links: Option<&Value>) -> String {
    links
        .and_then(Value::as_array)
        .map(|links| {
            links
                .iter()
                .map(|link| {
                    let text = link.get("text").and_then(Value::as_str).unwrap_or("");
                    let href = link.get("href").and_then(Value::as_str).unwrap_or("");
                    format!("<a href=\"{}\">{}</a>", escape_attr(href), escape_text(text))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn render_section(section: &Section, ctx: &mut Context) {
    if let Some(markup) = bare_markup(section) {
        ctx.add_line(markup);
        return;
    }

    if ctx.authoring() {
        ctx.add_line(&format!(
            "<section {}{}>",
            markers::SECTION,
            props_attr(&section.props)
        ));
    } else {
        ctx.add_line(&format!(
            "<section{}{}>",
            class_attr(&section.props),
            style_attr(&section.props, None)
        ));
    }
    ctx.indent();
    render_columns(&section.columns, ctx);
    ctx.dedent();
    ctx.add_line("</section>");
}

fn render_columns(columns: &[Column], ctx: &mut Context) {
    let flex = !ctx.authoring() && columns.len() > 1;
    if flex {
        ctx.add_line("<div class=\"flex\">");
        ctx.indent();
    }
    for column in columns {
        ctx.add_line(&column_open(column, ctx.options.mode));
        ctx.indent();
        for element in &column.elements {
            ctx.add_line(&render_element(element, ctx.options.mode));
        }
        ctx.dedent();
        ctx.add_line("</div>");
    }
    if flex {
        ctx.dedent();
        ctx.add_line("</div>");
    }
}

fn column_open(column: &Column, mode: SerializeMode) -> String {
    match mode {
        SerializeMode::Authoring => format!("<div {}{}>", markers::COLUMN, props_attr(&column.props)),
        SerializeMode::Publish => format!(
            "<div{}{}>",
            class_attr(&column.props),
            style_attr(&column.props, column.width())
        ),
    }
}

/// Markup a section can be written as on its own: one full-width column
/// holding one opaque element whose markup re-parses to exactly one
/// unmarked top-level element spanning all of it.
fn bare_markup(section: &Section) -> Option<&str> {
    if section.kind != SectionKind::Section
        || !section.props.is_empty()
        || section.columns.len() != 1
    {
        return None;
    }
    let column = &section.columns[0];
    if column.props.len() != 1 || column.width() != Some("100%") || column.elements.len() != 1 {
        return None;
    }
    let element = &column.elements[0];
    if element.props.len() != 1 {
        return None;
    }
    let markup = element.original_html()?;
    is_standalone(markup).then_some(markup)
}

fn is_standalone(markup: &str) -> bool {
    let doc = DomDocument::parse(markup);
    let mut nodes = doc.children.iter().filter(|node| match node {
        DomNode::Text(text) => !text.is_blank(),
        DomNode::Element(_) => true,
    });

    match (nodes.next(), nodes.next()) {
        (Some(DomNode::Element(el)), None) => {
            doc.balanced
                && is_section_like(el)
                && !is_skipped(&el.tag)
                && !matches!(
                    el.tag.as_str(),
                    "header" | "footer" | "main" | "html" | "body"
                )
                && !markers::is_marked(el)
                && doc.outer_html(el) == markup
        }
        _ => false,
    }
}

fn class_attr(props: &serde_json::Map<String, Value>) -> String {
    match props.get("className").and_then(Value::as_str) {
        Some(class) if !class.is_empty() => format!(" class=\"{}\"", escape_attr(class)),
        _ => String::new(),
    }
}

fn style_attr(props: &serde_json::Map<String, Value>, width: Option<&str>) -> String {
    let mut style = String::new();
    if let Some(width) = width {
        style.push_str(&format!("width: {}", width));
    }
    if let Some(extra) = props.get("style").and_then(Value::as_str) {
        if !style.is_empty() {
            style.push_str("; ");
        }
        style.push_str(extra);
    }
    if style.is_empty() {
        String::new()
    } else {
        format!(" style=\"{}\"", escape_attr(&style))
    }
}

/// Open tag attributes of a typed element: marker (authoring only), class, extras
fn element_attrs(element: &Element, mode: SerializeMode, class: Option<&str>) -> String {
    let mut attrs = String::new();
    if mode == SerializeMode::Authoring {
        attrs.push_str(&format!(
            " {}=\"{}\"{}",
            markers::ELEMENT,
            escape_attr(element.kind.as_str()),
            props_attr(&element.props)
        ));
    }

    let classes: Vec<&str> = class
        .into_iter()
        .chain(element.prop_str("className"))
        .filter(|c| !c.is_empty())
        .collect();
    if !classes.is_empty() {
        attrs.push_str(&format!(" class=\"{}\"", escape_attr(&classes.join(" "))));
    }
    attrs
}

/// Single-line markup of one element
fn render_element(element: &Element, mode: SerializeMode) -> String {
    let text = |key: &str| escape_text(element.prop_str(key).unwrap_or(""));
    let attr = |key: &str| escape_attr(element.prop_str(key).unwrap_or(""));

    match &element.kind {
        ElementKind::Html => {
            let original = element.prop_str("originalHtml").unwrap_or("");
            match mode {
                SerializeMode::Publish => original.to_string(),
                // Unbalanced markup would close or swallow the wrapper, so
                // it travels inside the props marker instead
                SerializeMode::Authoring if !DomDocument::parse(original).balanced => format!(
                    "<div {}=\"html\"{}></div>",
                    markers::ELEMENT,
                    props_attr(&element.props)
                ),
                SerializeMode::Authoring => {
                    let mut rest = element.props.clone();
                    rest.remove("originalHtml");
                    format!(
                        "<div {}=\"html\"{} {}>{}</div>",
                        markers::ELEMENT,
                        props_attr(&rest),
                        markers::MARKUP,
                        original
                    )
                }
            }
        }
        ElementKind::Heading => {
            let tag = match element.prop_str("tag") {
                Some(tag @ ("h1" | "h2" | "h3" | "h4" | "h5" | "h6")) => tag,
                _ => "h2",
            };
            format!(
                "<{tag}{}>{}</{tag}>",
                element_attrs(element, mode, None),
                text("text"),
                tag = tag
            )
        }
        ElementKind::Text => format!("<p{}>{}</p>", element_attrs(element, mode, None), text("text")),
        ElementKind::Image => {
            let link = element.prop_str("link").unwrap_or("");
            if link.is_empty() {
                format!(
                    "<img{} src=\"{}\" alt=\"{}\">",
                    element_attrs(element, mode, None),
                    attr("src"),
                    attr("alt")
                )
            } else {
                format!(
                    "<a{} href=\"{}\"><img src=\"{}\" alt=\"{}\"></a>",
                    element_attrs(element, mode, None),
                    escape_attr(link),
                    attr("src"),
                    attr("alt")
                )
            }
        }
        ElementKind::Button => {
            let link = element.prop_str("link").unwrap_or("");
            if link.is_empty() {
                format!(
                    "<button{}>{}</button>",
                    element_attrs(element, mode, None),
                    text("text")
                )
            } else {
                format!(
                    "<a{} href=\"{}\">{}</a>",
                    element_attrs(element, mode, None),
                    escape_attr(link),
                    text("text")
                )
            }
        }
        ElementKind::Divider => format!("<hr{}>", element_attrs(element, mode, None)),
        ElementKind::Spacer => {
            let height = match element.props.get("height") {
                Some(Value::Number(n)) => format!("{}px", n),
                Some(Value::String(s)) => s.clone(),
                _ => "40px".to_string(),
            };
            format!(
                "<div{} style=\"height: {}\"></div>",
                element_attrs(element, mode, None),
                escape_attr(&height)
            )
        }
        ElementKind::Video => {
            let url = element.prop_str("url").unwrap_or("");
            let is_file = [".mp4", ".webm", ".ogg"]
                .iter()
                .any(|ext| url.to_ascii_lowercase().ends_with(ext));
            if is_file {
                format!(
                    "<video{} src=\"{}\" controls></video>",
                    element_attrs(element, mode, None),
                    escape_attr(url)
                )
            } else {
                format!(
                    "<iframe{} src=\"{}\" allowfullscreen></iframe>",
                    element_attrs(element, mode, None),
                    escape_attr(url)
                )
            }
        }
        ElementKind::Slider => {
            let slides: String = element
                .props
                .get("slides")
                .and_then(Value::as_array)
                .map(|slides| {
                    slides
                        .iter()
                        .map(|slide| {
                            let src = slide.get("src").and_then(Value::as_str).unwrap_or("");
                            let alt = slide.get("alt").and_then(Value::as_str).unwrap_or("");
                            format!("<img src=\"{}\" alt=\"{}\">", escape_attr(src), escape_attr(alt))
                        })
                        .collect()
                })
                .unwrap_or_default();
            format!(
                "<div{}>{}</div>",
                element_attrs(element, mode, Some("slider")),
                slides
            )
        }
        ElementKind::Newsletter => format!(
            "<form{}><h3>{}</h3><p>{}</p><input type=\"email\" placeholder=\"{}\"><button type=\"submit\">{}</button></form>",
            element_attrs(element, mode, Some("newsletter")),
            text("title"),
            text("subtitle"),
            attr("placeholder"),
            text("buttonText")
        ),
        ElementKind::InnerSection => {
            let columns: String = element
                .columns
                .iter()
                .flatten()
                .map(|column| {
                    let inner: String = column
                        .elements
                        .iter()
                        .map(|e| render_element(e, mode))
                        .collect();
                    format!("{}{}</div>", column_open(column, mode), inner)
                })
                .collect();
            let class = (mode == SerializeMode::Publish).then_some("flex");
            format!("<div{}>{}</div>", element_attrs(element, mode, class), columns)
        }
        ElementKind::Other(kind) => {
            let class = format!("pb-{}", kind);
            format!("<div{}></div>", element_attrs(element, mode, Some(class.as_str())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagekit_document::{IdGenerator, NodeFactory};
    use serde_json::json;

    fn factory() -> NodeFactory {
        NodeFactory::with_ids(IdGenerator::from_seed("serializer"))
    }

    fn opaque_section(factory: &mut NodeFactory, markup: &str) -> Section {
        let mut section = factory.create_section_with_column();
        let mut element = factory.create_element(ElementKind::Html);
        element.props.insert("originalHtml".to_string(), json!(markup));
        section.columns[0].elements.push(element);
        section
    }

    #[test]
    fn test_bare_section_written_verbatim() {
        let mut factory = factory();
        let markup = "<section class=\"hero\">\n  <h1>Hi</h1>\n</section>";
        let section = opaque_section(&mut factory, markup);

        assert_eq!(bare_markup(&section), Some(markup));
    }

    #[test]
    fn test_multi_root_markup_is_not_bare() {
        let mut factory = factory();
        assert_eq!(bare_markup(&opaque_section(&mut factory, "<p>a</p><p>b</p>")), None);
        assert_eq!(bare_markup(&opaque_section(&mut factory, "just text")), None);
        assert_eq!(bare_markup(&opaque_section(&mut factory, "<header>x</header>")), None);
    }

    #[test]
    fn test_unbalanced_or_minor_markup_is_not_bare() {
        let mut factory = factory();
        assert_eq!(bare_markup(&opaque_section(&mut factory, "<div><p>open")), None);
        assert_eq!(bare_markup(&opaque_section(&mut factory, "<section>a</div></section>")), None);
        assert_eq!(bare_markup(&opaque_section(&mut factory, "<div>short</div>")), None);
    }

    #[test]
    fn test_unbalanced_opaque_markup_travels_in_props() {
        let mut factory = factory();
        let mut element = factory.create_element(ElementKind::Html);
        element
            .props
            .insert("originalHtml".to_string(), json!("<b>x</b></div>"));

        let out = render_element(&element, SerializeMode::Authoring);
        assert!(!out.contains(markers::MARKUP));
        assert!(out.contains(markers::PROPS));
        assert!(out.ends_with("></div>"));

        element
            .props
            .insert("originalHtml".to_string(), json!("<b>x</b>"));
        let out = render_element(&element, SerializeMode::Authoring);
        assert_eq!(out, "<div data-pb-element=\"html\" data-pb-markup><b>x</b></div>");
    }

    #[test]
    fn test_authoring_markers() {
        let mut factory = factory();
        let mut section = factory.create_section();
        section.columns = factory.create_columns(&[50.0, 50.0]);
        let heading = factory.create_element_with(
            ElementKind::Heading,
            json!({ "text": "A & B" }).as_object().unwrap(),
        );
        section.columns[0].elements.push(heading);

        let out = serialize_markup(
            &ParsedMarkup {
                sections: vec![section],
                ..ParsedMarkup::default()
            },
            &SerializeOptions::default(),
        );

        assert!(out.contains("<section data-pb-section>"));
        assert!(out.contains(r#"<div data-pb-column data-pb-props='{"width":"50%"}'>"#));
        assert!(out.contains("<h2 data-pb-element=\"heading\""));
        assert!(out.contains(">A &amp; B</h2>"));
    }

    #[test]
    fn test_publish_output_is_clean() {
        let mut factory = factory();
        let mut section = factory.create_section();
        section.columns = factory.create_columns(&[50.0, 50.0]);
        section.columns[1]
            .elements
            .push(factory.create_element(ElementKind::Divider));

        let mut page = factory.create_page("Home");
        page.layout.push(section);
        let navbar = factory.navbar(
            json!({ "logo": "Acme", "links": [{ "text": "Home", "href": "/" }] })
                .as_object()
                .cloned()
                .unwrap(),
        );

        let out = render_page(&page, Some(&navbar), None, &SerializeOptions::publish());

        assert!(out.starts_with("<!DOCTYPE html>"));
        assert!(!out.contains("data-pb-"));
        assert!(out.contains("<div class=\"font-bold\">Acme</div>"));
        assert!(out.contains("<nav><a href=\"/\">Home</a></nav>"));
        assert!(out.contains("<div class=\"flex\">"));
        assert!(out.contains("<div style=\"width: 50%\">"));
        assert!(out.contains("<hr>"));
    }

    #[test]
    fn test_compact_output() {
        let mut factory = factory();
        let section = opaque_section(&mut factory, "<section>x</section>");
        let options = SerializeOptions {
            pretty: false,
            ..SerializeOptions::default()
        };
        let out = serialize_markup(
            &ParsedMarkup {
                sections: vec![section.clone(), section],
                ..ParsedMarkup::default()
            },
            &options,
        );
        assert_eq!(out, "<section>x</section><section>x</section>");
    }
}
