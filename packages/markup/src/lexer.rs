use logos::{Lexer, Logos};
use std::fmt;

/// Markup tokens. Text between tags is a single token; comments are
/// consumed whole by a callback so nothing inside them is tokenized.
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token<'src> {
    #[token("<!--", comment)]
    Comment(&'src str),

    #[regex(r"<![a-zA-Z][^>]*>", |lex| lex.slice())]
    Doctype(&'src str),

    #[regex(r"<\?[^>]*>", |lex| lex.slice())]
    ProcessingInstruction(&'src str),

    /// The tag name is matched here, the attributes by [`open_tag`]
    #[regex(r"<[a-zA-Z][a-zA-Z0-9:-]*", open_tag)]
    OpenTag(&'src str),

    #[regex(r"</[a-zA-Z][a-zA-Z0-9:-]*[ \t\r\n\f]*>", |lex| lex.slice())]
    CloseTag(&'src str),

    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),

    /// A `<` that does not start a tag; treated as text
    #[token("<", |lex| lex.slice())]
    StrayAngle(&'src str),
}

fn comment<'src>(lex: &mut Lexer<'src, Token<'src>>) -> &'src str {
    let consumed = match lex.remainder().find("-->") {
        Some(end) => end + "-->".len(),
        None => lex.remainder().len(),
    };
    lex.bump(consumed);
    lex.slice()
}

/// Finish an open tag at the first `>` outside a quoted attribute value.
/// A tag that never ends is not a tag; the `<` is reported as an error and
/// kept as text by the tree builder.
fn open_tag<'src>(lex: &mut Lexer<'src, Token<'src>>) -> Option<&'src str> {
    let consumed = tag_end(lex.remainder())?;
    lex.bump(consumed);
    Some(lex.slice())
}

/// Length of the attribute section including the closing `>`
fn tag_end(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    let mut quote: Option<u8> = None;
    let mut after_equals = false;

    for (i, &byte) in bytes.iter().enumerate() {
        match quote {
            Some(q) if byte == q => quote = None,
            Some(_) => {}
            None => match byte {
                b'>' => return Some(i + 1),
                b'"' | b'\'' if after_equals => quote = Some(byte),
                b'<' => return None,
                b'=' => {
                    after_equals = true;
                    continue;
                }
                b if b.is_ascii_whitespace() => continue,
                _ => {}
            },
        }
        after_equals = false;
    }
    None
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Comment(_) => write!(f, "comment"),
            Token::Doctype(s) => write!(f, "doctype {}", s),
            Token::ProcessingInstruction(s) => write!(f, "processing instruction {}", s),
            Token::OpenTag(s) => write!(f, "open tag {}", s),
            Token::CloseTag(s) => write!(f, "close tag {}", s),
            Token::Text(_) => write!(f, "text"),
            Token::StrayAngle(_) => write!(f, "'<'"),
        }
    }
}

/// Parsed form of an open tag slice such as `<a href="/x" class=btn>`
#[derive(Debug, Clone, PartialEq)]
pub struct OpenTag {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub self_closing: bool,
}

impl OpenTag {
    pub fn parse(slice: &str) -> Self {
        let body = slice.trim_start_matches('<').trim_end_matches('>');
        let self_closing = body.ends_with('/');
        let body = body.trim_end_matches('/');

        let name_end = body
            .find(|c: char| c.is_ascii_whitespace())
            .unwrap_or(body.len());
        let name = body[..name_end].to_ascii_lowercase();

        Self {
            name,
            attributes: parse_attributes(&body[name_end..]),
            self_closing,
        }
    }
}

/// Tag name of a close tag slice such as `</div >`
pub fn close_tag_name(slice: &str) -> String {
    slice
        .trim_start_matches("</")
        .trim_end_matches('>')
        .trim()
        .to_ascii_lowercase()
}

fn parse_attributes(input: &str) -> Vec<(String, String)> {
    let mut attributes = Vec::new();
    let bytes = input.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let name_start = i;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'=' {
            i += 1;
        }
        if name_start == i {
            // Stray '=' with no name
            i += 1;
            continue;
        }
        let name = input[name_start..i].to_ascii_lowercase();

        let mut j = i;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if j >= bytes.len() || bytes[j] != b'=' {
            attributes.push((name, String::new()));
            continue;
        }
        j += 1;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }

        let value = match bytes.get(j) {
            Some(&quote) if quote == b'"' || quote == b'\'' => {
                let start = j + 1;
                let end = input[start..]
                    .find(quote as char)
                    .map(|offset| start + offset)
                    .unwrap_or(input.len());
                i = (end + 1).min(input.len());
                &input[start..end]
            }
            _ => {
                let start = j;
                let mut end = j;
                while end < bytes.len() && !bytes[end].is_ascii_whitespace() {
                    end += 1;
                }
                i = end;
                &input[start..end]
            }
        };
        attributes.push((name, crate::entities::decode(value)));
    }

    attributes
}
