//! # Merge
//!
//! Folds a freshly converted tree into the one the user has been editing.
//!
//! Ids of two independently parsed trees never agree, so sections are
//! paired by a structural key instead: section kind plus the kind of the
//! first element. Pairing is greedy in incoming order; each incoming section
//! takes the first still-unpaired user section with the same key.
//!
//! For each pair:
//!
//! - identical content (ids and versions aside): the user's section stays;
//! - the user edited the section (`version` above baseline): the user's
//!   section stays, and only columns/elements that have no positional
//!   counterpart on the user side are appended from the incoming one;
//! - otherwise the incoming content replaces it under the user's section id.
//!
//! Unpaired user sections stay where they are. Unpaired incoming sections
//! are appended in order.
//!
//! Two unrelated sections with the same key can be paired with each other.
//! That is accepted: follow-up generations only line up by shape.

use pagekit_document::{shape_of, Column, Document, ElementKind, Page, Section, SectionKind};
use pagekit_markup::ParsedMarkup;
use tracing::{debug, instrument};

/// What two sections must share to be considered the same section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructuralKey<'a> {
    pub kind: SectionKind,
    pub first_element: Option<&'a ElementKind>,
}

pub fn structural_key(section: &Section) -> StructuralKey<'_> {
    StructuralKey {
        kind: section.kind,
        first_element: section.first_element_kind(),
    }
}

#[instrument(skip_all, fields(user = user.len(), incoming = incoming.len()))]
pub fn merge_sections(user: &[Section], incoming: &[Section]) -> Vec<Section> {
    // pairs[u] = index of the incoming section paired with user section u
    let mut pairs: Vec<Option<usize>> = vec![None; user.len()];
    let mut paired = vec![false; incoming.len()];

    for (i, section) in incoming.iter().enumerate() {
        let key = structural_key(section);
        let candidate = user
            .iter()
            .enumerate()
            .find(|(u, candidate)| pairs[*u].is_none() && structural_key(candidate) == key)
            .map(|(u, _)| u);

        if let Some(u) = candidate {
            pairs[u] = Some(i);
            paired[i] = true;
        }
    }

    let mut merged: Vec<Section> = user
        .iter()
        .zip(&pairs)
        .map(|(section, pair)| match pair {
            Some(i) => merge_pair(section, &incoming[*i]),
            None => section.clone(),
        })
        .collect();

    let appended: Vec<Section> = incoming
        .iter()
        .zip(&paired)
        .filter(|(_, paired)| !**paired)
        .map(|(section, _)| section.clone())
        .collect();

    debug!(
        paired = paired.iter().filter(|p| **p).count(),
        appended = appended.len(),
        "Merged sections"
    );
    merged.extend(appended);
    merged
}

/// Merge a page's layout; the page version moves only when the layout does
pub fn merge_page(user: &Page, incoming: &[Section]) -> Page {
    let layout = merge_sections(&user.layout, incoming);
    let mut page = user.clone();
    if layout != page.layout {
        page.layout = layout;
        page.version += 1;
    }
    page
}

/// Merge a global navbar or footer. A slot the incoming markup does not
/// define is kept.
pub fn merge_slot(user: Option<&Section>, incoming: Option<&Section>) -> Option<Section> {
    match (user, incoming) {
        (Some(user), Some(incoming)) => Some(merge_pair(user, incoming)),
        (Some(user), None) => Some(user.clone()),
        (None, incoming) => incoming.cloned(),
    }
}

/// Merge converter output into one page of the document plus the global
/// slots. An unknown page leaves the document unchanged.
#[instrument(skip(doc, incoming), fields(sections = incoming.sections.len()))]
pub fn merge_document(doc: &Document, page_id: &str, incoming: &ParsedMarkup) -> Document {
    let Some(page) = doc.page(page_id) else {
        debug!("Merge target page not found, document unchanged");
        return doc.clone();
    };

    let mut next = doc.clone();
    next.pages
        .insert(page_id.to_string(), merge_page(page, &incoming.sections));
    next.global_navbar = merge_slot(doc.global_navbar.as_ref(), incoming.global_navbar.as_ref());
    next.global_footer = merge_slot(doc.global_footer.as_ref(), incoming.global_footer.as_ref());
    next
}

fn merge_pair(user: &Section, incoming: &Section) -> Section {
    if shape_of(user) == shape_of(incoming) {
        return user.clone();
    }

    if user.is_edited() {
        let mut kept = user.clone();
        overlay_columns(&mut kept.columns, &incoming.columns);
        kept
    } else {
        Section {
            id: user.id.clone(),
            ..incoming.clone()
        }
    }
}

/// Append incoming columns and elements beyond what the user side has at
/// the same position. Existing user nodes are never modified, so edited
/// markup and props survive; inner sections of the same kind recurse.
fn overlay_columns(user: &mut Vec<Column>, incoming: &[Column]) {
    for (i, column) in incoming.iter().enumerate() {
        let Some(existing) = user.get_mut(i) else {
            user.push(column.clone());
            continue;
        };

        let known = existing.elements.len();
        for (j, element) in column.elements.iter().enumerate() {
            if j >= known {
                existing.elements.push(element.clone());
                continue;
            }
            let mine = &mut existing.elements[j];
            if mine.kind != element.kind {
                continue;
            }
            if let (Some(mine), Some(theirs)) = (mine.columns.as_mut(), element.columns.as_ref()) {
                overlay_columns(mine, theirs);
            }
        }
    }
}
