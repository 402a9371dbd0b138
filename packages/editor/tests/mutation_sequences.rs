//! Properties that must hold across sequences of mutations
//!
//! This tests:
//! - Insert followed by delete of the inserted node
//! - Move keeps every node exactly once
//! - Undo/redo over long edit chains
//! - Merge keeps edited sections

use pagekit_document::{
    path_of, shape_of, walk, Document, ElementKind, IdGenerator, Node, NodeFactory, NodePath,
    Props, Section,
};
use pagekit_editor::{
    delete, insert, merge_sections, move_node, set_structure, Editor, EditorConfig, Mutation,
};
use pagekit_markup::{parse_markup, Codec};
use serde_json::json;
use std::collections::BTreeMap;

/// Page with three sections of 1, 2 and 3 columns, two headings per column
fn populated() -> (Document, NodeFactory, String) {
    let mut factory = NodeFactory::with_ids(IdGenerator::from_seed("seq"));
    let page = factory.create_page("Home");
    let page_id = page.id.clone();
    let mut doc = Document::new(page);

    for (s, widths) in [vec![100.0], vec![50.0, 50.0], vec![25.0, 50.0, 25.0]]
        .into_iter()
        .enumerate()
    {
        doc = insert(
            &doc,
            &NodePath::page(&page_id),
            Node::Section(factory.create_section()),
            None,
            &mut factory,
        );
        let section = NodePath::page(&page_id).layout(s);
        doc = set_structure(&doc, &section, &widths, &mut factory);
        for c in 0..widths.len() {
            for n in 0..2 {
                let mut props = Props::new();
                props.insert("text".to_string(), json!(format!("s{}c{}n{}", s, c, n)));
                let element = factory.create_element_with(ElementKind::Heading, &props);
                doc = insert(
                    &doc,
                    &section.clone().column(c),
                    Node::Element(element),
                    None,
                    &mut factory,
                );
            }
        }
    }
    (doc, factory, page_id)
}

/// id → number of occurrences
fn id_counts(doc: &Document) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for (_, node) in walk(doc) {
        *counts.entry(node.id().to_string()).or_insert(0) += 1;
    }
    counts
}

fn containers(page: &str) -> Vec<NodePath> {
    let mut paths = Vec::new();
    for (s, columns) in [1, 2, 3].into_iter().enumerate() {
        for c in 0..columns {
            paths.push(NodePath::page(page).layout(s).column(c));
        }
    }
    paths
}

#[test]
fn test_insert_then_delete_is_identity() {
    let (doc, mut factory, page) = populated();

    for target in containers(&page) {
        for index in [0, 1, 2, 9] {
            let element = factory.create_element(ElementKind::Button);
            let id = element.id.clone();

            let inserted = insert(&doc, &target, Node::Element(element), Some(index), &mut factory);
            let path = path_of(&inserted, &id).expect("inserted node has a path");
            let removed = delete(&inserted, &path);

            assert_eq!(shape_of(&removed), shape_of(&doc), "{} @ {}", target, index);
        }
    }

    // a whole section too
    let section = factory.create_section_with_column();
    let id = section.id.clone();
    let inserted = insert(&doc, &NodePath::page(&page), Node::Section(section), Some(1), &mut factory);
    let removed = delete(&inserted, &path_of(&inserted, &id).unwrap());
    assert_eq!(shape_of(&removed), shape_of(&doc));
}

#[test]
fn test_move_keeps_every_node_exactly_once() {
    let (doc, _, page) = populated();
    let before = id_counts(&doc);
    let element_ids: Vec<String> = doc.pages[&page]
        .layout
        .iter()
        .flat_map(|s| &s.columns)
        .flat_map(|c| &c.elements)
        .map(|e| e.id.clone())
        .collect();

    let mut current = doc.clone();
    for (i, id) in element_ids.iter().enumerate() {
        let targets = containers(&page);
        let dest = &targets[(i * 5) % targets.len()];
        current = move_node(&current, id, dest, i % 3);

        let counts = id_counts(&current);
        assert_eq!(counts, before, "after moving {}", id);
        assert!(counts.values().all(|n| *n == 1));
    }
    assert_eq!(current.element_count(), doc.element_count());
}

#[test]
fn test_moving_sections_keeps_every_node_exactly_once() {
    let (doc, _, page) = populated();
    let before = id_counts(&doc);
    let first = doc.pages[&page].layout[0].id.clone();
    let last = doc.pages[&page].layout[2].id.clone();

    let moved = move_node(&doc, &first, &NodePath::page(&page), 2);
    assert_eq!(moved.pages[&page].layout[2].id, first);
    let moved = move_node(&moved, &last, &NodePath::page(&page), 0);
    assert_eq!(moved.pages[&page].layout[0].id, last);

    assert_eq!(id_counts(&moved), before);
}

#[test]
fn test_undo_all_then_redo_all() {
    let (doc, _, page) = populated();
    let mut editor = Editor::new(doc, EditorConfig::default());
    let mut states = vec![editor.document().clone()];

    let first_element = editor.document().pages[&page].layout[0].columns[0].elements[0]
        .id
        .clone();
    let mut patch = Props::new();
    patch.insert("text".to_string(), json!("Changed"));

    let mutations = vec![
        Mutation::Move {
            node_id: first_element.clone(),
            dest: NodePath::page(&page).layout(2).column(1),
            index: 1,
        },
        Mutation::UpdateProps {
            node_id: first_element.clone(),
            patch,
        },
        Mutation::Duplicate {
            node_id: first_element,
        },
        Mutation::Reorder {
            container: NodePath::page(&page),
            from: 2,
            to: 0,
        },
        Mutation::SetStructure {
            section: NodePath::page(&page).layout(1),
            widths: vec![30.0, 70.0],
        },
        Mutation::Delete {
            path: NodePath::page(&page).layout(0),
        },
    ];

    for mutation in &mutations {
        assert!(editor.apply(mutation), "{} changed nothing", mutation.label());
        states.push(editor.document().clone());
    }

    for expected in states.iter().rev().skip(1) {
        assert!(editor.undo());
        assert_eq!(editor.document(), expected);
    }
    assert!(!editor.undo());

    for expected in states.iter().skip(1) {
        assert!(editor.redo());
        assert_eq!(editor.document(), expected);
    }
    assert!(!editor.redo());
}

#[test]
fn test_history_limit_bounds_undo_depth() {
    let (doc, mut factory, page) = populated();
    let mut editor = Editor::new(
        doc,
        EditorConfig {
            history_limit: 3,
            ..EditorConfig::default()
        },
    );

    for _ in 0..5 {
        let section = factory.create_section();
        editor.apply(&Mutation::Insert {
            target: NodePath::page(&page),
            node: Node::Section(section),
            index: None,
        });
    }

    assert_eq!(editor.history().len(), 3);
    assert!(editor.undo());
    assert!(editor.undo());
    assert!(!editor.undo());
    assert_eq!(editor.document().pages[&page].layout.len(), 3 + 3);
}

fn edited(mut section: Section) -> Section {
    section.version += 1;
    section
}

#[test]
fn test_merge_keeps_edited_markup_for_any_incoming_markup() {
    let mut user_ids = NodeFactory::with_ids(IdGenerator::from_seed("user"));
    let user = parse_markup(
        "<section><p>Hand-tuned copy</p></section><div><img src=\"/logo.png\"></div>",
        Codec::Lossless,
        &mut user_ids,
    );
    let user_sections: Vec<Section> = user.sections.into_iter().map(edited).collect();

    for variant in ["<p>Generated</p>", "<p>Other</p><p>More</p>", ""] {
        let mut gen_ids = NodeFactory::with_ids(IdGenerator::from_seed(variant));
        let incoming = parse_markup(
            &format!("<section>{}</section><div><img src=\"/new.png\"></div>", variant),
            Codec::Lossless,
            &mut gen_ids,
        );

        let merged = merge_sections(&user_sections, &incoming.sections);
        assert_eq!(merged, user_sections, "variant {:?}", variant);
    }
}
