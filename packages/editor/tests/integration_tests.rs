//! End-to-end editing sessions through the `Editor` facade

use pagekit_document::{
    path_of, resolve, shape_of, walk, ElementKind, Node, NodePath, NodeRef, Props,
};
use std::collections::HashSet;
use pagekit_editor::{
    Editor, EditorConfig, EditorError, GenerationOutcome, GenerationResponse, GenerationSession,
    Mutation,
};
use pagekit_markup::Codec;
use serde_json::json;

fn config() -> EditorConfig {
    EditorConfig {
        id_prefix: Some("integration".to_string()),
        ..EditorConfig::default()
    }
}

/// One page holding a single empty section
fn editor_with_empty_section() -> (Editor, String) {
    let mut editor = Editor::blank("Home", config());
    let page = editor.document().active_page_id.clone();
    let section = editor.factory_mut().create_section();
    assert!(editor.apply(&Mutation::Insert {
        target: NodePath::page(&page),
        node: Node::Section(section),
        index: None,
    }));
    (editor, page)
}

fn element_counts(editor: &Editor, page: &str) -> Vec<usize> {
    editor.document().pages[page].layout[0]
        .columns
        .iter()
        .map(|c| c.elements.len())
        .collect()
}

#[test]
fn test_structure_insert_move_delete_undo_sequence() {
    let (mut editor, page) = editor_with_empty_section();
    let section = NodePath::page(&page).layout(0);

    // two 50% columns
    assert!(editor.apply(&Mutation::SetStructure {
        section: section.clone(),
        widths: vec![50.0, 50.0],
    }));
    let layout = &editor.document().pages[&page].layout;
    assert_eq!(layout.len(), 1);
    assert_eq!(element_counts(&editor, &page), vec![0, 0]);
    let after_structure = editor.document().clone();

    // heading into column 0
    let mut props = Props::new();
    props.insert("text".to_string(), json!("Welcome"));
    let heading = editor
        .factory_mut()
        .create_element_with(ElementKind::Heading, &props);
    let heading_id = heading.id.clone();
    assert!(editor.apply(&Mutation::Insert {
        target: section.clone().column(0),
        node: Node::Element(heading),
        index: None,
    }));
    let at = section.clone().column(0).element(0);
    assert!(matches!(
        resolve(editor.document(), &at),
        Some(NodeRef::Element(e)) if e.id == heading_id
    ));

    // move it to column 1, index 0
    assert!(editor.apply(&Mutation::Move {
        node_id: heading_id.clone(),
        dest: section.clone().column(1),
        index: 0,
    }));
    assert_eq!(element_counts(&editor, &page), vec![0, 1]);
    assert_eq!(
        editor.document().pages[&page].layout[0].columns[1].elements[0].id,
        heading_id
    );
    let after_move = editor.document().clone();

    // delete the section
    assert!(editor.apply(&Mutation::Delete { path: section }));
    assert!(editor.document().pages[&page].layout.is_empty());

    // each undo steps back exactly one recorded edit
    assert!(editor.undo());
    assert_eq!(editor.document(), &after_move);
    assert!(editor.undo());
    assert_eq!(element_counts(&editor, &page), vec![1, 0]);
    assert!(editor.undo());
    assert_eq!(editor.document(), &after_structure);

    assert!(editor.redo());
    assert!(editor.redo());
    assert!(editor.redo());
    assert!(editor.document().pages[&page].layout.is_empty());
    assert!(!editor.redo());
}

#[test]
fn test_refused_mutation_records_nothing() {
    let (mut editor, page) = editor_with_empty_section();
    let entries = editor.history().len();

    let missing = NodePath::page(&page).layout(4);
    assert!(!editor.apply(&Mutation::Delete {
        path: missing.clone()
    }));
    assert_eq!(editor.history().len(), entries);

    let error = editor
        .try_apply(&Mutation::Delete { path: missing })
        .unwrap_err();
    assert!(matches!(error, EditorError::Mutation(_)));
}

#[test]
fn test_selection_survives_moves_and_clears_on_delete() {
    let (mut editor, page) = editor_with_empty_section();
    let section_id = editor.document().pages[&page].layout[0].id.clone();
    let second = editor.factory_mut().create_section();
    editor.apply(&Mutation::Insert {
        target: NodePath::page(&page),
        node: Node::Section(second),
        index: Some(0),
    });

    assert!(editor.select(&section_id));
    assert!(!editor.select("nope"));
    assert_eq!(
        editor.selected_path(),
        Some(NodePath::page(&page).layout(1))
    );

    editor.apply(&Mutation::Reorder {
        container: NodePath::page(&page),
        from: 1,
        to: 0,
    });
    assert_eq!(editor.selection(), Some(section_id.as_str()));
    assert_eq!(
        editor.selected_path(),
        Some(NodePath::page(&page).layout(0))
    );

    editor.apply(&Mutation::Delete {
        path: NodePath::page(&page).layout(0),
    });
    assert_eq!(editor.selection(), None);
}

const GENERATED: &str = r#"
<header><div class="font-bold">Acme</div><nav><a href="/">Home</a></nav></header>
<section class="hero"><h1>Ship faster</h1><p>All the things.</p></section>
<section><h2>Pricing</h2><p>Cheap.</p></section>
"#;

const FOLLOW_UP: &str = r#"
<section class="hero"><h1>Ship much faster</h1><p>All the things.</p></section>
<section><h2>Pricing</h2><p>Cheaper.</p></section>
<section><h2>FAQ</h2></section>
"#;

#[test]
fn test_generation_merges_and_respects_user_edits() {
    let mut editor = Editor::blank("Home", config());
    let page = editor.document().active_page_id.clone();
    let mut session = GenerationSession::new("session-1");

    let ticket = editor.begin_generation(&mut session, "Landing page for Acme");
    assert_eq!(ticket.request.prompt, "Landing page for Acme");
    let outcome = editor.accept_generation(
        &session,
        &ticket,
        GenerationResponse {
            html: GENERATED.to_string(),
            summary: Some("Added hero and pricing".to_string()),
            follow_up_suggestions: Some(vec!["Add an FAQ".to_string()]),
        },
        &page,
    );
    assert_eq!(
        outcome,
        GenerationOutcome::Applied {
            summary: Some("Added hero and pricing".to_string()),
            suggestions: vec!["Add an FAQ".to_string()],
        }
    );
    assert_eq!(editor.document().pages[&page].layout.len(), 2);
    assert!(editor.document().global_navbar.is_some());

    // the user edits the hero markup
    let hero = &editor.document().pages[&page].layout[0];
    let hero_id = hero.id.clone();
    let hero_element = hero.columns[0].elements[0].id.clone();
    let mut patch = Props::new();
    patch.insert(
        "originalHtml".to_string(),
        json!("<section class=\"hero\"><h1>Mine</h1></section>"),
    );
    assert!(editor.apply(&Mutation::UpdateProps {
        node_id: hero_element,
        patch,
    }));
    let pricing_id = editor.document().pages[&page].layout[1].id.clone();

    let ticket = editor.begin_generation(&mut session, "Add an FAQ");
    let outcome = editor.accept_generation(
        &session,
        &ticket,
        GenerationResponse {
            html: FOLLOW_UP.to_string(),
            summary: None,
            follow_up_suggestions: None,
        },
        &page,
    );
    assert!(matches!(outcome, GenerationOutcome::Applied { .. }));

    let layout = &editor.document().pages[&page].layout;
    assert_eq!(layout.len(), 3);
    assert_eq!(layout[0].id, hero_id);
    assert_eq!(
        layout[0].columns[0].elements[0].original_html(),
        Some("<section class=\"hero\"><h1>Mine</h1></section>")
    );
    // untouched section follows the generator, under its old id
    assert_eq!(layout[1].id, pricing_id);
    assert!(layout[1].columns[0].elements[0]
        .original_html()
        .unwrap()
        .contains("Cheaper."));
    assert!(layout[2].columns[0].elements[0]
        .original_html()
        .unwrap()
        .contains("FAQ"));
    // the navbar was not part of the follow-up and is kept
    assert!(editor.document().global_navbar.is_some());
}

#[test]
fn test_stale_and_foreign_responses_are_discarded() {
    let mut editor = Editor::blank("Home", config());
    let page = editor.document().active_page_id.clone();
    let mut session = GenerationSession::new("session-1");

    let first = editor.begin_generation(&mut session, "v1");
    let second = editor.begin_generation(&mut session, "v2");
    let before = editor.document().clone();
    let response = GenerationResponse {
        html: GENERATED.to_string(),
        summary: None,
        follow_up_suggestions: None,
    };

    assert_eq!(
        editor.accept_generation(&session, &first, response.clone(), &page),
        GenerationOutcome::Stale
    );
    let other = GenerationSession::new("session-2");
    assert_eq!(
        editor.accept_generation(&other, &second, response.clone(), &page),
        GenerationOutcome::Stale
    );
    assert_eq!(editor.document(), &before);

    assert_eq!(
        editor.accept_generation(&session, &second, response.clone(), "gone"),
        GenerationOutcome::PageMissing("gone".to_string())
    );
    assert!(matches!(
        editor.accept_generation(&session, &second, response, &page),
        GenerationOutcome::Applied { .. }
    ));
}

#[test]
fn test_undo_across_a_generation() {
    let mut editor = Editor::blank("Home", config());
    let page = editor.document().active_page_id.clone();
    let mut session = GenerationSession::new("s");

    let ticket = editor.begin_generation(&mut session, "p");
    editor.accept_generation(
        &session,
        &ticket,
        GenerationResponse {
            html: GENERATED.to_string(),
            summary: None,
            follow_up_suggestions: None,
        },
        &page,
    );
    let generated = editor.document().clone();

    let section = editor.document().pages[&page].layout[1].id.clone();
    editor.apply(&Mutation::Duplicate { node_id: section });
    assert_eq!(editor.document().pages[&page].layout.len(), 3);

    // back to the generated state, restored from its markup
    assert!(editor.undo());
    assert_eq!(
        shape_of(&editor.document().pages[&page].layout),
        shape_of(&generated.pages[&page].layout)
    );
    assert_eq!(
        shape_of(&editor.document().global_navbar),
        shape_of(&generated.global_navbar)
    );

    // back to the blank page
    assert!(editor.undo());
    assert!(editor.document().pages[&page].layout.is_empty());
    assert!(editor.document().global_navbar.is_none());
    assert!(!editor.undo());
}

#[test]
fn test_undo_restores_a_semantic_generation() {
    let mut editor = Editor::blank(
        "Home",
        EditorConfig {
            default_codec: Codec::Semantic,
            ..config()
        },
    );
    let page = editor.document().active_page_id.clone();
    let mut session = GenerationSession::new("s");

    let ticket = editor.begin_generation(&mut session, "hero");
    editor.accept_generation(
        &session,
        &ticket,
        GenerationResponse {
            html: r#"<section class="hero"><h1>Hero</h1><p>Copy</p></section>
<section><div class="grid grid-cols-2"><div><h3>A</h3></div><div><img src="/b.png" alt="B"></div></div></section>"#
                .to_string(),
            summary: None,
            follow_up_suggestions: None,
        },
        &page,
    );
    let generated = editor.document().pages[&page].layout.clone();
    assert_eq!(generated[0].columns[0].elements.len(), 2);
    assert_eq!(generated[1].columns.len(), 2);

    let hero = generated[0].id.clone();
    assert!(editor.apply(&Mutation::Duplicate { node_id: hero }));
    assert!(editor.undo());

    let restored = &editor.document().pages[&page].layout;
    assert_eq!(shape_of(restored), shape_of(&generated));
}

#[test]
fn test_reopened_document_never_reuses_ids() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("site.json");

    let mut editor = Editor::from_markup(
        "<section><h2>A</h2></section><section><h2>B</h2></section>",
        "Home",
        config(),
    );
    editor.save_as(&path).unwrap();

    let mut reopened = Editor::open(&path, config()).unwrap();
    let page = reopened.document().active_page_id.clone();
    assert!(reopened.apply(&Mutation::SetStructure {
        section: NodePath::page(&page).layout(1),
        widths: vec![50.0, 50.0],
    }));
    let heading = reopened.factory_mut().create_element(ElementKind::Heading);
    assert!(reopened.apply(&Mutation::Insert {
        target: NodePath::page(&page).layout(0).column(0),
        node: Node::Element(heading),
        index: None,
    }));

    let mut seen = HashSet::new();
    for (path, node) in walk(reopened.document()) {
        assert!(seen.insert(node.id().to_string()), "{} reused at {}", node.id(), path);
    }
}

#[test]
fn test_editor_paths_follow_the_tree() {
    let (mut editor, page) = editor_with_empty_section();
    let first = editor.document().pages[&page].layout[0].id.clone();
    let second = editor.factory_mut().create_section_with_column();
    editor.apply(&Mutation::Insert {
        target: NodePath::page(&page),
        node: Node::Section(second),
        index: Some(0),
    });

    assert_eq!(editor.path_of(&first), Some(NodePath::page(&page).layout(1)));
    for (path, node) in walk(editor.document()) {
        assert_eq!(editor.path_of(node.id()), Some(path.clone()));
        assert_eq!(path_of(editor.document(), node.id()), Some(path));
    }
    assert_eq!(editor.path_of("missing"), None);
}

#[test]
fn test_open_save_and_render() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("site.json");

    let mut editor = Editor::from_markup(GENERATED, "Home", config());
    assert!(matches!(editor.save(), Err(EditorError::NotFileBacked)));
    editor.save_as(&path).unwrap();
    assert!(!editor.is_dirty());

    let reopened = Editor::open(&path, config()).unwrap();
    assert_eq!(reopened.document(), editor.document());

    let page = reopened.document().active_page_id.clone();
    let authoring = reopened.render(&page).unwrap();
    assert!(authoring.contains("<h1>Ship faster</h1>"));

    let publish = Editor::open(
        &path,
        EditorConfig {
            serialize_mode: pagekit_markup::SerializeMode::Publish,
            ..config()
        },
    )
    .unwrap();
    let html = publish.render(&page).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(!html.contains("data-pb-"));
    assert!(publish.render("missing").is_none());
}

#[test]
fn test_semantic_codec_from_config() {
    let editor = Editor::from_markup(
        GENERATED,
        "Home",
        EditorConfig {
            default_codec: Codec::Semantic,
            ..config()
        },
    );
    let page = editor.document().active_page().unwrap();

    let hero = &page.layout[0].columns[0].elements;
    assert_eq!(hero[0].kind, ElementKind::Heading);
    assert_eq!(hero[0].prop_str("text"), Some("Ship faster"));
    assert_eq!(hero[1].kind, ElementKind::Text);
}

#[test]
fn test_import_into_missing_page_fails() {
    let mut editor = Editor::blank("Home", config());
    assert!(matches!(
        editor.import_markup("<p>x</p>", "missing"),
        Err(EditorError::PageNotFound(_))
    ));
}
