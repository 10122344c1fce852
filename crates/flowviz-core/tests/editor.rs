use assert_matches::assert_matches;
use flowviz_core::catalog::DataTypeCatalog;
use flowviz_core::editor::{BlockCommand, FlowEditor, FormSource, Outcome, Removal};
use flowviz_core::form::BlockForm;
use flowviz_core::import::{self, ImportError};
use flowviz_core::{Connection, CoreError, Flow};

fn form(id: &str) -> BlockForm {
    BlockForm {
        id: id.to_string(),
        title: format!("Step {id}"),
        icon: "fa-cube".to_string(),
        description: format!("{id} stage"),
        tasks: "read\n\nwrite\n".to_string(),
        ..Default::default()
    }
}

fn editor_with(ids: &[&str]) -> FlowEditor {
    let mut editor = FlowEditor::default();
    for id in ids {
        editor.apply(BlockCommand::Add(form(id))).unwrap();
    }
    editor
}

#[test]
fn import_without_connections_leaves_flow_untouched() {
    let mut editor = editor_with(&["a", "b"]);
    let before = editor.flow().clone();
    let err = editor
        .import_json(r#"{"title":"x","blocks":[]}"#)
        .unwrap_err();
    assert_eq!(err, ImportError::MissingArray("connections"));
    assert_eq!(editor.flow(), &before);
}

#[test]
fn malformed_json_reports_parser_message() {
    let mut editor = FlowEditor::default();
    assert_matches!(editor.import_json("{\"blocks\": ["), Err(ImportError::Parse(msg)) if !msg.is_empty());
}

#[test]
fn duplicate_id_is_rejected() {
    let mut editor = editor_with(&["a"]);
    let err = editor.apply(BlockCommand::Add(form("a"))).unwrap_err();
    assert_matches!(err, CoreError::DuplicateBlock(ref id) if id == "a");
    assert_eq!(editor.flow().blocks.len(), 1);

    // Exact match only: a different case is a different id.
    assert_matches!(editor.apply(BlockCommand::Add(form("A"))), Ok(Outcome::Added(_)));
}

#[test]
fn second_block_adds_one_labelled_connection() {
    let editor = editor_with(&["first", "second"]);
    let connections = &editor.flow().connections;
    assert_eq!(connections.len(), 1);
    let c = &connections[0];
    assert_eq!((c.from.as_str(), c.to.as_str()), ("first", "second"));
    assert!(c.label.contains("first") && c.label.contains("second"));
    assert_eq!(editor.flow().blocks[1].details.tasks, vec!["read", "write"]);
}

#[test]
fn delete_cascades_to_every_touching_connection() {
    let mut editor = editor_with(&["a", "b", "c"]);
    let mut flow = editor.flow().clone();
    flow.connections.push(Connection {
        from: "c".into(),
        to: "b".into(),
        label: "loop".into(),
    });
    editor.load(flow);
    let before = editor.flow().connections.len();
    let touching = editor.flow().connections.iter().filter(|c| c.touches("b")).count();

    assert!(editor.confirm_delete("b"));
    let removal = editor.finish_delete("b");
    assert_eq!(removal.blocks, 1);
    assert_eq!(removal.connections, touching);
    assert_eq!(editor.flow().connections.len(), before - touching);
    assert!(editor.flow().connections.iter().all(|c| !c.touches("b")));
}

#[test]
fn export_import_round_trip_preserves_order() {
    let editor = editor_with(&["x", "y", "z"]);
    let text = editor.export_json();
    assert!(text.contains("\n  \"title\""));

    let mut other = FlowEditor::default();
    other.import_json(&text).unwrap();
    assert_eq!(other.flow().blocks, editor.flow().blocks);
    assert_eq!(other.flow().connections, editor.flow().connections);
    assert_eq!(import::parse_flow(&text).unwrap(), *editor.flow());
}

#[test]
fn deleting_head_of_two_block_flow() {
    let flow: Flow = serde_json::from_str(
        r#"{"blocks":[{"id":"a"},{"id":"b"}],"connections":[{"from":"a","to":"b"}]}"#,
    )
    .unwrap();
    let mut editor = FlowEditor::new(flow);
    editor.request_delete("a");
    editor.confirm_delete("a");
    editor.finish_delete("a");
    let ids: Vec<_> = editor.flow().blocks.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["b"]);
    assert!(editor.flow().connections.is_empty());
}

#[test]
fn load_during_fade_out_keeps_new_flow() {
    let mut editor = editor_with(&["a", "b"]);
    assert!(editor.confirm_delete("a"));

    let incoming: Flow = serde_json::from_str(
        r#"{"blocks":[{"id":"a"},{"id":"z"}],"connections":[{"from":"a","to":"z"}]}"#,
    )
    .unwrap();
    editor.load(incoming.clone());

    let removal = editor.finish_delete("a");
    assert_eq!(removal, Removal::default());
    assert_eq!(editor.flow(), &incoming);
}

#[test]
fn finish_without_confirm_removes_nothing() {
    let mut editor = editor_with(&["a", "b"]);
    let before = editor.flow().clone();
    assert_eq!(editor.finish_delete("a"), Removal::default());
    assert_eq!(editor.flow(), &before);
}

#[test]
fn load_cancels_inline_edit() {
    let mut editor = editor_with(&["a"]);
    assert!(editor.enter_edit("a").is_some());
    editor.import_json(r#"{"blocks":[],"connections":[]}"#).unwrap();
    assert!(!editor.is_editing());
    assert!(editor.inline().is_none());
}

#[test]
fn inline_update_keeps_original_id() {
    let mut editor = editor_with(&["a", "b"]);
    editor.enter_edit("b");
    let mut edited = form("renamed");
    edited.title = "Bravo".into();
    let command = editor.command_for(FormSource::Inline, edited);
    assert_matches!(editor.apply(command), Ok(Outcome::Updated(ref id)) if id == "b");
    assert_eq!(editor.flow().blocks[1].id, "b");
    assert_eq!(editor.flow().blocks[1].title, "Bravo");
}

#[test]
fn rendering_is_idempotent() {
    let editor = editor_with(&["a", "b", "c"]);
    assert_eq!(editor.render(), editor.render());
    assert_eq!(editor.render().find_all_by_class("arrow").len(), 2);
}

#[test]
fn rename_moves_catalog_entry() {
    let mut catalog = DataTypeCatalog::default();
    let labels = catalog.get("utils.py").unwrap().to_vec();
    assert!(catalog.rename("utils.py", "helpers.py"));
    assert!(catalog.get("utils.py").is_none());
    assert_eq!(catalog.get("helpers.py").unwrap(), labels.as_slice());
}
