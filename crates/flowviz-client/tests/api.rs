//! Client tests against an in-process stand-in for the Flowviz server.

use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use flowviz_client::{ClientError, FlowvizClient, LoadSequencer};
use flowviz_core::import::ImportError;
use flowviz_core::theme::Theme;
use flowviz_core::{FileBlock, Flow, FlowKind, NewFileBlock};
use serde_json::{json, Value};

#[derive(Default)]
struct Server {
    blocks: Vec<FileBlock>,
    next_id: i64,
    user_flows: Vec<Value>,
    theme: Option<Value>,
    block_posts: usize,
}

type Shared = Arc<Mutex<Server>>;

fn ok() -> Json<Value> {
    Json(json!({"status": "success"}))
}

async fn list_flows(State(s): State<Shared>) -> Json<Value> {
    let s = s.lock().unwrap();
    let mut flows = vec![json!({"name": "demo", "path": "/examples/demo.json", "type": "example"})];
    for f in &s.user_flows {
        let name = f["title"].as_str().unwrap_or("flow").to_lowercase().replace(' ', "_");
        flows.push(json!({"name": name, "path": format!("/user_flows/{name}.json"), "type": "user"}));
    }
    Json(Value::Array(flows))
}

async fn save_flow(State(s): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let name = body["title"].as_str().unwrap_or("flow").to_lowercase().replace(' ', "_");
    s.lock().unwrap().user_flows.push(body);
    Json(json!({"success": true, "path": format!("/user_flows/{name}.json")}))
}

async fn example(Path(name): Path<String>) -> Result<String, StatusCode> {
    match name.as_str() {
        "demo.json" => Ok(
            r#"{"title":"Demo","description":"","blocks":[{"id":"a"},{"id":"b"}],
                "connections":[{"from":"a","to":"b","label":"go"}]}"#
                .to_string(),
        ),
        "broken.json" => Ok(r#"{"title":"Broken","blocks":[]}"#.to_string()),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

async fn validate(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body.get("connections").is_some_and(Value::is_array) {
        (StatusCode::OK, Json(json!({"valid": true})))
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"valid": false, "error": "JSON must contain a 'connections' array"})),
        )
    }
}

async fn list_blocks(State(s): State<Shared>) -> Json<Vec<FileBlock>> {
    Json(s.lock().unwrap().blocks.clone())
}

async fn add_block(State(s): State<Shared>, Json(body): Json<NewFileBlock>) -> Json<Value> {
    let mut s = s.lock().unwrap();
    s.next_id += 1;
    let id = s.next_id;
    s.blocks.push(FileBlock {
        id,
        filename: body.filename,
        description: body.description,
    });
    ok()
}

async fn replace_blocks(State(s): State<Shared>, Json(body): Json<Vec<FileBlock>>) -> Json<Value> {
    let mut s = s.lock().unwrap();
    s.blocks = body;
    s.block_posts += 1;
    ok()
}

async fn delete_block(State(s): State<Shared>, Path(id): Path<i64>) -> Json<Value> {
    let mut s = s.lock().unwrap();
    let before = s.blocks.len();
    s.blocks.retain(|b| b.id != id);
    if s.blocks.len() == before {
        Json(json!({"status": "error"}))
    } else {
        ok()
    }
}

async fn save_theme(State(s): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    s.lock().unwrap().theme = Some(body);
    ok()
}

async fn reset(State(s): State<Shared>) -> Json<Value> {
    s.lock().unwrap().theme = None;
    ok()
}

async fn spawn() -> (FlowvizClient, Shared) {
    let state = Shared::default();
    let app = Router::new()
        .route("/api/flows", get(list_flows).post(save_flow))
        .route("/examples/{name}", get(example))
        .route("/api/validate-json", post(validate))
        .route("/api/blocks", get(list_blocks).post(replace_blocks))
        .route("/api/blocks/add", post(add_block))
        .route("/api/blocks/{id}", delete(delete_block))
        .route("/api/theme", post(save_theme))
        .route("/api/reset", post(reset))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (FlowvizClient::new(format!("http://{addr}")), state)
}

fn new_file(name: &str) -> NewFileBlock {
    NewFileBlock {
        filename: name.to_string(),
        description: format!("{name} description"),
    }
}

#[tokio::test]
async fn listing_accepts_example_type() {
    let (client, _) = spawn().await;
    let flows = client.list_flows().await.unwrap();
    assert_eq!(flows.len(), 1);
    assert_eq!(flows[0].kind, FlowKind::Builtin);
}

#[tokio::test]
async fn fetch_by_selector_value() {
    let (client, _) = spawn().await;
    let flow = client.fetch_selection("demo").await.unwrap().unwrap();
    assert_eq!(flow.blocks.len(), 2);
    assert_eq!(flow.connections[0].label, "go");
    assert!(client.fetch_selection("custom").await.unwrap().is_none());
}

#[tokio::test]
async fn fetched_document_is_validated() {
    let (client, _) = spawn().await;
    let err = client.fetch_flow("/examples/broken.json").await.unwrap_err();
    assert_matches!(err, ClientError::Invalid(ImportError::MissingArray("connections")));

    let err = client.fetch_flow("/examples/missing.json").await.unwrap_err();
    assert_matches!(err, ClientError::Api { status: 404, .. });
}

#[tokio::test]
async fn saved_flow_appears_in_listing() {
    let (client, _) = spawn().await;
    let flow = Flow {
        title: "My Flow".into(),
        ..Flow::default()
    };
    let ack = client.save_flow(&flow).await.unwrap();
    assert_eq!(ack.path.as_deref(), Some("/user_flows/my_flow.json"));
    let flows = client.list_flows().await.unwrap();
    assert!(flows.iter().any(|f| f.kind == FlowKind::User && f.name == "my_flow"));
}

#[tokio::test]
async fn remote_validation_reports_rejection() {
    let (client, _) = spawn().await;
    let ok = client
        .validate_remote(&json!({"blocks": [], "connections": []}))
        .await
        .unwrap();
    assert!(ok.valid);
    let bad = client.validate_remote(&json!({"blocks": []})).await.unwrap();
    assert!(!bad.valid);
    assert!(bad.error.unwrap().contains("connections"));
}

#[tokio::test]
async fn block_crud_round() {
    let (client, state) = spawn().await;
    client.add_block(&new_file("api.py")).await.unwrap();
    client.add_block(&new_file("db.py")).await.unwrap();
    let blocks = client.list_blocks().await.unwrap();
    assert_eq!(blocks.len(), 2);

    let previous = client.update_block(blocks[0].id, &new_file("gateway.py")).await.unwrap();
    assert_eq!(previous, "api.py");
    let blocks = client.list_blocks().await.unwrap();
    assert_eq!(blocks[0].filename, "gateway.py");
    assert_eq!(blocks[1].filename, "db.py");
    assert_eq!(state.lock().unwrap().block_posts, 1);

    client.delete_block(blocks[1].id).await.unwrap();
    assert_eq!(client.list_blocks().await.unwrap().len(), 1);
}

#[tokio::test]
async fn update_of_unknown_block_posts_nothing() {
    let (client, state) = spawn().await;
    let err = client.update_block(99, &new_file("x.py")).await.unwrap_err();
    assert_matches!(err, ClientError::NotFound(99));
    assert_eq!(state.lock().unwrap().block_posts, 0);
}

#[tokio::test]
async fn unconfirmed_delete_is_rejected() {
    let (client, _) = spawn().await;
    let err = client.delete_block(7).await.unwrap_err();
    assert_matches!(err, ClientError::Rejected { status } if status == "error");
}

#[tokio::test]
async fn theme_save_and_reset() {
    let (client, state) = spawn().await;
    client.save_theme(&Theme::default()).await.unwrap();
    assert_eq!(
        state.lock().unwrap().theme.as_ref().unwrap()["primary_bg"],
        "#0f172a"
    );
    client.reset().await.unwrap();
    assert!(state.lock().unwrap().theme.is_none());
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let client = FlowvizClient::new("http://127.0.0.1:9");
    let err = client.list_blocks().await.unwrap_err();
    assert!(err.is_network());
}

#[tokio::test]
async fn stale_fetch_is_dropped() {
    let (client, _) = spawn().await;
    let seq = LoadSequencer::new();
    let slow = seq.begin();
    let fast = seq.begin();
    let second = client.fetch_flow("/examples/demo.json").await.unwrap();
    let first = client.fetch_flow("/examples/demo.json").await.unwrap();
    assert!(seq.accept(fast, second).is_some());
    assert!(seq.accept(slow, first).is_none());
}
