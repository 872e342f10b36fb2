//! A tiny blog API built on [`graphy`], served over HTTP with `axum`.
//!
//! This is a demonstration of the public API, not a production template:
//! the post store is an in-memory `Mutex<HashMap<_>>` that resets on
//! restart.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::routing::post as post_route;
use axum::{Json, Router};
use graphy::{Engine, EngineConfig, GraphyError, GraphyInputObject, GraphyObject, Id};

#[derive(Default)]
struct AppState {
    posts: Mutex<HashMap<String, Post>>,
    next_id: AtomicU64,
}

#[derive(Clone, GraphyObject)]
struct Post {
    id: Id,
    title: String,
    body: String,
}

#[derive(Clone, GraphyInputObject)]
struct CreatePostInput {
    title: String,
    body: String,
}

async fn get_post(state: Arc<AppState>, id: Id) -> Result<Option<Post>, GraphyError> {
    Ok(state.posts.lock().expect("post store lock poisoned").get(&id.0).cloned())
}

async fn list_posts(state: Arc<AppState>) -> Result<Vec<Post>, GraphyError> {
    let posts = state.posts.lock().expect("post store lock poisoned");
    let mut posts: Vec<Post> = posts.values().cloned().collect();
    posts.sort_by(|a, b| a.id.0.cmp(&b.id.0));
    Ok(posts)
}

async fn create_post(state: Arc<AppState>, input: CreatePostInput) -> Result<Post, GraphyError> {
    let id = state.next_id.fetch_add(1, Ordering::Relaxed).to_string();
    let post = Post { id: Id(id.clone()), title: input.title, body: input.body };
    state.posts.lock().expect("post store lock poisoned").insert(id, post.clone());
    Ok(post)
}

fn build_engine() -> Engine<AppState> {
    let engine = Engine::new(EngineConfig::default());
    engine.register_query("post", &["id"], get_post);
    engine.register_query("posts", &[], list_posts);
    engine.register_mutation("createPost", &["input"], create_post);
    engine.enable_introspection();
    engine
}

#[derive(serde::Deserialize)]
struct GraphQLRequest {
    query: String,
    #[serde(rename = "operationName")]
    operation_name: Option<String>,
    variables: Option<serde_json::Value>,
}

#[derive(Clone)]
struct AppContext {
    engine: Arc<Engine<AppState>>,
    state: Arc<AppState>,
}

async fn graphql_handler(State(ctx): State<AppContext>, Json(request): Json<GraphQLRequest>) -> Json<serde_json::Value> {
    let response = ctx
        .engine
        .process_request(ctx.state.clone(), &request.query, request.operation_name.as_deref(), request.variables)
        .await;
    Json(response)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let ctx = AppContext { engine: Arc::new(build_engine()), state: Arc::new(AppState::default()) };
    let app = Router::new().route("/graphql", post_route(graphql_handler)).with_state(ctx);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.expect("bind graphql listener");
    tracing::info!("graphy demo listening on 0.0.0.0:8080");
    axum::serve(listener, app).await.expect("serve graphql app");
}
