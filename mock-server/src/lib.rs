//! Fixture API that agreements are verified against in tests.
//!
//! Serves a small user directory with JSON, form-urlencoded and plain-text
//! endpoints so every body encoding the client produces has a counterpart.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const PASSWORD: &str = "s3cret pw";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub roles: Vec<String>,
}

#[derive(Deserialize)]
pub struct CreateUser {
    pub name: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Deserialize)]
pub struct Login {
    pub user: String,
    pub password: String,
}

pub type Db = Arc<RwLock<HashMap<String, User>>>;

/// Users present in every fresh app.
pub fn seed() -> HashMap<String, User> {
    [
        User {
            id: "u-1".to_string(),
            name: "Ada Lovelace".to_string(),
            roles: vec!["admin".to_string()],
        },
        User {
            id: "u-2".to_string(),
            name: "Grace Hopper".to_string(),
            roles: vec!["viewer".to_string()],
        },
    ]
    .into_iter()
    .map(|user| (user.id.clone(), user))
    .collect()
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(seed()));
    Router::new()
        .route("/health", get(health))
        .route("/users", post(create_user))
        .route("/users/{id}", get(get_user))
        .route("/login", post(login))
        .route("/notes/{id}", put(put_note))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn health() -> &'static str {
    "ok"
}

async fn get_user(State(db): State<Db>, Path(id): Path<String>) -> Response {
    match db.read().await.get(&id) {
        Some(user) => Json(user.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"error": "not found"}))).into_response(),
    }
}

async fn create_user(State(db): State<Db>, Json(input): Json<CreateUser>) -> Response {
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: input.name,
        roles: input.roles,
    };
    db.write().await.insert(user.id.clone(), user.clone());
    let location = format!("/users/{}", user.id);
    (
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(user),
    )
        .into_response()
}

async fn login(Form(input): Form<Login>) -> Response {
    if input.password != PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid credentials"})),
        )
            .into_response();
    }
    Json(json!({"user": input.user, "authenticated": true})).into_response()
}

async fn put_note(Path(id): Path<String>, body: String) -> String {
    format!("note {id}: {body}")
}
