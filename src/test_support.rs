//! In-process stand-in for the backend, used by the pipeline/api/auth tests.
//!
//! Routes:
//! - `POST /api/auth/login`: `alice`/`pw` gets token `tok-alice`, anything else 401
//! - `POST /api/auth/register`: plain-text message; username `taken` gets 400
//! - `GET /set-cookie`: sets `sid=abc`
//! - `GET /plain`: plain-text body
//! - `GET /status/{code}`: empty response with that status
//! - `GET|POST /api/file/get/{id}`: share lookup; id `locked` needs password `secret`
//! - `POST /api/file/settings/create/{id}`: short URL `s-{id}`
//! - `GET /api/file/download/{id}`, `GET /api/folder/get/{id}`
//! - `GET /api/user/get`: current avatar, `/avatars/alice.png` until replaced
//! - `POST /api/user/avatar/upload`: avatar becomes `/avatars/{uploaded file name}`
//! - `DELETE /api/user/delete`: needs password `pw`
//! - everything else: echoes method, path, query, `Authorization`, `Cookie`
//!   and body as JSON; under `/api/` it first requires `Authorization: tok-alice`

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use serde_json::{Value, json};

use crate::config::ClientConfig;
use crate::net::ApiClient;
use crate::session::{Session, StorageRepository, UserFields, UserId};
use crate::storage::MemoryStorage;

pub const VALID_TOKEN: &str = "tok-alice";

type Avatar = Arc<Mutex<String>>;

pub async fn spawn_backend() -> String {
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/set-cookie", get(|| async { ([(header::SET_COOKIE, "sid=abc; Path=/")], "ok") }))
        .route("/plain", get(|| async { "file uploaded successfully\n" }))
        .route("/status/{code}", get(status))
        .route("/api/file/get/{id}", get(shared_file).post(shared_file))
        .route("/api/file/settings/create/{id}", post(share_settings))
        .route("/api/file/download/{id}", get(download))
        .route("/api/folder/get/{id}", get(folder))
        .route("/api/user/get", get(profile))
        .route("/api/user/avatar/upload", post(upload_avatar))
        .route("/api/user/delete", delete(delete_account))
        .fallback(echo)
        .with_state(Arc::new(Mutex::new("/avatars/alice.png".to_owned())));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn memory_session() -> Arc<Session> {
    Arc::new(Session::restore(StorageRepository::new(MemoryStorage::new())))
}

pub fn sign_in(session: &Session, token: &str) {
    session
        .set_user(UserFields {
            id: UserId::from("65f1"),
            username: "alice".to_owned(),
            plan: "free".to_owned(),
            token: token.to_owned(),
            avatar_url: None,
        })
        .unwrap();
}

pub fn client(base_url: &str, session: &Arc<Session>) -> ApiClient {
    let config = ClientConfig { api_base_url: base_url.to_owned(), ..ClientConfig::default() };
    ApiClient::new(&config, Arc::clone(session)).unwrap()
}

async fn login(body: String) -> Response {
    let input: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    if input["username"] == "alice" && input["password"] == "pw" {
        let out = json!({ "token": VALID_TOKEN, "userId": "65f1", "username": "alice", "plan": "free" });
        return axum::Json(out).into_response();
    }
    (StatusCode::UNAUTHORIZED, "invalid username or password\n").into_response()
}

async fn register(body: String) -> Response {
    let input: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    if input["username"] == "taken" {
        return (StatusCode::BAD_REQUEST, "this username is taken already\n").into_response();
    }
    "user registered successfully".into_response()
}

async fn status(Path(code): Path<u16>) -> StatusCode {
    StatusCode::from_u16(code).unwrap()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) == Some(VALID_TOKEN)
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, "Unauthorized: token is missing\n").into_response()
}

async fn shared_file(method: Method, Path(id): Path<String>, body: String) -> Response {
    let password = if method == Method::POST {
        serde_json::from_str::<Value>(&body).unwrap_or(Value::Null)["password"].as_str().map(str::to_owned)
    } else {
        None
    };
    if id == "locked" && password.as_deref() != Some("secret") {
        return (StatusCode::FORBIDDEN, "password is incorrect\n").into_response();
    }
    axum::Json(json!({ "file_address": format!("/uploads/{id}") })).into_response()
}

async fn share_settings(headers: HeaderMap, Path(id): Path<String>, body: String) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    axum::Json(json!({ "short_url": format!("s-{id}"), "form": body })).into_response()
}

async fn download(headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    format!("contents of {id}").into_response()
}

async fn folder(headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    axum::Json(json!({ "folder_id": id, "folder_name": "reports", "files": [{ "name": "q1.pdf" }] })).into_response()
}

async fn profile(State(avatar): State<Avatar>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let current = avatar.lock().unwrap().clone();
    axum::Json(json!({ "avatar_url": current })).into_response()
}

async fn upload_avatar(State(avatar): State<Avatar>, headers: HeaderMap, body: Bytes) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let text = String::from_utf8_lossy(&body);
    let Some(name) = text.split("filename=\"").nth(1).and_then(|rest| rest.split('"').next()) else {
        return (StatusCode::BAD_REQUEST, "file is missing\n").into_response();
    };
    *avatar.lock().unwrap() = format!("/avatars/{name}");
    axum::Json("user`s avatar uploaded successfully").into_response()
}

async fn delete_account(headers: HeaderMap, body: String) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let input: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    if input["password"] != "pw" {
        return (StatusCode::BAD_REQUEST, "password is incorrect\n").into_response();
    }
    axum::Json("account deleted successfully").into_response()
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    if uri.path().starts_with("/api/") && !authorized(&headers) {
        return unauthorized();
    }
    let authorization = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok());

    let text = String::from_utf8_lossy(&body).into_owned();
    let out = json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "authorization": authorization,
        "cookie": headers.get(header::COOKIE).and_then(|v| v.to_str().ok()),
        "content_type": headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
        "body": serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text)),
    });
    axum::Json(out).into_response()
}
