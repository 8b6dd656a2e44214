//! One function per backend route, layered on [`ApiClient`].
//!
//! Every call goes through the client's interceptor chain, so none of these
//! functions touch the credential. Path parameters are checked before they
//! are spliced into a URL.
//!
//! ERROR HANDLING
//! ==============
//! Failures come back as `ApiError` unchanged. Routes that answer with a
//! bare message return the `ApiResponse` so callers can show
//! `ApiResponse::message`.

use std::path::Path;

use reqwest::Method;
use serde_json::{Value, json};

use super::ApiError;
use super::pipeline::{ApiClient, ApiResponse};
use super::types::{
    ApprovalStatus, Credentials, FileAccess, FileList, FolderContents, LoginResponse, Page, Plan, SearchRequest,
    ShareLink, ShareSettings, UserProfile,
};

fn path_segment(id: &str) -> Result<&str, ApiError> {
    let valid = !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid && id != "." && id != ".." {
        Ok(id)
    } else {
        Err(ApiError::InvalidUrl(format!("invalid path parameter: {id:?}")))
    }
}

fn endpoint(prefix: &str, id: &str) -> Result<String, ApiError> {
    Ok(format!("{prefix}/{}", path_segment(id)?))
}

async fn read_upload(path: &Path) -> Result<(String, Vec<u8>), ApiError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| ApiError::Io {
        context: format!("failed to read {}", path.display()),
        source,
    })?;
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    Ok((name, bytes))
}

fn team_query(team_id: Option<&str>) -> Vec<(&'static str, String)> {
    team_id.map(|team| ("team_id", team.to_owned())).into_iter().collect()
}

// ---------------------------------------------------------------------------
// auth / user
// ---------------------------------------------------------------------------

/// `POST /api/auth/login`.
pub async fn login(client: &ApiClient, credentials: &Credentials<'_>) -> Result<LoginResponse, ApiError> {
    let request = client.request(Method::POST, "/api/auth/login").json(credentials);
    client.dispatch(request).await?.json()
}

/// `POST /api/auth/register`. The backend answers with a plain message.
pub async fn register(client: &ApiClient, credentials: &Credentials<'_>) -> Result<ApiResponse, ApiError> {
    client.dispatch(client.request(Method::POST, "/api/auth/register").json(credentials)).await
}

pub async fn fetch_profile(client: &ApiClient) -> Result<UserProfile, ApiError> {
    client.send_json(Method::GET, "/api/user/get", None).await
}

pub async fn change_plan(client: &ApiClient, plan: Plan) -> Result<ApiResponse, ApiError> {
    client.send(Method::PUT, "/api/user/plan/change", Some(&json!({ "plan": plan }))).await
}

/// Replace the user's avatar with a local image, sent as multipart `file`.
/// The backend accepts jpeg, png and webp up to 5 MB and answers with a
/// message only.
pub async fn upload_avatar(client: &ApiClient, path: &Path) -> Result<ApiResponse, ApiError> {
    let (name, bytes) = read_upload(path).await?;
    let form = reqwest::multipart::Form::new().part("file", reqwest::multipart::Part::bytes(bytes).file_name(name));
    client.dispatch(client.request(Method::POST, "/api/user/avatar/upload").multipart(form)).await
}

/// Delete the signed-in account. The backend re-checks the password.
pub async fn delete_account(client: &ApiClient, password: &str) -> Result<ApiResponse, ApiError> {
    client.send(Method::DELETE, "/api/user/delete", Some(&json!({ "password": password }))).await
}

// ---------------------------------------------------------------------------
// files
// ---------------------------------------------------------------------------

pub async fn list_files(client: &ApiClient, page: Page, team_id: Option<&str>) -> Result<FileList, ApiError> {
    let mut query = page.query();
    query.extend(team_query(team_id));
    let request = client.request(Method::GET, "/api/file/get").query(&query);
    client.dispatch(request).await?.json()
}

pub async fn search_files(client: &ApiClient, search: &SearchRequest<'_>) -> Result<ApiResponse, ApiError> {
    client.dispatch(client.request(Method::POST, "/api/file/search").json(search)).await
}

pub async fn rename_file(client: &ApiClient, file_id: &str, name: &str) -> Result<ApiResponse, ApiError> {
    let path = endpoint("/api/file/rename", file_id)?;
    client.send(Method::PUT, &path, Some(&json!({ "name": name }))).await
}

pub async fn delete_file(client: &ApiClient, file_id: &str) -> Result<ApiResponse, ApiError> {
    client.send(Method::DELETE, &endpoint("/api/file/delete", file_id)?, None).await
}

/// `GET /api/file/download/:id`, returning the file's bytes.
pub async fn download_file(client: &ApiClient, file_id: &str) -> Result<Vec<u8>, ApiError> {
    client.get_bytes(&endpoint("/api/file/download", file_id)?).await
}

/// Upload a local file as multipart `file`. `file_name` defaults to the
/// path's file name.
pub async fn upload_file(
    client: &ApiClient,
    path: &Path,
    file_name: Option<&str>,
    folder_id: Option<&str>,
) -> Result<ApiResponse, ApiError> {
    let (default_name, bytes) = read_upload(path).await?;
    let name = file_name.map_or(default_name, str::to_owned);

    let part = reqwest::multipart::Part::bytes(bytes).file_name(name.clone());
    let mut form = reqwest::multipart::Form::new().part("file", part).text("file_name", name);
    if let Some(folder_id) = folder_id {
        form = form.text("folder_id", path_segment(folder_id)?.to_owned());
    }

    tracing::debug!(path = %path.display(), "uploading file");
    client.dispatch(client.request(Method::POST, "/api/file/create").multipart(form)).await
}

/// Resolve a share link. With a password the backend expects a POST body.
pub async fn open_shared_file(
    client: &ApiClient,
    short_url: &str,
    password: Option<&str>,
) -> Result<FileAccess, ApiError> {
    let path = endpoint("/api/file/get", short_url)?;
    let response = match password {
        Some(password) => client.send(Method::POST, &path, Some(&json!({ "password": password }))).await?,
        None => client.send(Method::GET, &path, None).await?,
    };
    response.json()
}

/// `POST /api/file/settings/create/:id`, returning the new short URL.
pub async fn create_share_settings(
    client: &ApiClient,
    file_id: &str,
    settings: &ShareSettings,
) -> Result<ShareLink, ApiError> {
    let path = endpoint("/api/file/settings/create", file_id)?;
    client.send_form(Method::POST, &path, &settings.form()).await?.json()
}

// ---------------------------------------------------------------------------
// folders
// ---------------------------------------------------------------------------

pub async fn list_folders(client: &ApiClient, team_id: Option<&str>) -> Result<Value, ApiError> {
    let request = client.request(Method::GET, "/api/folder/get").query(&team_query(team_id));
    Ok(client.dispatch(request).await?.body)
}

pub async fn create_folder(client: &ApiClient, name: &str, team_id: Option<&str>) -> Result<ApiResponse, ApiError> {
    let body = json!({ "name": name, "team_id": team_id.unwrap_or_default() });
    client.send(Method::POST, "/api/folder/create", Some(&body)).await
}

pub async fn folder_contents(client: &ApiClient, folder_id: &str) -> Result<FolderContents, ApiError> {
    client.send_json(Method::GET, &endpoint("/api/folder/get", folder_id)?, None).await
}

pub async fn rename_folder(client: &ApiClient, folder_id: &str, name: &str) -> Result<ApiResponse, ApiError> {
    let path = endpoint("/api/folder/rename", folder_id)?;
    client.send(Method::PUT, &path, Some(&json!({ "name": name }))).await
}

pub async fn delete_folder(client: &ApiClient, folder_id: &str) -> Result<ApiResponse, ApiError> {
    client.send(Method::DELETE, &endpoint("/api/folder/delete", folder_id)?, None).await
}

// ---------------------------------------------------------------------------
// approvals
// ---------------------------------------------------------------------------

/// Ask the owner of an approvable file for access.
pub async fn request_approval(client: &ApiClient, file_id: &str, reason: &str) -> Result<ApiResponse, ApiError> {
    let body = json!({ "file_id": path_segment(file_id)?, "reason": reason });
    client.send(Method::POST, "/api/approval/create", Some(&body)).await
}

pub async fn update_approval_status(
    client: &ApiClient,
    approval_id: &str,
    status: ApprovalStatus,
) -> Result<ApiResponse, ApiError> {
    let body = json!({ "approval_id": path_segment(approval_id)?, "status": status });
    client.send(Method::PUT, "/api/approval/status", Some(&body)).await
}

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;
