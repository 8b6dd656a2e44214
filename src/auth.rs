//! Sign-in, sign-up and sign-out against the backend.
//!
//! These are the only callers of the `Session` mutations outside of tests.
//! A successful login writes the returned identity and token into the
//! session in one step, so the next dispatched request already carries the
//! new credential.
//!
//! Anything that writes to the session after awaiting the backend goes
//! through `update_profile` / `clear_user_if` with the token captured before
//! the request. A logout or a different login in the meantime wins.

use std::path::Path;

use crate::net::types::{Credentials, Plan};
use crate::net::{ApiClient, ApiError, ApiResponse, api};
use crate::session::{ProfileUpdate, Session, SessionError, SessionState, UserFields};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("not logged in")]
    NotSignedIn,
}

/// Log in and store the returned user in the client's session.
///
/// The avatar is not part of the login response, so it is fetched afterwards.
/// A failed avatar fetch is logged and otherwise ignored; the user stays
/// signed in with an empty avatar. The avatar is only stored if this login's
/// token is still current, so a logout during the fetch sticks.
pub async fn login(client: &ApiClient, username: &str, password: &str) -> Result<SessionState, AuthError> {
    let response = api::login(client, &Credentials { username, password }).await?;
    let fields = UserFields::from(response);
    let token = fields.token.clone();
    let needs_avatar = fields.avatar_url.is_none();
    let session = client.session();
    session.set_user(fields)?;

    if needs_avatar {
        match api::fetch_profile(client).await {
            Ok(profile) => {
                let update = ProfileUpdate { avatar_url: Some(profile.avatar_url), ..ProfileUpdate::default() };
                if !session.update_profile(&token, update)? {
                    tracing::info!("session changed during login; avatar not stored");
                }
            }
            Err(error) => tracing::warn!(%error, "failed to fetch avatar after login"),
        }
    }

    let state = session.snapshot()?;
    tracing::info!(user = %state.username, plan = %state.plan, "logged in");
    Ok(state)
}

/// Switch the signed-in user's plan and record it in the session.
///
/// The session only changes if the user who asked is still signed in when
/// the backend answers.
pub async fn change_plan(client: &ApiClient, plan: Plan) -> Result<ApiResponse, AuthError> {
    let token = current_token(client.session())?;
    let response = api::change_plan(client, plan).await?;
    let update = ProfileUpdate { plan: Some(plan.as_str().to_owned()), ..ProfileUpdate::default() };
    if client.session().update_profile(&token, update)? {
        tracing::info!(%plan, "plan changed");
    }
    Ok(response)
}

/// Upload a new avatar and store the address the backend assigned to it.
///
/// The upload response carries no address, so the profile is re-read.
/// Returns the stored avatar URL.
pub async fn upload_avatar(client: &ApiClient, path: &Path) -> Result<String, AuthError> {
    let token = current_token(client.session())?;
    api::upload_avatar(client, path).await?;
    let profile = api::fetch_profile(client).await?;
    let update = ProfileUpdate { avatar_url: Some(profile.avatar_url.clone()), ..ProfileUpdate::default() };
    if client.session().update_profile(&token, update)? {
        tracing::info!(avatar_url = %profile.avatar_url, "avatar updated");
    }
    Ok(profile.avatar_url)
}

/// Delete the signed-in account on the backend, then sign out locally.
pub async fn delete_account(client: &ApiClient, password: &str) -> Result<String, AuthError> {
    let token = current_token(client.session())?;
    let response = api::delete_account(client, password).await?;
    if client.session().clear_user_if(&token)? {
        tracing::info!("account deleted; session cleared");
    }
    Ok(response.message().unwrap_or("account deleted").to_owned())
}

fn current_token(session: &Session) -> Result<String, AuthError> {
    session.token()?.ok_or(AuthError::NotSignedIn)
}

/// Create an account. Does not sign in; returns the backend's message.
pub async fn register(client: &ApiClient, username: &str, password: &str) -> Result<String, AuthError> {
    let response = api::register(client, &Credentials { username, password }).await?;
    tracing::info!(user = %username, "registered");
    Ok(response.message().unwrap_or("registered").to_owned())
}

/// Forget the current user. The backend keeps no server-side session, so
/// this is purely local.
pub fn logout(session: &Session) -> Result<(), AuthError> {
    session.clear_user()?;
    tracing::info!("logged out");
    Ok(())
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;
