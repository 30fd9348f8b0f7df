use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::{
    api::state::AppState, domain::Profile, error::AppError, repository::ProfileRepository,
};

#[derive(Clone)]
pub struct CurrentUser {
    pub profile: Profile,
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.to_string())
        .ok_or(AppError::AuthenticationRequired)?;

    let profile_id = state
        .services
        .session_store
        .authenticate(&token)
        .await?
        .ok_or(AppError::AuthenticationRequired)?;

    let profile = state
        .services
        .profile_repo
        .find_by_id(profile_id)
        .await?
        .ok_or(AppError::AuthenticationRequired)?;

    // Insert current user into request extensions
    request.extensions_mut().insert(CurrentUser { profile });

    Ok(next.run(request).await)
}
