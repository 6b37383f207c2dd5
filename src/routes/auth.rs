/// Authentication Routes
///
/// Thin HTTP adapters over [`AuthService`]. Refresh and revoke take the
/// refresh token from `Authorization: Bearer <token>`.

use actix_web::{http::header::AUTHORIZATION, web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{extract_bearer, AuthService};
use crate::error::AppError;
use crate::middleware::AuthenticatedUser;

/// Registration and login request body
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub id: Uuid,
    pub email: String,
    pub token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

#[derive(Serialize)]
pub struct AccessTokenResponse {
    pub token: String,
}

#[derive(Serialize)]
pub struct CurrentUserResponse {
    pub id: Uuid,
}

fn bearer_token(req: &HttpRequest) -> Result<&str, AppError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());
    Ok(extract_bearer(header)?)
}

/// POST /api/users
///
/// # Errors
/// - 400: invalid email or weak password
/// - 409: email already registered
pub async fn register(
    form: web::Json<CredentialsRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let credential = auth.register(&form.email, &form.password).await?;

    Ok(HttpResponse::Created().json(UserResponse {
        id: credential.subject_id,
        email: credential.email,
    }))
}

/// POST /api/login
///
/// # Errors
/// - 401: unknown email or wrong password, indistinguishably
pub async fn login(
    form: web::Json<CredentialsRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let pair = auth.login(&form.email, &form.password).await?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        id: pair.subject_id,
        email: pair.email,
        token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: "Bearer",
        expires_in: pair.expires_in,
    }))
}

/// POST /api/refresh
///
/// # Errors
/// - 401: missing header, unknown, expired or revoked refresh token
pub async fn refresh(
    req: HttpRequest,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let refresh_token = bearer_token(&req)?;
    let token = auth.refresh_access_token(refresh_token).await?;

    Ok(HttpResponse::Ok().json(AccessTokenResponse { token }))
}

/// POST /api/revoke
///
/// 204 whether or not the token was already revoked.
pub async fn revoke(
    req: HttpRequest,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let refresh_token = bearer_token(&req)?;
    auth.logout(refresh_token).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/me
///
/// Requires a valid access token; the subject is injected by `JwtMiddleware`.
pub async fn current_user(user: web::ReqData<AuthenticatedUser>) -> HttpResponse {
    HttpResponse::Ok().json(CurrentUserResponse { id: user.0 })
}
