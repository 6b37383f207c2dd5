use actix_web::{web, HttpResponse};

use crate::auth::AuthService;
use crate::error::AppError;

/// POST /admin/reset
///
/// Deletes every refresh token. 403 unless the platform is `dev`.
pub async fn reset(auth: web::Data<AuthService>) -> Result<HttpResponse, AppError> {
    auth.reset().await?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("reset refresh tokens\n"))
}
