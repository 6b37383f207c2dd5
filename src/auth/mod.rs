/// Authentication module
///
/// Password hashing, access token issue/validation, refresh token
/// persistence and revocation, and the service that ties them together.

mod bearer;
mod claims;
mod jwt;
mod password;
mod refresh_token;
mod service;

pub use bearer::extract_bearer;
pub use claims::{Claims, ISSUER};
pub use jwt::{issue_access_token, validate_access_token, validate_access_token_at, SigningKey};
pub use password::{
    hash_password, reject_unknown_account, validate_password_strength, verify_password,
};
pub use refresh_token::{
    generate_refresh_token, refresh_token_ttl, RefreshTokenStore, TokenState,
    REFRESH_TOKEN_TTL_DAYS,
};
pub use service::{AuthService, TokenPair};
