/// Middleware module
///
/// Bearer access-token authentication for protected scopes.

mod jwt_middleware;

pub use jwt_middleware::{AuthenticatedUser, JwtMiddleware};
