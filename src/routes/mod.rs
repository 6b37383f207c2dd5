mod admin;
mod auth;
mod health_check;

pub use admin::reset;
pub use auth::{current_user, login, refresh, register, revoke};
pub use health_check::health_check;
