use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::AuthService;
use crate::middleware::JwtMiddleware;
use crate::routes::{current_user, health_check, login, refresh, register, reset, revoke};

pub fn run(listener: TcpListener, auth: AuthService) -> Result<Server, std::io::Error> {
    let auth_data = web::Data::new(auth.clone());

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(auth_data.clone())
            // Admin
            .route("/admin/reset", web::post().to(reset))
            // Bearer-protected routes
            .service(
                web::scope("/api/me")
                    .wrap(JwtMiddleware::new(auth.clone()))
                    .route("", web::get().to(current_user)),
            )
            // Public routes
            .service(
                web::scope("/api")
                    .route("/healthz", web::get().to(health_check))
                    .route("/users", web::post().to(register))
                    .route("/login", web::post().to(login))
                    .route("/refresh", web::post().to(refresh))
                    .route("/revoke", web::post().to(revoke)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
