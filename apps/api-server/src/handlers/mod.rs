//! HTTP handlers and route configuration.

mod categories;
mod courses;
mod health;
mod posts;
mod semesters;
mod users;

use actix_web::web;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/courses")
                .route("/", web::get().to(courses::list))
                .route("/{id}", web::get().to(courses::get)),
        )
        .service(web::scope("/categories").route("/", web::get().to(categories::list)))
        .service(
            web::scope("/semesters")
                .route("/", web::get().to(semesters::list))
                .route("/current", web::get().to(semesters::current)),
        )
        .service(
            web::scope("/posts")
                .route("/", web::get().to(posts::list))
                .route("/", web::post().to(posts::create))
                .route("/{id}", web::get().to(posts::get))
                .route("/{id}", web::delete().to(posts::delete))
                .route("/{id}/comments/", web::post().to(posts::add_comment))
                .route(
                    "/{id}/comments/{cid}",
                    web::delete().to(posts::delete_comment),
                )
                .route("/{id}/cheers/", web::post().to(posts::cheer)),
        )
        .service(
            web::scope("/users")
                .route("/login", web::post().to(users::login))
                .route("/login/magic", web::post().to(users::magic_login))
                .route("/register", web::post().to(users::register))
                .route("/register/resend", web::post().to(users::resend_verification))
                .route("/register/verify", web::post().to(users::verify_account))
                .route("/refresh", web::post().to(users::refresh_session))
                .route("/password/change", web::post().to(users::change_password))
                .route("/password/forgot", web::post().to(users::forgot_password))
                .route("/remove", web::post().to(users::remove_account))
                .route("/courses/", web::get().to(users::my_courses))
                .route("/courses/{id}", web::post().to(users::enroll))
                .route("/courses/{id}", web::delete().to(users::withdraw)),
        );
}
