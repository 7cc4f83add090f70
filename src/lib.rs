pub mod cache;
pub mod chat;
pub mod challenges;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod geo;
pub mod match_sm;
pub mod matcher;
pub mod models;
pub mod profile;
pub mod rate_limit;
pub mod request_log;
pub mod reputation;
pub mod routes;
pub mod session;

use cache::CacheService;
use config::Config;
use db::Db;
use email::EmailNotifier;
use request_log::RequestLogger;
use rocket_cors::CorsOptions;

pub fn rocket() -> rocket::Rocket<rocket::Build> {
    let config = Config::from_env();
    rocket_with_config(config)
}

pub fn rocket_with_config(config: Config) -> rocket::Rocket<rocket::Build> {
    if let Some(parent) = std::path::Path::new(&config.database_path).parent() {
        std::fs::create_dir_all(parent).ok();
    }

    let db = Db::new(&config.database_path);
    let email = EmailNotifier::new(&config);
    let redis_url = config.redis_url.clone();

    let cors = CorsOptions::default()
        .to_cors()
        .expect("Failed to create CORS");

    rocket::build()
        .manage(db)
        .manage(email)
        .manage(config)
        .attach(cors)
        .attach(RequestLogger)
        .attach(rocket::fairing::AdHoc::on_ignite(
            "Cache Connection",
            |rocket| {
                Box::pin(async move {
                    let cache = CacheService::connect(redis_url.as_deref()).await;
                    Ok(rocket.manage(cache))
                })
            },
        ))
        .register(
            "/",
            rocket::catchers![routes::too_many_requests, routes::not_found],
        )
        .mount(
            "/",
            rocket::routes![
                routes::health,
                routes::complete_profile,
                routes::candidates,
                routes::distance,
                routes::auto_match,
                routes::respond_to_match,
                routes::create_session,
                routes::get_session,
                routes::confirm_buddy_completion,
                routes::confirm_session_completion,
                routes::update_session_notes,
                routes::list_messages,
                routes::send_message,
                routes::get_reputation,
                routes::list_challenges,
            ],
        )
}
