#[rocket::main]
async fn main() {
    env_logger::init();

    if let Err(e) = wingman_match_core::rocket().launch().await {
        log::error!("server exited with error: {e}");
        std::process::exit(1);
    }
}
