use std::time::Instant;

use rocket::data::Data;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::{Request, Response};

/// Records method, path, status, and duration for every request.
pub struct RequestLogger;

struct StartTime(Instant);

#[rocket::async_trait]
impl Fairing for RequestLogger {
    fn info(&self) -> Info {
        Info {
            name: "Request Logger",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, req: &mut Request<'_>, _data: &mut Data<'_>) {
        req.local_cache(|| StartTime(Instant::now()));
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        let start = req.local_cache(|| StartTime(Instant::now()));
        let duration_ms = start.0.elapsed().as_secs_f64() * 1000.0;
        log::info!(
            target: "http",
            "{} {} -> {} ({:.2}ms)",
            req.method(),
            req.uri(),
            res.status().code,
            duration_ms
        );
    }
}
