use axum::{routing::get, Router};

pub fn routes() -> Router {
    Router::new().route("/", get(index))
}

async fn index() -> String {
    chrono::Utc::now().format("%a %b %d %H:%M:%S UTC %Y").to_string()
}
