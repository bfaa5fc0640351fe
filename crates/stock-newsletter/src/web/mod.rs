//! Web UI: a ticker form that runs the newsletter crew

pub mod handlers;
pub mod page;

pub use page::{PageView, Pages};

use axum::Router;
use axum::routing::{get, post};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::info;

use crate::error::Result;
use crate::newsletter::NewsletterCrew;

/// State shared by every request
#[derive(Clone)]
pub struct AppState {
    pub newsletter: Arc<NewsletterCrew>,
    /// Caps simultaneous research runs
    pub runs: Arc<Semaphore>,
    pub pages: Arc<Pages>,
}

impl AppState {
    pub fn new(newsletter: Arc<NewsletterCrew>) -> Result<Self> {
        let permits = newsletter.config().max_concurrent_runs;
        Ok(Self {
            newsletter,
            runs: Arc::new(Semaphore::new(permits)),
            pages: Arc::new(Pages::new()?),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/research", post(handlers::research))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Serve the UI until the process is stopped
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Newsletter UI listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
