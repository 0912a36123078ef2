//! HTTP surface: routes, shared state, and error mapping.

mod error;
mod handlers;

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::service::{NoteService, TagService};
use crate::store::{NoteRepository, TagRepository};

pub use error::ApiError;
pub use handlers::{CreateNoteRequest, CreateNoteResponse, ListNotesParams};

/// Services shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub notes: Arc<NoteService>,
    pub tags: Arc<TagService>,
}

impl AppState {
    pub fn new(notes: Arc<dyn NoteRepository>, tags: Arc<dyn TagRepository>) -> Self {
        Self {
            notes: Arc::new(NoteService::new(Arc::clone(&notes), tags)),
            tags: Arc::new(TagService::new(notes)),
        }
    }

    /// Builds state from one store that holds both collections.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: NoteRepository + TagRepository + 'static,
    {
        Self::new(store.clone(), store)
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/notes", get(handlers::list_notes).post(handlers::create_note))
        .route("/labels", get(handlers::list_labels))
        .route("/health", get(|| async { "OK" }))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the router on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
