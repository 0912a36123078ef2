use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState};
use crate::models::{NoteView, TagView};
use crate::service::NewNote;

const NOTE_CREATED: &str = "Note created successfully";

/// Body of `POST /notes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
    pub title: String,
    pub content: String,
    pub user_id: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl From<CreateNoteRequest> for NewNote {
    fn from(value: CreateNoteRequest) -> Self {
        Self {
            title: value.title,
            content: value.content,
            user_id: value.user_id,
            labels: value.labels,
        }
    }
}

/// Response of `POST /notes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteResponse {
    pub message: String,
    pub note_id: String,
}

/// Query string of `GET /notes`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotesParams {
    pub user_id: Option<String>,
    pub label: Option<String>,
}

/// `POST /notes`
pub async fn create_note(
    State(state): State<AppState>,
    Json(request): Json<CreateNoteRequest>,
) -> Result<Json<CreateNoteResponse>, ApiError> {
    let notes = Arc::clone(&state.notes);
    let note_id = tokio::task::spawn_blocking(move || notes.create_note(request.into())).await??;

    Ok(Json(CreateNoteResponse {
        message: NOTE_CREATED.to_string(),
        note_id: note_id.to_string(),
    }))
}

/// `GET /notes?userId=&label=`
pub async fn list_notes(
    State(state): State<AppState>,
    Query(params): Query<ListNotesParams>,
) -> Result<Json<Vec<NoteView>>, ApiError> {
    let notes = Arc::clone(&state.notes);
    let views = tokio::task::spawn_blocking(move || {
        notes.list_notes(params.user_id.as_deref(), params.label.as_deref())
    })
    .await??;

    Ok(Json(views))
}

/// `GET /labels`
pub async fn list_labels(State(state): State<AppState>) -> Result<Json<Vec<TagView>>, ApiError> {
    let tags = Arc::clone(&state.tags);
    let views = tokio::task::spawn_blocking(move || tags.list_tags()).await??;

    Ok(Json(views))
}
