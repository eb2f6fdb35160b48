//! API endpoint handlers
//!
//! Thin by design: load the current state, call the scheduler, persist the
//! result. All scheduling math stays in recall-core.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use recall_core::{CardRecord, Rating, SourceKind, StorageError};

use super::state::AppState;

fn card_front_json(card: &CardRecord) -> Value {
    serde_json::json!({
        "hash": card.hash,
        "question": card.question,
        "context": card.context,
        "dueAt": card.due_at.to_rfc3339(),
        "isNew": card.is_new(),
    })
}

fn card_json(card: &CardRecord, retrievability: f64) -> Value {
    serde_json::json!({
        "hash": card.hash,
        "question": card.question,
        "answer": card.answer,
        "context": card.context,
        "stability": card.stability,
        "difficulty": card.difficulty,
        "dueAt": card.due_at.to_rfc3339(),
        "lastReviewed": card.last_reviewed.map(|dt| dt.to_rfc3339()),
        "createdAt": card.created_at.to_rfc3339(),
        "sourceId": card.source_id,
        "sourcePath": card.source_path,
        "retrievability": retrievability,
        "isNew": card.is_new(),
    })
}

/// Liveness probe
pub async fn health_check() -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": recall_core::VERSION,
    }))
}

/// Deck summary: how much work is waiting
pub async fn get_deck(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let stats = state
        .store
        .stats(Utc::now())
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(serde_json::json!({
        "totalCards": stats.total_cards,
        "dueCards": stats.due_cards,
        "newCards": stats.new_cards,
        "sources": stats.sources,
        "hasDueCards": stats.due_cards > 0,
    })))
}

/// Front of the earliest due card, or `card: null` when nothing is due
pub async fn next_review(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let mut due = state
        .store
        .due_cards(Utc::now(), Some(1))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(serde_json::json!({
        "card": due.pop().as_ref().map(card_front_json),
    })))
}

/// All cards with state, earliest due first
pub async fn list_cards(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let now = Utc::now();
    let cards = state
        .store
        .all_cards()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let formatted: Vec<Value> = cards
        .iter()
        .map(|card| {
            card_json(
                card,
                state.scheduler.retrievability(&card.memory_state(), now),
            )
        })
        .collect();

    Ok(Json(serde_json::json!({
        "total": formatted.len(),
        "cards": formatted,
    })))
}

/// A single card, answer included
pub async fn get_card(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let card = state
        .store
        .get_card(&hash)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let retrievability = state
        .scheduler
        .retrievability(&card.memory_state(), Utc::now());
    Ok(Json(card_json(&card, retrievability)))
}

#[derive(Debug, Deserialize)]
pub struct ReviewBody {
    pub grade: u8,
}

/// Apply a review: load state, run the scheduler, persist the outcome
pub async fn post_review(
    State(state): State<AppState>,
    Path(hash): Path<String>,
    Json(body): Json<ReviewBody>,
) -> Result<Json<Value>, StatusCode> {
    // An out-of-range grade is the caller's bug, rejected at the boundary
    let rating = Rating::from_grade(body.grade).ok_or(StatusCode::BAD_REQUEST)?;

    let card = state
        .store
        .apply_review(&hash, rating, &state.scheduler, Utc::now())
        .map_err(|e| match e {
            StorageError::CardNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        })?;

    Ok(Json(serde_json::json!({
        "hash": card.hash,
        "rating": rating,
        "stability": card.stability,
        "difficulty": card.difficulty,
        "dueAt": card.due_at.to_rfc3339(),
        "lastReviewed": card.last_reviewed.map(|dt| dt.to_rfc3339()),
    })))
}

fn source_json(source: &recall_core::SourceRecord) -> Value {
    serde_json::json!({
        "id": source.id,
        "path": source.path,
        "kind": source.kind,
        "lastScanned": source.last_scanned.map(|dt| dt.to_rfc3339()),
    })
}

/// List configured sources
pub async fn list_sources(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let sources = state
        .store
        .sources()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(serde_json::json!({
        "sources": sources.iter().map(source_json).collect::<Vec<_>>(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct AddSourceBody {
    pub path: String,
}

/// Register a new source; its kind is inferred from the path shape
pub async fn add_source(
    State(state): State<AppState>,
    Json(body): Json<AddSourceBody>,
) -> Result<Json<Value>, StatusCode> {
    let path = body.path.trim();
    if path.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    if state
        .store
        .find_source(path)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .is_some()
    {
        return Err(StatusCode::CONFLICT);
    }

    let source = state
        .store
        .add_source(path, SourceKind::infer(path))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(source_json(&source)))
}

/// Remove a source and its cards
pub async fn delete_source(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, StatusCode> {
    let removed = state
        .store
        .remove_source(id)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if removed {
        Ok(Json(serde_json::json!({ "deleted": true, "id": id })))
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

/// Reconcile all sources.
///
/// Git fetches and directory walks block, so the work runs on the blocking
/// pool rather than a runtime worker.
pub async fn post_sync(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let store = state.store.clone();
    let repos_dir = state.repos_dir.clone();

    let reports = tokio::task::spawn_blocking(move || recall_core::sync_all(&store, &repos_dir))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .map_err(|e| {
            tracing::error!(error = %e, "sync failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(serde_json::json!({ "reports": reports })))
}
