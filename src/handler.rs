use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument};

use crate::config::ServerConfig;
use crate::extractor::FixtureExtractor;
use crate::ical;
use crate::merge::attach_tickets;
use crate::model::{Fixture, TicketBlock};
use crate::renderer::{RenderError, Renderer};
use crate::tickets::TicketCorrelator;

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    renderer: Arc<dyn Renderer>,
    extractor: Arc<FixtureExtractor>,
    correlator: Arc<TicketCorrelator>,
}

impl AppState {
    pub fn new(config: ServerConfig, renderer: Arc<dyn Renderer>) -> Result<Self, regex::Error> {
        let extractor = FixtureExtractor::for_club(config.club.clone())?;
        let correlator = TicketCorrelator::for_club(&config.club)?;
        Ok(Self {
            config: Arc::new(config),
            renderer,
            extractor: Arc::new(extractor),
            correlator: Arc::new(correlator),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FixturesResponse {
    pub ok: bool,
    pub count: usize,
    pub fixtures: Vec<Fixture>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

/// Any pipeline failure; always answered with a 500 and the error envelope.
#[derive(Debug)]
pub enum AppError {
    Render(RenderError),
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        AppError::Render(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match self {
            AppError::Render(e) => e.to_string(),
        };
        let body = ErrorResponse { ok: false, error: message };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/loko-fixtures", get(fixtures_json))
        .route("/loko-fixtures.ics", get(fixtures_ics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /
async fn liveness() -> &'static str {
    "OK"
}

/// GET /loko-fixtures
async fn fixtures_json(State(state): State<AppState>) -> Result<Json<FixturesResponse>, AppError> {
    let fixtures = collect_fixtures(&state, Utc::now()).await.map_err(|e| {
        error!(error = %e, "Fixture scrape failed");
        AppError::from(e)
    })?;
    Ok(Json(FixturesResponse { ok: true, count: fixtures.len(), fixtures }))
}

/// GET /loko-fixtures.ics
async fn fixtures_ics(State(state): State<AppState>) -> Result<Response, AppError> {
    let fixtures = collect_fixtures(&state, Utc::now()).await.map_err(|e| {
        error!(error = %e, "Fixture scrape failed");
        AppError::from(e)
    })?;
    let body = ical::to_ics(&fixtures, &state.config.club);
    Ok(([(header::CONTENT_TYPE, "text/calendar; charset=utf-8")], body).into_response())
}

// Flags the blocking render task once the awaiting future is dropped.
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Render both pages, then extract, correlate and merge.
///
/// The renderer session lives inside the blocking task and is dropped there on
/// every path, including failures. Nothing is returned unless both pages render.
/// If this future is dropped mid-render, the tickets page is not fetched.
#[instrument(level = "info", skip(state))]
pub async fn collect_fixtures(state: &AppState, now: DateTime<Utc>) -> Result<Vec<Fixture>, RenderError> {
    // The blocking task must own its inputs.
    let renderer = Arc::clone(&state.renderer);
    let schedule_url = state.config.schedule_url.clone();
    let tickets_url = state.config.tickets_url.clone();
    let cancelled = Arc::new(AtomicBool::new(false));
    let _guard = CancelOnDrop(Arc::clone(&cancelled));

    let handle = tokio::task::spawn_blocking(move || -> Result<(Vec<String>, Vec<TicketBlock>), RenderError> {
        let mut session = renderer.open_session()?;
        let lines = session.visible_lines(&schedule_url)?;
        if cancelled.load(Ordering::SeqCst) {
            info!("Caller dropped; skipping tickets page");
            return Err(RenderError::Cancelled);
        }
        let blocks = session.ticket_blocks(&tickets_url)?;
        Ok((lines, blocks))
    });
    let (lines, blocks) = handle
        .await
        .map_err(|e| RenderError::Worker(format!("render task join error: {}", e)))??;
    info!(lines = lines.len(), blocks = blocks.len(), "Rendered schedule and ticket pages");

    let mut fixtures = state.extractor.extract(&lines[..], now);
    let tickets = state.correlator.correlate(&blocks);
    attach_tickets(&mut fixtures, &tickets, state.extractor.club());
    Ok(fixtures)
}
