//! Route handlers

use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;
use tracing::{error, info, instrument, warn};

use super::AppState;
use super::page::PageView;
use crate::error::NewsletterError;

#[derive(Debug, Deserialize)]
pub struct ResearchForm {
    #[serde(default)]
    pub ticket: String,
}

pub async fn index(State(state): State<AppState>) -> Response {
    render(&state, StatusCode::OK, &PageView::empty())
}

#[instrument(skip_all)]
pub async fn research(State(state): State<AppState>, Form(form): Form<ResearchForm>) -> Response {
    let ticket = form.ticket.trim().to_string();
    info!(%ticket, "Research requested");
    if ticket.is_empty() {
        return render(
            &state,
            StatusCode::UNPROCESSABLE_ENTITY,
            &PageView::error("", NewsletterError::EmptyTicker.to_string()),
        );
    }

    let Ok(_permit) = state.runs.acquire().await else {
        return render(
            &state,
            StatusCode::SERVICE_UNAVAILABLE,
            &PageView::error(ticket, "The server is shutting down"),
        );
    };

    match state.newsletter.research(&ticket).await {
        Ok(output) => {
            info!(run_id = %output.run_id, "Research succeeded");
            render(&state, StatusCode::OK, &PageView::result(ticket, output.final_output))
        }
        Err(NewsletterError::EmptyTicker) => render(
            &state,
            StatusCode::UNPROCESSABLE_ENTITY,
            &PageView::error("", NewsletterError::EmptyTicker.to_string()),
        ),
        Err(err) => {
            warn!(error = %err, "Research failed");
            render(&state, StatusCode::BAD_GATEWAY, &PageView::error(ticket, err.to_string()))
        }
    }
}

pub async fn health() -> &'static str {
    "ok"
}

fn render(state: &AppState, status: StatusCode, view: &PageView) -> Response {
    match state.pages.render(view) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(err) => {
            error!(error = %err, "Page rendering failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Page rendering failed").into_response()
        }
    }
}
