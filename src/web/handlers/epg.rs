//! EPG lookup HTTP handler
//!
//! A single endpoint serves every operation; the `action` query parameter
//! picks which one. Input is validated before any source is touched.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::errors::AppError;
use crate::services::{SearchOutcome, SearchRequest};
use crate::web::{
    extractors::{Action, EpgQueryParams},
    responses::{
        handle_error, EpgNotFoundResponse, EpgResponse, HelpResponse, SourcesResponse,
        UpdateResponse,
    },
    AppState,
};

/// `GET /` and `GET /epg`
pub async fn epg_lookup(
    State(state): State<AppState>,
    query: Result<Query<EpgQueryParams>, QueryRejection>,
) -> Response {
    let Query(params) = match query {
        Ok(query) => query,
        Err(rejection) => {
            return handle_error(AppError::validation(format!(
                "Invalid query string: {}",
                rejection.body_text()
            )))
        }
    };

    let action = match params.action() {
        Ok(action) => action,
        Err(e) => return handle_error(e),
    };
    debug!("Handling {:?} request", action);

    match action {
        Action::Epg => lookup(&state, &params).await,
        Action::Sources => list_sources(&state).await,
        Action::Update => update_source(&state, &params).await,
        Action::Help => HelpResponse::new(state.config.search.default_max_retry).into_response(),
    }
}

async fn lookup(state: &AppState, params: &EpgQueryParams) -> Response {
    let request: SearchRequest = match params.epg_request(state.config.search.default_max_retry) {
        Ok(request) => request.into(),
        Err(e) => return handle_error(e),
    };

    match state.search.search(&request).await {
        SearchOutcome::Found {
            found,
            tried_sources,
        } => EpgResponse::new(&request.date, found, tried_sources).into_response(),
        SearchOutcome::NotFound {
            suggestions,
            tried_sources,
        } => EpgNotFoundResponse::new(&request.channel, &request.date, suggestions, tried_sources)
            .into_response(),
    }
}

async fn list_sources(state: &AppState) -> Response {
    SourcesResponse::new(state.search.source_summaries().await).into_response()
}

async fn update_source(state: &AppState, params: &EpgQueryParams) -> Response {
    let Some(source_id) = params.source_id() else {
        return handle_error(AppError::validation(
            "Missing required parameter 'source' for action=update",
        ));
    };

    match state.search.refresh_source(source_id).await {
        Ok((source, size)) => UpdateResponse::new(&source, size).into_response(),
        Err(e) => handle_error(e),
    }
}
