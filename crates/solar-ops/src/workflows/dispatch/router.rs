use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use super::domain::{deserialize_optional_date, JobId};
use super::repository::{CrewRepository, JobRepository, RepositoryError};
use super::service::{CommitRequest, DispatchService, DispatchServiceError};

/// Router builder exposing the dispatch board, per-job lookups, and commits.
pub fn dispatch_router<J, C>(service: Arc<DispatchService<J, C>>) -> Router
where
    J: JobRepository + 'static,
    C: CrewRepository + 'static,
{
    Router::new()
        .route("/api/v1/dispatch/overview", get(overview_handler::<J, C>))
        .route(
            "/api/v1/dispatch/jobs/:job_id/recommendation",
            get(recommendation_handler::<J, C>),
        )
        .route("/api/v1/dispatch/assignments", post(commit_handler::<J, C>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DateQuery {
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) date: Option<NaiveDate>,
}

pub(crate) async fn overview_handler<J, C>(
    State(service): State<Arc<DispatchService<J, C>>>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Response
where
    J: JobRepository + 'static,
    C: CrewRepository + 'static,
{
    let date = match query {
        Ok(Query(query)) => query.date,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    match service.overview(date) {
        Ok(overview) => (StatusCode::OK, axum::Json(overview)).into_response(),
        Err(error) => service_error(error),
    }
}

pub(crate) async fn recommendation_handler<J, C>(
    State(service): State<Arc<DispatchService<J, C>>>,
    Path(job_id): Path<String>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Response
where
    J: JobRepository + 'static,
    C: CrewRepository + 'static,
{
    let date = match query {
        Ok(Query(query)) => query.date,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    match service.recommendation_for_job(&JobId(job_id), date) {
        Ok(recommendation) => (StatusCode::OK, axum::Json(recommendation)).into_response(),
        Err(error) => service_error(error),
    }
}

pub(crate) async fn commit_handler<J, C>(
    State(service): State<Arc<DispatchService<J, C>>>,
    axum::Json(request): axum::Json<CommitRequest>,
) -> Response
where
    J: JobRepository + 'static,
    C: CrewRepository + 'static,
{
    match service.commit(request) {
        Ok(outcome) => {
            let status = if outcome.assignment_created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            (status, axum::Json(outcome)).into_response()
        }
        Err(error) => service_error(error),
    }
}

fn bad_request(message: String) -> Response {
    let payload = json!({ "error": message });
    (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
}

fn service_error(error: DispatchServiceError) -> Response {
    let status = match &error {
        DispatchServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        DispatchServiceError::Repository(RepositoryError::Conflict)
        | DispatchServiceError::InactiveSubcontractor(_) => StatusCode::CONFLICT,
        DispatchServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
