//! Route handlers

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::AppState;
use crate::dataset::{Dataset, assemble, assemble_with};
use crate::fixtures::{bar_contract, bar_fixture, scatter_fixture};
use crate::pipeline::{PipelineError, PipelineRequest};
use crate::repository::TemplateRequest;
use crate::viz::{BindError, SelectorChange, SessionId, VizApp, VizDocument};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// Error carried back to the caller as `{"message": ...}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { message: self.message })).into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        let status = StatusCode::from_u16(err.status_class().code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, err.to_string())
    }
}

impl From<BindError> for ApiError {
    fn from(err: BindError) -> Self {
        let status = match &err {
            BindError::UnknownSession(_) => StatusCode::NOT_FOUND,
            BindError::UnsupportedSelector { .. } | BindError::InvalidRange { .. } => StatusCode::BAD_REQUEST,
            BindError::MissingColumn { .. } | BindError::NotNumeric { .. } | BindError::Dataset(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            BindError::ChannelError => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self::new(status, err.to_string())
    }
}

impl From<eyre::Report> for ApiError {
    fn from(err: eyre::Report) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl From<PathRejection> for ApiError {
    fn from(err: PathRejection) -> Self {
        Self::bad_request(format!("invalid path: {}", err.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(err: QueryRejection) -> Self {
        Self::bad_request(format!("invalid query: {}", err.body_text()))
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputType {
    Html,
    Json,
}

impl OutputType {
    fn parse(raw: Option<&str>) -> ApiResult<Self> {
        match raw.map(str::trim) {
            None | Some("") | Some("json") => Ok(OutputType::Json),
            Some("html") => Ok(OutputType::Html),
            Some(other) => Err(ApiError::bad_request(format!(
                "output_type must be 'html' or 'json', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ScatterQuery {
    client_id: Option<String>,
    client_secret: Option<String>,
    output_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: SessionId,
    pub document: VizDocument,
}

fn required(value: Option<String>, name: &str) -> ApiResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("{name} is required")))
}

/// Reject cross-site session access; requests without an Origin pass
fn check_origin(state: &AppState, headers: &HeaderMap) -> ApiResult<()> {
    let Some(origin) = headers.get(header::ORIGIN) else {
        return Ok(());
    };
    let origin = origin.to_str().unwrap_or_default();
    if state.config.viz.origin_allowed(origin) {
        Ok(())
    } else {
        warn!(%origin, "check_origin: rejected");
        Err(ApiError::new(StatusCode::FORBIDDEN, format!("Origin '{origin}' is not allowed")))
    }
}

async fn open_page(state: &AppState, app: VizApp) -> ApiResult<Html<String>> {
    let (_, doc) = state.viz.open(app).await?;
    Ok(Html(state.pages.render(&doc)?))
}

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn demo_scatter(State(state): State<AppState>) -> ApiResult<Html<String>> {
    debug!("demo_scatter: called");
    let (schema, rows) = scatter_fixture();
    let dataset = assemble(schema, rows).map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    open_page(&state, VizApp::Scatter { dataset }).await
}

pub async fn demo_bar(State(state): State<AppState>) -> ApiResult<Html<String>> {
    debug!("demo_bar: called");
    let (schema, rows) = bar_fixture();
    let dataset = assemble_with(schema, rows, &bar_contract())
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    open_page(
        &state,
        VizApp::Bar {
            dataset,
            group: "x".to_string(),
            color: "y".to_string(),
            filter_column: "z".to_string(),
        },
    )
    .await
}

pub async fn scatter(
    State(state): State<AppState>,
    path: Result<Path<(String, String, String)>, PathRejection>,
    query: Result<Query<ScatterQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Path((object_id, plot_template_id, visual_template_id)) = path?;
    let Query(query) = query?;
    debug!(%object_id, %plot_template_id, %visual_template_id, "scatter: called");
    let client_id = required(query.client_id, "client_id")?;
    let client_secret = required(query.client_secret, "client_secret")?;
    let output = OutputType::parse(query.output_type.as_deref())?;

    let template = TemplateRequest::new(object_id, plot_template_id, visual_template_id)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    let request = PipelineRequest::new(template, client_id, client_secret);
    let dataset: Dataset = state.pipeline.run(&request).await?;

    let (session_id, document) = state.viz.open(VizApp::Scatter { dataset }).await?;
    match output {
        OutputType::Html => Ok(Html(state.pages.render(&document)?).into_response()),
        OutputType::Json => Ok(Json(SessionResponse { session_id, document }).into_response()),
    }
}

pub async fn get_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<SessionId>, PathRejection>,
) -> ApiResult<Json<VizDocument>> {
    let Path(id) = id?;
    debug!(%id, "get_session: called");
    check_origin(&state, &headers)?;
    Ok(Json(state.viz.render(id).await?))
}

pub async fn select(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<SessionId>, PathRejection>,
    change: Result<Json<SelectorChange>, JsonRejection>,
) -> ApiResult<Json<VizDocument>> {
    let Path(id) = id?;
    debug!(%id, "select: called");
    check_origin(&state, &headers)?;
    let Json(change) = change.map_err(|e| ApiError::bad_request(format!("invalid selector change: {}", e.body_text())))?;
    Ok(Json(state.viz.select(id, change).await?))
}

pub async fn close_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<SessionId>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    debug!(%id, "close_session: called");
    check_origin(&state, &headers)?;
    state.viz.close(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthError;
    use crate::validate::ValidationError;

    #[test]
    fn test_output_type_parse() {
        assert_eq!(OutputType::parse(None).unwrap(), OutputType::Json);
        assert_eq!(OutputType::parse(Some("html")).unwrap(), OutputType::Html);
        assert_eq!(OutputType::parse(Some("json")).unwrap(), OutputType::Json);
        assert_eq!(OutputType::parse(Some("png")).unwrap_err().status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_required_params() {
        assert_eq!(required(Some("abc".into()), "client_id").unwrap(), "abc");
        let err = required(None, "client_id").unwrap_err();
        assert_eq!(err.message, "client_id is required");
        assert!(required(Some("  ".into()), "client_secret").is_err());
    }

    #[test]
    fn test_pipeline_error_status() {
        let err: ApiError = PipelineError::from(ValidationError::BothMissing).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err: ApiError = PipelineError::from(AuthError::InvalidCredentials { status: 401 }).into();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_bind_error_status() {
        let err: ApiError = BindError::UnknownSession(uuid::Uuid::nil()).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        let err: ApiError = BindError::InvalidRange { start: 2.0, end: 1.0 }.into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
