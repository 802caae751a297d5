//! Web front end: an HTML page for picking a user and a count, plus a small
//! JSON API over the same service.

use std::sync::Arc;

use anyhow::Context;
use askama::Template;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use data_loader::RawId;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::service::{RecommendError, RecommendationService, RecommendedItem};

pub const MIN_RECOMMENDATIONS: usize = 1;
pub const MAX_RECOMMENDATIONS: usize = 20;
pub const DEFAULT_RECOMMENDATIONS: usize = 10;

const TITLE: &str = "Recommendation System";
const LOADED_BANNER: &str = "Model, data, and mappings loaded successfully!";
const EMPTY_MESSAGE: &str = "No recommendations found for this user.";
const NO_USERS_MESSAGE: &str = "No active users available.";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    service: RecommendationService,
    users: Arc<Vec<RawId>>,
}

impl AppState {
    pub fn new(service: RecommendationService) -> Self {
        let users = Arc::new(service.active_users());
        Self { service, users }
    }

    pub fn service(&self) -> &RecommendationService {
        &self.service
    }

    /// Active users in display order
    pub fn users(&self) -> &[RawId] {
        &self.users
    }
}

/// Where to listen
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/recommend", get(recommend_page))
        .route("/api/users", get(api_users))
        .route("/api/recommendations", get(api_recommendations))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: ServerConfig, state: AppState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Serving recommendations on http://{}", addr);
    axum::serve(listener, router(state))
        .await
        .context("Web server stopped unexpectedly")?;
    Ok(())
}

/// Count from a query string value; blank or unparsable means default
pub fn parse_count(raw: Option<&str>) -> usize {
    clamp_count(raw.and_then(|s| s.trim().parse::<i64>().ok()))
}

/// Clamp a requested count into the slider range; missing means default
pub fn clamp_count(n: Option<i64>) -> usize {
    match n {
        None => DEFAULT_RECOMMENDATIONS,
        Some(n) => n.clamp(MIN_RECOMMENDATIONS as i64, MAX_RECOMMENDATIONS as i64) as usize,
    }
}

#[derive(Debug, Deserialize)]
pub struct RecommendQuery {
    user: Option<String>,
    n: Option<String>,
}

// ============================================================================
// HTML
// ============================================================================

struct UserOption {
    id: RawId,
    selected: bool,
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexPage {
    title: &'static str,
    banner: &'static str,
    users: Vec<UserOption>,
    n: usize,
    min_n: usize,
    max_n: usize,
    warning: Option<String>,
    headline: Option<String>,
    rows: Vec<RecommendedItem>,
    notice: Option<String>,
}

impl IndexPage {
    fn form(users: &[RawId], selected: Option<&RawId>, n: usize) -> Self {
        let selected = selected.or_else(|| users.first());
        let users = users
            .iter()
            .map(|id| UserOption {
                id: id.clone(),
                selected: Some(id) == selected,
            })
            .collect();

        Self {
            title: TITLE,
            banner: LOADED_BANNER,
            users,
            n,
            min_n: MIN_RECOMMENDATIONS,
            max_n: MAX_RECOMMENDATIONS,
            warning: None,
            headline: None,
            rows: Vec::new(),
            notice: None,
        }
    }
}

async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let page = IndexPage::form(state.users(), None, DEFAULT_RECOMMENDATIONS);
    Ok(Html(page.render()?))
}

async fn recommend_page(
    State(state): State<AppState>,
    Query(query): Query<RecommendQuery>,
) -> Result<Html<String>, AppError> {
    let n = parse_count(query.n.as_deref());
    let user = query
        .user
        .map(RawId::new)
        .or_else(|| state.users().first().cloned());

    let mut page = IndexPage::form(state.users(), user.as_ref(), n);

    let Some(user) = user else {
        page.warning = Some(NO_USERS_MESSAGE.to_string());
        return Ok(Html(page.render()?));
    };

    match state.service().recommend(&user, n) {
        Ok(items) if items.is_empty() => {
            page.notice = Some(EMPTY_MESSAGE.to_string());
        }
        Ok(items) => {
            page.headline = Some(format!(
                "Top {} Recommendations for User {}:",
                items.len(),
                user
            ));
            page.rows = items;
        }
        Err(RecommendError::Filter(err)) => return Err(AppError::Internal(err)),
        Err(err) => {
            page.warning = Some(err.to_string());
            page.notice = Some(EMPTY_MESSAGE.to_string());
        }
    }

    Ok(Html(page.render()?))
}

// ============================================================================
// JSON API
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    Empty,
    UserNotFound,
    NoRecommendations,
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub user: String,
    pub items: Vec<RecommendedItem>,
    pub status: Status,
}

#[derive(Debug, Deserialize)]
pub struct ApiQuery {
    user: String,
    n: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub users: usize,
    pub items: usize,
    pub active_users: usize,
    pub active_items: usize,
}

async fn api_users(State(state): State<AppState>) -> Json<Vec<RawId>> {
    Json(state.users().to_vec())
}

async fn api_recommendations(
    State(state): State<AppState>,
    Query(query): Query<ApiQuery>,
) -> Result<Json<RecommendationsResponse>, AppError> {
    let n = parse_count(query.n.as_deref());
    let user = RawId::new(query.user);

    let (items, status) = match state.service().recommend(&user, n) {
        Ok(items) if items.is_empty() => (items, Status::Empty),
        Ok(items) => (items, Status::Ok),
        Err(RecommendError::UserNotFound(_)) => (Vec::new(), Status::UserNotFound),
        Err(RecommendError::ModelLookup { .. }) => (Vec::new(), Status::NoRecommendations),
        Err(RecommendError::Filter(err)) => return Err(AppError::Internal(err)),
    };

    Ok(Json(RecommendationsResponse {
        user: user.to_string(),
        items,
        status,
    }))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let dataset = state.service().dataset();
    let (active_users, active_items) = dataset.active().counts();
    Json(HealthResponse {
        status: "ok",
        users: dataset.users().len(),
        items: dataset.items().len(),
        active_users,
        active_items,
    })
}

// ============================================================================
// Errors
// ============================================================================

/// Failures that end a request with a 500
#[derive(Debug)]
pub enum AppError {
    Render(askama::Error),
    Internal(anyhow::Error),
}

impl From<askama::Error> for AppError {
    fn from(err: askama::Error) -> Self {
        AppError::Render(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Render(err) => format!("Template rendering failed: {err}"),
            AppError::Internal(err) => format!("Internal error: {err:#}"),
        };
        error!("{}", message);
        (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
    }
}
