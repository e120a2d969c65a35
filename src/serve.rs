use std::net::SocketAddr;
use std::path::Path as FsPath;
use std::sync::Arc;

use anyhow::Context as _;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::backend::{self, ResourceSource};
use crate::cheatsheet::{self, CheatSheet};
use crate::chunks::ChunkedDocument;
use crate::cli::ServeArgs;
use crate::companies::{self, Company, CompanySummary, QuestionView};
use crate::formats::Resource;
use crate::library::fetch_page;
use crate::query::{ALL, CategoryFilter, Page, ResourceQuery, SortBy, paginate};
use crate::render::render_window;
use crate::toc::{extract_headings, group_headings};

type ApiError = (StatusCode, String);

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn ResourceSource>,
    pub cheatsheets: Arc<Vec<CheatSheet>>,
    pub companies: Arc<Vec<Company>>,
}

pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    let addr: SocketAddr = args
        .addr
        .parse()
        .with_context(|| format!("invalid listen address: {}", args.addr))?;

    let source = backend::connect(args.catalog.as_deref().map(FsPath::new))?;
    let cheatsheets = match args.cheatsheets.as_deref() {
        Some(dir) => cheatsheet::load_dir(FsPath::new(dir))?,
        None => Vec::new(),
    };
    let companies = match args.companies.as_deref() {
        Some(path) => companies::load_companies(FsPath::new(path))?,
        None => Vec::new(),
    };
    tracing::info!(
        cheatsheets = cheatsheets.len(),
        companies = companies.len(),
        "loaded content"
    );

    let app = router(AppState {
        source,
        cheatsheets: Arc::new(cheatsheets),
        companies: Arc::new(companies),
    });

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| anyhow::anyhow!("bind {addr}: {err}"))?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(?err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok\n" }))
        .route("/api/resources", get(list_resources))
        .route("/api/resources/:id", get(get_resource))
        .route("/api/categories", get(list_categories))
        .route("/api/cheatsheets", get(list_cheatsheets))
        .route("/api/cheatsheets/:id", get(get_cheatsheet))
        .route("/api/cheatsheets/:id/toc", get(get_cheatsheet_toc))
        .route("/api/cheatsheets/:id/chunks", get(get_cheatsheet_chunks))
        .route("/api/companies", get(list_companies))
        .route("/api/companies/:name/questions", get(list_company_questions))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn internal(err: anyhow::Error) -> ApiError {
    tracing::error!(error = %format!("{err:#}"), "request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, format!("{err:#}"))
}

/// Serializes borrowed views before the handler's state goes out of scope.
fn to_json<T: Serialize>(value: &T) -> Result<Json<serde_json::Value>, ApiError> {
    serde_json::to_value(value)
        .map(Json)
        .map_err(|err| internal(err.into()))
}

#[derive(Debug, Default, Deserialize)]
struct ResourcesParams {
    search: Option<String>,
    category: Option<String>,
    subcategory: Option<String>,
    sort: Option<String>,
    page: Option<usize>,
}

async fn list_resources(
    State(state): State<AppState>,
    Query(q): Query<ResourcesParams>,
) -> Result<Json<Page<Resource>>, ApiError> {
    let query = ResourceQuery {
        search: q.search,
        category: CategoryFilter::from_name(q.category.as_deref()),
        subcategory: CategoryFilter::from_name(q.subcategory.as_deref()),
        sort_by: q
            .sort
            .as_deref()
            .map(SortBy::from_name)
            .unwrap_or_default(),
    };
    let page = fetch_page(state.source.as_ref(), query, q.page.unwrap_or(1))
        .await
        .map_err(internal)?;
    Ok(Json(page))
}

async fn get_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Resource>, ApiError> {
    match state.source.fetch_resource(&id).await.map_err(internal)? {
        Some(resource) => Ok(Json(resource)),
        None => Err((StatusCode::NOT_FOUND, format!("resource not found: {id}"))),
    }
}

async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let categories = state.source.fetch_categories().await.map_err(internal)?;
    Ok(Json(categories))
}

#[derive(Debug, Default, Deserialize)]
struct CheatSheetsParams {
    search: Option<String>,
    category: Option<String>,
}

#[derive(Debug, Serialize)]
struct CheatSheetListing<'a> {
    sheets: Vec<&'a cheatsheet::CheatSheetMeta>,
    groups: Vec<cheatsheet::CategoryGroup<'a>>,
}

async fn list_cheatsheets(
    State(state): State<AppState>,
    Query(q): Query<CheatSheetsParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let category = q
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty() && *c != ALL);
    to_json(&CheatSheetListing {
        sheets: cheatsheet::filter(&state.cheatsheets, q.search.as_deref(), category),
        groups: cheatsheet::group_by_category(&state.cheatsheets),
    })
}

fn find_sheet<'a>(state: &'a AppState, id: &str) -> Result<&'a CheatSheet, ApiError> {
    state
        .cheatsheets
        .iter()
        .find(|sheet| sheet.meta.id == id)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("cheat sheet not found: {id}")))
}

async fn get_cheatsheet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let sheet = find_sheet(&state, &id)?;
    to_json(&sheet.detail())
}

async fn get_cheatsheet_toc(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let sheet = find_sheet(&state, &id)?;
    Ok(Json(group_headings(&extract_headings(&sheet.body))))
}

#[derive(Debug, Deserialize)]
struct ChunksParams {
    loaded: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ChunkWindow {
    total: usize,
    loaded: usize,
    html: Vec<String>,
}

/// Without `loaded`, the initial window. With it, the chunks revealed by one
/// "load more" step from that count.
async fn get_cheatsheet_chunks(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<ChunksParams>,
) -> Result<Json<ChunkWindow>, ApiError> {
    let sheet = find_sheet(&state, &id)?;
    let (from, doc) = match q.loaded {
        None => (0, ChunkedDocument::new(&sheet.body)),
        Some(loaded) => {
            let mut doc = ChunkedDocument::resume(&sheet.body, loaded);
            let from = doc.loaded();
            doc.load_more();
            (from, doc)
        }
    };

    Ok(Json(ChunkWindow {
        total: doc.total(),
        loaded: doc.loaded(),
        html: render_window(doc.chunks(), from, doc.loaded()),
    }))
}

#[derive(Debug, Default, Deserialize)]
struct CompaniesParams {
    search: Option<String>,
    page: Option<usize>,
}

async fn list_companies(
    State(state): State<AppState>,
    Query(q): Query<CompaniesParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let matched = companies::filter_companies(&state.companies, q.search.as_deref())
        .into_iter()
        .map(CompanySummary::from)
        .collect::<Vec<_>>();
    to_json(&paginate(
        &matched,
        q.page.unwrap_or(1),
        companies::COMPANIES_PER_PAGE,
    ))
}

async fn list_company_questions(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(q): Query<CompaniesParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let company = companies::find_company(&state.companies, &name)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("company not found: {name}")))?;
    let matched = companies::filter_questions(&company.questions, q.search.as_deref())
        .into_iter()
        .map(QuestionView::from)
        .collect::<Vec<_>>();
    to_json(&paginate(
        &matched,
        q.page.unwrap_or(1),
        companies::QUESTIONS_PER_PAGE,
    ))
}
