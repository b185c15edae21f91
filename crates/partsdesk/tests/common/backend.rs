//! In-process fake of the parts service.
//!
//! Serves the `/api/v1` routes from a shared `BackendState` on an ephemeral
//! port and records what the client sent, so tests can assert on both sides.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{json, Value};

use partsdesk::models::{JobDetail, JobRecord, ServiceTypes};
use partsdesk::ApiClient;

pub const TEST_TOKEN: &str = "test-token";

/// A multipart upload as received by the service.
#[derive(Debug, Clone, Default)]
pub struct RecordedUpload {
    pub query: HashMap<String, String>,
    pub fields: HashMap<String, String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct BackendState {
    /// Jobs served by the list endpoint, in service order.
    pub jobs: Vec<JobRecord>,
    pub details: HashMap<String, JobDetail>,
    pub service_types: ServiceTypes,

    pub authorization: Vec<Option<String>>,
    pub list_calls: Vec<(u64, u64)>,
    pub service_type_calls: usize,
    pub uploads: Vec<RecordedUpload>,
    pub enrich_calls: Vec<(String, String)>,
    pub runs: Vec<(String, &'static str)>,
    pub deleted: Vec<String>,
    pub verify_bodies: Vec<(String, Value)>,
    pub image_uploads: Vec<RecordedUpload>,
    pub dashboard_queries: Vec<HashMap<String, String>>,
    next_image: u32,
}

impl BackendState {
    pub fn with_jobs(jobs: Vec<JobRecord>) -> Self {
        Self {
            jobs,
            service_types: super::builders::catalog(),
            ..Default::default()
        }
    }

    pub fn with_detail(mut self, detail: JobDetail) -> Self {
        self.details.insert(detail.job.id.clone(), detail);
        self
    }

    fn find_job(&self, job_id: &str) -> Option<JobRecord> {
        self.details
            .get(job_id)
            .map(|d| d.job.clone())
            .or_else(|| self.jobs.iter().find(|j| j.id == job_id).cloned())
    }
}

type Shared = Arc<Mutex<BackendState>>;

fn lock(state: &Shared) -> MutexGuard<'_, BackendState> {
    state.lock().unwrap()
}

pub struct FakeBackend {
    pub base_url: String,
    state: Shared,
}

impl FakeBackend {
    pub async fn start(state: BackendState) -> Self {
        let state = Arc::new(Mutex::new(state));
        let app = router(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// A client holding the expected bearer token.
    pub fn client(&self) -> ApiClient {
        ApiClient::builder(&self.base_url)
            .token(SecretString::from(TEST_TOKEN.to_string()))
            .build()
            .unwrap()
    }

    pub fn anonymous_client(&self) -> ApiClient {
        ApiClient::builder(&self.base_url).build().unwrap()
    }

    pub fn state(&self) -> MutexGuard<'_, BackendState> {
        lock(&self.state)
    }
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/v1/jobs/", get(list_jobs))
        .route("/api/v1/jobs/upload", post(upload_job))
        .route("/api/v1/jobs/service-types", get(service_types))
        .route("/api/v1/jobs/:id", get(get_job).delete(delete_job))
        .route("/api/v1/jobs/:id/enrich", post(enrich_job))
        .route("/api/v1/jobs/:id/estimate", post(estimate_job))
        .route("/api/v1/jobs/:id/run-scraping", post(run_scraping))
        .route("/api/v1/jobs/:id/run-enrichment", post(run_enrichment))
        .route("/api/v1/jobs/:id/download-enriched", get(download_enriched))
        .route("/api/v1/jobs/:id/download-scraped", get(download_scraped))
        .route("/api/v1/jobs/:id/download-images", get(download_images))
        .route("/api/v1/parts/:id/verify", post(verify_part))
        .route(
            "/api/v1/parts/images/:id",
            post(add_image).put(replace_image).delete(delete_image),
        )
        .route("/api/v1/dashboard/", get(dashboard))
        .route("/api/v1/users/me", get(current_user))
        .with_state(state)
}

fn detail_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn record_auth(state: &Shared, headers: &HeaderMap) -> Option<String> {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    lock(state).authorization.push(auth.clone());
    auth
}

async fn read_upload(query: HashMap<String, String>, mut multipart: Multipart) -> RecordedUpload {
    let mut upload = RecordedUpload {
        query,
        ..Default::default()
    };
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            upload.file_name = field.file_name().map(str::to_string);
            upload.content_type = field.content_type().map(str::to_string);
            upload.bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        } else {
            let text = field.text().await.unwrap_or_default();
            upload.fields.insert(name, text);
        }
    }
    upload
}

// ─── Jobs ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct Paging {
    skip: u64,
    limit: u64,
}

async fn list_jobs(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(paging): Query<Paging>,
) -> Response {
    record_auth(&state, &headers);
    let mut s = lock(&state);
    s.list_calls.push((paging.skip, paging.limit));
    let page: Vec<JobRecord> = s
        .jobs
        .iter()
        .skip(paging.skip as usize)
        .take(paging.limit as usize)
        .cloned()
        .collect();
    Json(json!({ "data": page, "count": s.jobs.len() })).into_response()
}

async fn get_job(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    match lock(&state).details.get(&id) {
        Some(detail) => Json(detail.clone()).into_response(),
        None => detail_error(StatusCode::NOT_FOUND, "Job not found"),
    }
}

async fn delete_job(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut s = lock(&state);
    let had_detail = s.details.remove(&id).is_some();
    if !had_detail && !s.jobs.iter().any(|j| j.id == id) {
        return detail_error(StatusCode::NOT_FOUND, "Job not found");
    }
    s.jobs.retain(|j| j.id != id);
    s.deleted.push(id);
    Json(json!({ "message": "Job deleted successfully" })).into_response()
}

async fn upload_job(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
    multipart: Multipart,
) -> Response {
    let upload = read_upload(query, multipart).await;
    let name = upload.query.get("name").cloned().unwrap_or_default();
    lock(&state).uploads.push(upload.clone());

    if name == "reject" {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "detail": [{
                    "loc": ["query", "name"],
                    "msg": "name is reserved",
                    "type": "value_error"
                }]
            })),
        )
            .into_response();
    }

    let job = json!({
        "id": "s-new",
        "type": "SCRAPING",
        "status": "PENDING",
        "name": name,
        "service_type": upload.query.get("scraper_type").cloned().unwrap_or_default(),
        "progress": 0
    });
    (StatusCode::CREATED, Json(job)).into_response()
}

#[derive(Deserialize)]
struct EnrichParams {
    enrichment_type: String,
}

async fn enrich_job(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Query(params): Query<EnrichParams>,
) -> Response {
    let mut s = lock(&state);
    if s.find_job(&id).is_none() {
        return detail_error(StatusCode::NOT_FOUND, "Job not found");
    }
    s.enrich_calls.push((id.clone(), params.enrichment_type.clone()));
    Json(json!({
        "id": "e-new",
        "type": "enrichment",
        "status": "pending",
        "name": "Enrichment",
        "service_type": params.enrichment_type,
        "parent_id": id
    }))
    .into_response()
}

async fn estimate_job(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let s = lock(&state);
    let mut job = match s.find_job(&id) {
        Some(job) => job,
        None if id.ends_with("-new") => JobRecord {
            id: id.clone(),
            kind: if id.starts_with('e') { "enrichment" } else { "scraping" }.to_string(),
            status: "pending".to_string(),
            name: "New job".to_string(),
            service_type: String::new(),
            error_message: None,
            estimated_cost: None,
            estimated_time: None,
            progress: 0.0,
            created_at: None,
            updated_at: None,
            requested_by_id: None,
            part_ids: vec![],
            parent_id: None,
            enrichment: None,
        },
        None => return detail_error(StatusCode::NOT_FOUND, "Job not found"),
    };
    job.estimated_cost = Some(Decimal::new(450, 2));
    job.estimated_time = Some(5400);
    Json(job).into_response()
}

async fn start_run(state: &Shared, id: String, what: &'static str) -> Response {
    if id == "busy" {
        return detail_error(StatusCode::CONFLICT, "Job is already running");
    }
    lock(state).runs.push((id, what));
    Json(json!({ "message": format!("{} started", what) })).into_response()
}

async fn run_scraping(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    start_run(&state, id, "scraping").await
}

async fn run_enrichment(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    start_run(&state, id, "enrichment").await
}

async fn service_types(State(state): State<Shared>) -> Response {
    let mut s = lock(&state);
    s.service_type_calls += 1;
    Json(s.service_types.clone()).into_response()
}

// ─── Downloads ──────────────────────────────────────────────────────────────

async fn download_enriched(Path(id): Path<String>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"march_{}.csv\"", id),
            ),
        ],
        "code,title\nAB-1,Water pump\n",
    )
        .into_response()
}

async fn download_scraped() -> Response {
    ([(header::CONTENT_TYPE, "text/csv")], "code\nAB-1\n").into_response()
}

async fn download_images() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "archive generation crashed").into_response()
}

// ─── Parts ──────────────────────────────────────────────────────────────────

async fn verify_part(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    lock(&state).verify_bodies.push((id.clone(), body));
    Json(json!({ "id": id, "status": "verified" })).into_response()
}

async fn add_image(
    State(state): State<Shared>,
    Path(part_id): Path<String>,
    multipart: Multipart,
) -> Response {
    let upload = read_upload(HashMap::new(), multipart).await;
    let mut s = lock(&state);
    s.image_uploads.push(upload);
    s.next_image += 1;
    let id = format!("img-new-{}", s.next_image);
    Json(json!({
        "id": id,
        "image_url": format!("https://cdn.test/{}.png", id),
        "part_id": part_id
    }))
    .into_response()
}

async fn replace_image(
    State(state): State<Shared>,
    Path(image_id): Path<String>,
    multipart: Multipart,
) -> Response {
    let upload = read_upload(HashMap::new(), multipart).await;
    lock(&state).image_uploads.push(upload);
    Json(json!({
        "id": image_id,
        "image_url": format!("https://cdn.test/{}-v2.png", image_id)
    }))
    .into_response()
}

async fn delete_image(Path(image_id): Path<String>) -> Response {
    if image_id == "img-missing" {
        return detail_error(StatusCode::NOT_FOUND, "Image not found");
    }
    Json(json!({ "message": "Image deleted successfully" })).into_response()
}

// ─── Dashboard & users ──────────────────────────────────────────────────────

async fn dashboard(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    lock(&state).dashboard_queries.push(query);
    Json(json!({
        "total_jobs": 3,
        "average_cost": 2.5,
        "average_time": 7200.0,
        "job_type_distribution": {"SCRAPING": 2, "ENRICHMENT": 1},
        "status_distribution": {"COMPLETED": 2, "FAILED": 1},
        "part_statistics": {
            "total_parts": 40,
            "parts_enriched": 30,
            "parts_verified": 10,
            "parts_not_found": 5,
            "enrichment_success_rate": 75.0
        },
        "jobs": [
            {"id": "s-1", "name": "March catalog", "type": "SCRAPING", "status": "COMPLETED"}
        ],
        "total_pages": 1
    }))
    .into_response()
}

async fn current_user(State(state): State<Shared>, headers: HeaderMap) -> Response {
    match record_auth(&state, &headers) {
        Some(auth) if auth == format!("Bearer {}", TEST_TOKEN) => Json(json!({
            "id": "u-1",
            "email": "reviewer@example.com",
            "full_name": "Rita Reviewer",
            "is_active": true,
            "is_superuser": false
        }))
        .into_response(),
        _ => detail_error(StatusCode::UNAUTHORIZED, "Not authenticated"),
    }
}
