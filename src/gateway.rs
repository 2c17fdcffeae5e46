/**
 * Request Gateway
 *
 * DESIGN DECISION: actix-web HTTP surface over the Classifier/IndexLoader,
 * same stack the teacher uses for its realtime sync server
 * WHY: battle-tested async HTTP with a thread pool shared by CPU-bound
 * embedding/search work, matching the concurrency model in the spec
 *
 * Deadline enforcement wraps each `/classify` call in `tokio::time::timeout`;
 * backpressure is a counting semaphore sized by `MAX_INFLIGHT`. Both are
 * ambient resource controls the spec calls for in its concurrency model,
 * grounded in the teacher's own request-handling patterns in
 * `realtime_sync::server` (session/connection bookkeeping under a shared
 * `RwLock`), reworked around `tokio::sync::Semaphore` since this gateway has
 * no persistent per-client session state to track.
 */

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_web::{web, App, HttpResponse, HttpServer};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::artifact::Artifact;
use crate::classifier::Classifier;
use crate::config::EngineConfig;
use crate::error::Error;
use crate::index_loader::IndexLoader;
use crate::pattern::{ClassificationRequest, ClassificationResponse, ClassificationStatus};

/// Shared application state handed to every actix worker.
pub struct GatewayState {
    pub classifier: Classifier,
    pub loader: IndexLoader,
    pub config: EngineConfig,
    pub started_at: Instant,
    pub inflight: Semaphore,
    pub snapshot_id: AtomicU64,
}

impl GatewayState {
    pub fn new(classifier: Classifier, loader: IndexLoader, config: EngineConfig) -> Self {
        let inflight = Semaphore::new(config.max_inflight);
        Self {
            classifier,
            loader,
            config,
            started_at: Instant::now(),
            inflight,
            snapshot_id: AtomicU64::new(0),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    pattern_count: usize,
    vector_dim: usize,
    model_descriptor: String,
    snapshot_id: u64,
    uptime_seconds: f64,
}

#[derive(Debug, Deserialize, Default)]
struct ReloadRequest {
    #[serde(default)]
    source: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReloadResponse {
    status: &'static str,
    pattern_count: usize,
    load_time_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json("OK")
}

async fn status(state: web::Data<Arc<GatewayState>>) -> HttpResponse {
    let snapshot = state.classifier.current_snapshot();
    let body = StatusResponse {
        pattern_count: snapshot.len(),
        vector_dim: snapshot.dimension(),
        model_descriptor: snapshot.model_descriptor().to_string(),
        snapshot_id: state.snapshot_id.load(AtomicOrdering::Acquire),
        uptime_seconds: state.started_at.elapsed().as_secs_f64(),
    };
    HttpResponse::Ok().json(body)
}

async fn classify(
    state: web::Data<Arc<GatewayState>>,
    request: web::Json<ClassificationRequest>,
) -> HttpResponse {
    let state = state.into_inner();

    let _permit = match state.inflight.try_acquire() {
        Ok(permit) => permit,
        Err(_) => {
            return error_response(Error::Overloaded, Uuid::new_v4());
        }
    };

    let timeout = Duration::from_millis(state.config.request_timeout_ms);
    let request = request.into_inner();
    let task_state = state.clone();

    let classify_result = tokio::time::timeout(
        timeout,
        tokio::task::spawn_blocking(move || task_state.classifier.classify(&request)),
    )
    .await;

    match classify_result {
        Ok(Ok(Ok(response))) => HttpResponse::Ok().json(response),
        Ok(Ok(Err(err))) => error_response(err, Uuid::new_v4()),
        Ok(Err(_join_err)) => error_response(
            Error::Internal("classification task panicked".to_string()),
            Uuid::new_v4(),
        ),
        Err(_elapsed) => error_response(Error::DeadlineExceeded, Uuid::new_v4()),
    }
}

async fn reload_patterns(
    state: web::Data<Arc<GatewayState>>,
    request: Option<web::Json<ReloadRequest>>,
) -> HttpResponse {
    let started = Instant::now();

    // The artifact itself is produced by the cold path (pattern authoring,
    // embedding precomputation); this gateway only reads, validates, and
    // publishes it. `source` defaults to the path configured at startup.
    let source = request
        .and_then(|r| r.into_inner().source)
        .unwrap_or_else(|| state.config.artifact_path.clone());

    let result = read_artifact(&source).and_then(|artifact| state.loader.load_from_artifact(artifact));

    match result {
        Ok(snapshot) => {
            let count = snapshot.len();
            state.classifier.publish(snapshot);
            state.snapshot_id.fetch_add(1, AtomicOrdering::AcqRel);
            HttpResponse::Ok().json(ReloadResponse {
                status: "success",
                pattern_count: count,
                load_time_ms: started.elapsed().as_secs_f64() * 1000.0,
                error: None,
            })
        }
        Err(err) => HttpResponse::build(status_from_error(&err)).json(ReloadResponse {
            status: "error",
            pattern_count: state.classifier.current_snapshot().len(),
            load_time_ms: started.elapsed().as_secs_f64() * 1000.0,
            error: Some(err.code().to_string()),
        }),
    }
}

fn error_response(err: Error, request_id: Uuid) -> HttpResponse {
    let status = status_from_error(&err);
    let body = ClassificationResponse {
        request_id,
        matched: None,
        alternatives: Vec::new(),
        processing_time_ms: 0.0,
        status: ClassificationStatus::Error,
        error_message: Some(err.code().to_string()),
    };
    HttpResponse::build(status).json(body)
}

fn read_artifact(path: &str) -> crate::error::Result<Artifact> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| Error::LoadFailure(format!("malformed artifact at '{path}': {e}")))
}

fn status_from_error(err: &Error) -> actix_web::http::StatusCode {
    actix_web::http::StatusCode::from_u16(err.status_code())
        .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR)
}

/// Build and run the gateway HTTP server. Blocks until shutdown.
pub async fn run(state: Arc<GatewayState>) -> std::io::Result<()> {
    let bind_addr = state.config.bind_addr.clone();
    let bind_port = state.config.bind_port;

    tracing::info!(bind_addr = %bind_addr, bind_port, "starting weave classification gateway");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .route("/health", web::get().to(health))
            .route("/status", web::get().to(status))
            .route("/classify", web::post().to(classify))
            .route("/reload-patterns", web::post().to(reload_patterns))
    })
    .bind((bind_addr.as_str(), bind_port))?
    .run()
    .await
}
