use crate::config::Config;
use crate::engine::{parse_language_hints, plate_number};
use crate::engines::{self, EngineSlot};
use crate::error::ServiceError;
use crate::preprocessing::{
    overlay, Pipeline, PipelineParams, PreprocessOptions, ScoredCandidate, StepTiming,
};
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, DefaultBodyLimit, Multipart, Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub recognizer: Arc<EngineSlot>,
    pub config: Arc<Config>,
}

/// Uploaded image plus optional form fields
struct Upload {
    data: Bytes,
    languages: Option<String>,
}

/// Plate detection response
#[derive(Serialize)]
pub struct DetectResponse {
    pub width: u32,
    pub height: u32,
    pub candidates: Vec<ScoredCandidate>,
    pub selected: Option<ScoredCandidate>,
    pub processing_time_ms: u64,
}

/// Recognition response
#[derive(Serialize)]
pub struct RecognizeResponse {
    pub text: String,
    pub plate_number: String,
    pub confidence: f32,
    pub engine: String,
    pub plate_detected: bool,
    pub processing_time_ms: u64,
    pub steps: Vec<StepTiming>,
    pub warnings: Vec<String>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub engine: Option<String>,
    pub engine_description: Option<String>,
    pub engine_ready: bool,
    pub supported_languages: Vec<String>,
    pub max_file_size_bytes: usize,
    pub pipeline: PipelineParams,
    pub default_options: PreprocessOptions,
}

/// Build the router for the given state
pub fn router(state: AppState) -> Router {
    let max_file_size = state.config.max_file_size;

    Router::new()
        .route("/preprocess", post(handle_preprocess))
        .route("/detect", post(handle_detect))
        .route("/detect/overlay", post(handle_detect_overlay))
        .route("/recognize", post(handle_recognize))
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .layer(DefaultBodyLimit::max(max_file_size))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let config = Arc::new(config);
    let recognizer = Arc::new(EngineSlot::empty());

    let state = AppState {
        pipeline: Arc::new(Pipeline::new(config.pipeline)),
        recognizer: recognizer.clone(),
        config: config.clone(),
    };

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    engines::spawn_loader(config, recognizer);

    axum::serve(listener, router(state)).await?;

    Ok(())
}

/// Parse the multipart form and enforce the upload size limit
async fn read_upload(
    mut multipart: Multipart,
    max_file_size: usize,
) -> Result<Upload, ServiceError> {
    let mut file_data: Option<Bytes> = None;
    let mut languages: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::from_multipart(e, max_file_size))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                file_data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| ServiceError::from_multipart(e, max_file_size))?,
                );
            }
            "languages" => {
                languages = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ServiceError::from_multipart(e, max_file_size))?,
                );
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let data = file_data.ok_or(ServiceError::MissingFile)?;

    if data.len() > max_file_size {
        return Err(ServiceError::ImageTooLarge {
            size: data.len(),
            max: max_file_size,
        });
    }

    Ok(Upload { data, languages })
}

/// Run CPU-bound work off the async runtime threads
async fn blocking<T, F>(f: F) -> Result<T, ServiceError>
where
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServiceError::Internal(format!("Worker task failed: {}", e)))?
}

fn png_response(png: Vec<u8>, mut headers: HeaderMap) -> Response {
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/png"));
    (headers, png).into_response()
}

/// Preprocess an uploaded photo and return the normalized plate raster as PNG
async fn handle_preprocess(
    State(state): State<AppState>,
    options: Result<Query<PreprocessOptions>, QueryRejection>,
    multipart: Multipart,
) -> Result<Response, ServiceError> {
    let Query(options) = options?;
    let upload = read_upload(multipart, state.config.max_file_size).await?;
    let pipeline = state.pipeline.clone();

    let (png, result) = blocking(move || {
        let result = pipeline.preprocess(&upload.data, &options)?;
        let png = result.buffer.encode_png()?;
        Ok((png, result))
    })
    .await?;

    tracing::info!(
        "Preprocessed to {}x{} in {}ms, plate detected: {}",
        result.buffer.width(),
        result.buffer.height(),
        result.total_time_ms,
        result.plate_region.is_some()
    );

    let mut headers = HeaderMap::new();
    headers.insert("x-preprocess-time-ms", HeaderValue::from(result.total_time_ms));
    headers.insert(
        "x-plate-detected",
        HeaderValue::from_static(if result.plate_region.is_some() {
            "true"
        } else {
            "false"
        }),
    );

    Ok(png_response(png, headers))
}

/// Report plate candidates found in the filtered photo
async fn handle_detect(
    State(state): State<AppState>,
    options: Result<Query<PreprocessOptions>, QueryRejection>,
    multipart: Multipart,
) -> Result<Json<DetectResponse>, ServiceError> {
    let Query(options) = options?;
    let start = Instant::now();
    let upload = read_upload(multipart, state.config.max_file_size).await?;
    let pipeline = state.pipeline.clone();

    let (dimensions, detection) = blocking(move || {
        let filtered = pipeline.preprocess(&upload.data, &options.filters_only())?;
        let detection = pipeline.detect(&filtered.buffer);
        Ok((filtered.buffer.dimensions(), detection))
    })
    .await?;

    let processing_time_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        "Detection found {} candidates in {}ms",
        detection.candidates.len(),
        processing_time_ms
    );

    Ok(Json(DetectResponse {
        width: dimensions.0,
        height: dimensions.1,
        candidates: detection.candidates,
        selected: detection.selected,
        processing_time_ms,
    }))
}

/// Render plate candidates over the filtered photo
async fn handle_detect_overlay(
    State(state): State<AppState>,
    options: Result<Query<PreprocessOptions>, QueryRejection>,
    multipart: Multipart,
) -> Result<Response, ServiceError> {
    let Query(options) = options?;
    let upload = read_upload(multipart, state.config.max_file_size).await?;
    let pipeline = state.pipeline.clone();

    let png = blocking(move || {
        let filtered = pipeline.preprocess(&upload.data, &options.filters_only())?;
        let detection = pipeline.detect(&filtered.buffer);
        let canvas = overlay::draw_detection(filtered.buffer, &detection)?;
        Ok(canvas.encode_png()?)
    })
    .await?;

    Ok(png_response(png, HeaderMap::new()))
}

/// Preprocess an uploaded photo and read the plate number from it
async fn handle_recognize(
    State(state): State<AppState>,
    options: Result<Query<PreprocessOptions>, QueryRejection>,
    multipart: Multipart,
) -> Result<Json<RecognizeResponse>, ServiceError> {
    let Query(options) = options?;
    let start = Instant::now();
    let upload = read_upload(multipart, state.config.max_file_size).await?;
    let recognizer = state
        .recognizer
        .get()
        .ok_or(ServiceError::EngineUnavailable)?;
    let hints = parse_language_hints(upload.languages.as_deref());
    let pipeline = state.pipeline.clone();
    let engine_name = recognizer.name().to_string();

    let (result, recognition) = blocking(move || {
        let result = pipeline.preprocess(&upload.data, &options)?;
        let png = result.buffer.encode_png()?;
        let recognition = recognizer.recognize(&png, &hints)?;
        Ok((result, recognition))
    })
    .await?;

    let mut warnings = recognition.warnings;
    if options.detect_plate_region && result.plate_region.is_none() {
        warnings.push("No plate region detected, recognized the whole image".to_string());
    }

    let processing_time_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        "Recognition completed in {}ms, confidence: {:.2}, text length: {}",
        processing_time_ms,
        recognition.confidence,
        recognition.text.len()
    );

    Ok(Json(RecognizeResponse {
        plate_number: plate_number(&recognition.text),
        text: recognition.text,
        confidence: recognition.confidence,
        engine: engine_name,
        plate_detected: result.plate_region.is_some(),
        processing_time_ms,
        steps: result.steps,
        warnings,
    }))
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.recognizer.get();
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        engine: engine.as_ref().map(|e| e.name().to_string()),
        engine_description: engine.as_ref().map(|e| e.description().to_string()),
        engine_ready: engine.is_some(),
        supported_languages: engine
            .as_ref()
            .map(|e| e.supported_languages())
            .unwrap_or_default(),
        max_file_size_bytes: state.config.max_file_size,
        pipeline: *state.pipeline.params(),
        default_options: PreprocessOptions::default(),
    })
}
