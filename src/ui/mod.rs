pub mod page;

use crate::{
    config::Config,
    error::GenError,
    models::{Banner, GenerationParameters},
    pipeline::Pipeline,
    session::{SessionHandle, SessionState, SessionStore},
    torchserve::{HealthCheck, InferenceClient},
};
use actix_web::{
    cookie::Cookie, http::StatusCode, web, App, HttpRequest, HttpResponse, HttpServer,
    ResponseError,
};
use serde::Deserialize;
use std::sync::{Arc, MutexGuard};
use uuid::Uuid;

use page::{render_page, PageView};

/// Remembers the browser's latest page session so a reload can discard it.
pub const SESSION_COOKIE: &str = "genstudio_session";

pub struct AppState {
    pub pipeline: Pipeline,
    pub health: Arc<dyn HealthCheck>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(pipeline: Pipeline, health: Arc<dyn HealthCheck>) -> Self {
        Self {
            pipeline,
            health,
            sessions: SessionStore::new(),
        }
    }

    pub fn from_client(client: &InferenceClient) -> Self {
        Self::new(Pipeline::from_client(client), client.health_check())
    }
}

/// Fields posted by the page form. Kept flat: urlencoded numbers do not survive
/// `#[serde(flatten)]`.
#[derive(Debug, Deserialize)]
pub struct GenerateForm {
    /// Session id rendered into the page; missing or malformed starts a new session.
    pub session: Option<String>,
    pub prompt: String,
    pub images_num: usize,
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_k: u32,
    pub num_inference_steps: u32,
    pub guidance_scale: f32,
    pub height: u32,
    pub width: u32,
}

impl GenerateForm {
    pub fn session_id(&self) -> Uuid {
        self.session
            .as_deref()
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4)
    }

    pub fn params(&self) -> GenerationParameters {
        GenerationParameters {
            images_num: self.images_num,
            max_new_tokens: self.max_new_tokens,
            temperature: self.temperature,
            top_k: self.top_k,
            num_inference_steps: self.num_inference_steps,
            guidance_scale: self.guidance_scale,
            height: self.height,
            width: self.width,
        }
    }
}

impl ResponseError for GenError {
    fn status_code(&self) -> StatusCode {
        match self {
            GenError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            GenError::Connectivity(_) => StatusCode::SERVICE_UNAVAILABLE,
            GenError::Inference { .. }
            | GenError::InsufficientPrompts { .. }
            | GenError::Decode(_)
            | GenError::Request(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn cookie_session(req: &HttpRequest) -> Option<Uuid> {
    req.cookie(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
}

fn lock_session(
    handle: &SessionHandle,
    id: Uuid,
) -> Result<MutexGuard<'_, SessionState>, GenError> {
    handle
        .lock()
        .map_err(|_| GenError::Session(format!("session {} is poisoned", id)))
}

fn html_response(id: Uuid, html: String) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(
            Cookie::build(SESSION_COOKIE, id.to_string())
                .path("/")
                .http_only(true)
                .finish(),
        )
        .content_type("text/html; charset=utf-8")
        .body(html)
}

fn render_session(
    session: &SessionState,
    id: Uuid,
    status: &[Banner],
    messages: &[Banner],
    generate_enabled: bool,
) -> Result<String, GenError> {
    render_page(&PageView {
        session: id,
        status,
        messages,
        params: session.last_params(),
        prompt: session.last_prompt(),
        entries: session.entries(),
        generate_enabled,
    })
}

/// A page load always starts over: the previous page's session is discarded and the
/// new one is only stored once something is generated.
async fn index(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, GenError> {
    if let Some(previous) = cookie_session(&req) {
        state.sessions.end(previous);
    }

    let id = Uuid::new_v4();
    let report = state.health.probe().await;

    let html = render_session(
        &SessionState::new(),
        id,
        &report.banners(),
        &[],
        report.host_reachable(),
    )?;
    Ok(html_response(id, html))
}

async fn generate(
    state: web::Data<AppState>,
    form: web::Form<GenerateForm>,
) -> Result<HttpResponse, GenError> {
    let form = form.into_inner();
    let id = form.session_id();
    let params = form.params();

    let handle = state.sessions.session(id);
    lock_session(&handle, id)?.remember_input(&form.prompt, params);

    let report = state.health.probe().await;
    let outcome = if report.host_reachable() {
        state.pipeline.run(&form.prompt, &params).await
    } else {
        Err(GenError::Connectivity(
            "inference host did not answer the health check".into(),
        ))
    };

    let mut session = lock_session(&handle, id)?;
    let messages = match outcome {
        Ok(images) => {
            let count = images.len();
            session.prepend_batch(images);
            log::info!("Session {} received {} new image(s)", id, count);
            Vec::new()
        }
        Err(e) => {
            log::error!("Generation failed for session {}: {}", id, e);
            vec![Banner::error(e.to_string())]
        }
    };

    let html = render_session(
        &session,
        id,
        &report.banners(),
        &messages,
        report.host_reachable(),
    )?;
    Ok(html_response(id, html))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/generate", web::post().to(generate));
}

pub async fn serve(config: Config) -> std::io::Result<()> {
    let client = InferenceClient::new(&config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    let state = web::Data::new(AppState::from_client(&client));

    HttpServer::new(move || App::new().app_data(state.clone()).configure(routes))
        .bind(config.bind_address())?
        .run()
        .await
}
