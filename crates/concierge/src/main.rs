use bytes::Bytes;
use common::configuration::Configuration;
use common::consts::{
    CHECK_PATH, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, ESCALATION_PATH, HEALTHZ_PATH,
    POSTPROCESS_PATH, PREPROCESS_PATH, SENTIMENT_PATH, SESSIONS_PATH_PREFIX,
};
use concierge::app_state::AppState;
use concierge::handlers::errors::ConciergeError;
use concierge::handlers::escalation::handle_escalation;
use concierge::handlers::processing::{handle_check, handle_postprocess, handle_preprocess};
use concierge::handlers::request::{extract_request_id, read_body};
use concierge::handlers::sentiment::handle_sentiment;
use concierge::handlers::sessions::handle_delete_session;
use concierge::handlers::{full, respond, status_response, HandlerResponse};
use concierge::utils::tracing::init_tracer;
use http_body_util::combinators::BoxBody;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use opentelemetry::global;
use opentelemetry::trace::FutureExt;
use opentelemetry_http::HeaderExtractor;
use std::env;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, info_span, warn, Instrument};

// ---------------------------------------------------------------------------
// Configuration loading
// ---------------------------------------------------------------------------

/// Load the YAML configuration and apply environment overrides.
///
/// The path is read from `CONCIERGE_CONFIG_PATH` (env) or falls back to
/// `./concierge_config.yaml`. A missing file means defaults.
fn load_config() -> Result<Configuration, Box<dyn std::error::Error + Send + Sync>> {
    let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    eprintln!("loading concierge configuration from {}", path);

    let mut config = Configuration::load(&path)?;
    config.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Request routing
// ---------------------------------------------------------------------------

async fn body_or_error(req: Request<Incoming>) -> Result<Bytes, HandlerResponse> {
    read_body(req).await.map_err(ConciergeError::into_response)
}

/// Route an incoming HTTP request to the appropriate handler.
async fn route(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody<Bytes, hyper::Error>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = match (&method, path.as_str()) {
        (&Method::GET, HEALTHZ_PATH) => {
            let mut ok = Response::new(full("ok"));
            *ok.status_mut() = StatusCode::OK;
            ok
        }
        (&Method::POST, ESCALATION_PATH) => match body_or_error(req).await {
            Ok(body) => respond(handle_escalation(&body, &state).await),
            Err(response) => response,
        },
        (&Method::POST, SENTIMENT_PATH) => match body_or_error(req).await {
            Ok(body) => respond(handle_sentiment(&body)),
            Err(response) => response,
        },
        (&Method::POST, POSTPROCESS_PATH) => match body_or_error(req).await {
            Ok(body) => respond(handle_postprocess(&body, &state)),
            Err(response) => response,
        },
        (&Method::POST, PREPROCESS_PATH) => match body_or_error(req).await {
            Ok(body) => respond(handle_preprocess(&body, &state)),
            Err(response) => response,
        },
        (&Method::POST, CHECK_PATH) => match body_or_error(req).await {
            Ok(body) => respond(handle_check(&body, &state)),
            Err(response) => response,
        },
        (&Method::DELETE, p) if p.starts_with(SESSIONS_PATH_PREFIX) => {
            let session_id = &p[SESSIONS_PATH_PREFIX.len()..];
            if session_id.is_empty() || session_id.contains('/') {
                status_response(StatusCode::NOT_FOUND)
            } else {
                match handle_delete_session(session_id, &state).await {
                    Ok(()) => status_response(StatusCode::NO_CONTENT),
                    Err(err) => err.into_response(),
                }
            }
        }
        _ => {
            debug!(method = %method, path = %path, "no route found");
            status_response(StatusCode::NOT_FOUND)
        }
    };

    debug!(status = %response.status(), "request completed");
    Ok(response)
}

// ---------------------------------------------------------------------------
// Server loop
// ---------------------------------------------------------------------------

/// Accept connections and spawn a task per connection.
///
/// Listens for `SIGINT` / `ctrl-c` and shuts down gracefully, allowing
/// in-flight connections to finish.
async fn run_server(state: Arc<AppState>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let bind_address = state.config.server.bind_address.clone();
    let listener = TcpListener::bind(&bind_address).await?;
    info!(address = %bind_address, "server listening");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = result?;
                let io = TokioIo::new(stream);
                let state = Arc::clone(&state);

                tokio::task::spawn(async move {
                    debug!(peer = ?peer_addr, "accepted connection");

                    let service = service_fn(move |req: Request<Incoming>| {
                        let state = Arc::clone(&state);
                        let parent_cx = global::get_text_map_propagator(|p| {
                            p.extract(&HeaderExtractor(req.headers()))
                        });
                        let span = info_span!(
                            "request",
                            request_id = %extract_request_id(&req),
                            method = %req.method(),
                            path = %req.uri().path()
                        );
                        async move { route(req, state).with_context(parent_cx).await }
                            .instrument(span)
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        warn!(error = ?err, "error serving connection");
                    }
                });
            }
            _ = &mut shutdown => {
                info!("received shutdown signal, stopping server");
                break;
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = load_config()?;
    let _tracer_provider = init_tracer(&config.logging);
    info!(
        url_allowlist = ?config.processing.url_allowlist,
        preprocessing_enabled = config.processing.preprocessing_enabled,
        postprocessing_enabled = config.processing.postprocessing_enabled,
        checker_enabled = config.processing.checker_enabled,
        max_retries = config.agent.max_retries,
        "configuration loaded"
    );
    let state = Arc::new(AppState::from_config(config));
    run_server(state).await
}
