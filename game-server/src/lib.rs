use std::sync::Arc;
use uuid::Uuid;
use warp::Filter;

use crate::session_registry::SessionRegistry;
use crate::websocket::ConnectionManager;
use game_types::CoordinatorError;

pub mod config;
pub mod session_registry;
pub mod websocket;

pub fn create_routes(
    connection_manager: Arc<ConnectionManager>,
    registry: Arc<SessionRegistry>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    // Clone for filters
    let connection_manager_filter = warp::any().map({
        let connection_manager = connection_manager.clone();
        move || connection_manager.clone()
    });

    let registry_filter = warp::any().map({
        let registry = registry.clone();
        move || registry.clone()
    });

    // WebSocket endpoint
    let websocket = warp::path("ws")
        .and(warp::ws())
        .and(connection_manager_filter.clone())
        .and(registry_filter.clone())
        .map(|ws: warp::ws::Ws, conn_mgr, registry| {
            ws.on_upgrade(move |socket| websocket::handle_connection(socket, conn_mgr, registry))
        });

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    // Role-projected session snapshot, for reconnecting clients
    let session_state = warp::path!("session" / String / "state")
        .and(warp::get())
        .and(warp::header::optional::<String>("x-player-id"))
        .and(registry_filter.clone())
        .and_then(handle_session_state_request);

    // CORS configuration
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type", "x-player-id"])
        .allow_methods(vec!["GET"]);

    websocket
        .or(health)
        .or(session_state)
        .with(cors)
        .with(warp::log("game_server"))
}

/// One HTTP status per error kind; the wire never carries a different
/// taxonomy than the coordinator itself.
pub fn error_status(error: &CoordinatorError) -> warp::http::StatusCode {
    use warp::http::StatusCode;
    match error {
        CoordinatorError::Unauthenticated => StatusCode::UNAUTHORIZED,
        CoordinatorError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
        CoordinatorError::NotFound { .. } => StatusCode::NOT_FOUND,
        CoordinatorError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
        CoordinatorError::FailedPrecondition { .. } => StatusCode::CONFLICT,
        CoordinatorError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn handle_session_state_request(
    session_code: String,
    player_header: Option<String>,
    registry: Arc<SessionRegistry>,
) -> Result<impl warp::Reply, warp::Rejection> {
    // An absent header is an anonymous (fully public) view; a present but
    // malformed one is a client bug worth rejecting.
    let viewer = match player_header {
        None => None,
        Some(raw) => match Uuid::parse_str(raw.trim()) {
            Ok(id) => Some(id),
            Err(_) => {
                return Ok(warp::reply::with_status(
                    warp::reply::json(&serde_json::json!({
                        "error": "Invalid X-Player-Id header"
                    })),
                    warp::http::StatusCode::BAD_REQUEST,
                ));
            }
        },
    };

    match registry.snapshot(&session_code, viewer).await {
        Ok(snapshot) => Ok(warp::reply::with_status(
            warp::reply::json(&snapshot),
            warp::http::StatusCode::OK,
        )),
        Err(error) => Ok(warp::reply::with_status(
            warp::reply::json(&serde_json::json!({
                "error": error.to_string()
            })),
            error_status(&error),
        )),
    }
}
