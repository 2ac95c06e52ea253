use std::path::PathBuf;
use std::sync::Arc;
use warp::Filter;
use warp::filters::BoxedFilter;
use warp::filters::fs::File;

use crate::auth::{AuthError, AuthService};
use crate::game_manager::GameManager;
use crate::websocket::ConnectionManager;
use game_types::{LoginRequest, LoginResponse};

pub mod auth;
pub mod config;
pub mod game_manager;
pub mod websocket;

pub fn create_routes(
    connection_manager: Arc<ConnectionManager>,
    game_manager: Arc<GameManager>,
    auth_service: Arc<AuthService>,
    static_dir: Option<PathBuf>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let connection_manager_filter = warp::any().map({
        let connection_manager = connection_manager.clone();
        move || connection_manager.clone()
    });

    let game_manager_filter = warp::any().map({
        let game_manager = game_manager.clone();
        move || game_manager.clone()
    });

    let auth_filter = warp::any().map({
        let auth_service = auth_service.clone();
        move || auth_service.clone()
    });

    // WebSocket endpoint
    let websocket = warp::path("ws")
        .and(warp::ws())
        .and(connection_manager_filter)
        .and(game_manager_filter)
        .and(auth_filter.clone())
        .map(|ws: warp::ws::Ws, conn_mgr, game_mgr, auth| {
            ws.on_upgrade(move |socket| {
                websocket::handle_connection(socket, conn_mgr, game_mgr, auth)
            })
        });

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    let login = warp::path("login")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json::<LoginRequest>())
        .and(auth_filter)
        .and_then(handle_login);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type", "authorization"])
        .allow_methods(vec!["GET", "POST"]);

    websocket
        .or(health)
        .or(login)
        .or(static_files(static_dir))
        .with(cors)
        .with(warp::log("sketch_arena"))
}

/// The browser client, when a directory for it is configured.
fn static_files(static_dir: Option<PathBuf>) -> BoxedFilter<(File,)> {
    match static_dir {
        Some(dir) => warp::get().and(warp::fs::dir(dir)).boxed(),
        None => warp::any()
            .and_then(|| async { Err::<File, warp::Rejection>(warp::reject::not_found()) })
            .boxed(),
    }
}

async fn handle_login(
    request: LoginRequest,
    auth_service: Arc<AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match auth_service.issue_token(&request.username) {
        Ok(token) => {
            tracing::info!("Issued token for {}", request.username.trim());
            Ok(warp::reply::with_status(
                warp::reply::json(&LoginResponse { token }),
                warp::http::StatusCode::OK,
            ))
        }
        Err(AuthError::MissingUsername) => Ok(warp::reply::with_status(
            warp::reply::json(&serde_json::json!({
                "error": "Username is required"
            })),
            warp::http::StatusCode::BAD_REQUEST,
        )),
        Err(err) => {
            tracing::error!("Failed to issue token: {}", err);
            Ok(warp::reply::with_status(
                warp::reply::json(&serde_json::json!({
                    "error": "Failed to issue token"
                })),
                warp::http::StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}
