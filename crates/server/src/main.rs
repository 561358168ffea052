use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, Query, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use server_api::{
    create_mission, deliver, get_mission, list_available, list_grouped, list_view, transition,
    ApiContext,
};
use shared::{
    domain::{Mission, MissionId, OrganizationId},
    error::{ApiError, ErrorCode},
    grouping::GroupedMissions,
    lifecycle::MissionAction,
    protocol::{ActorRequest, DeliveryReport, MissionDraft, ServerEvent},
    views::MissionView,
};
use storage::Storage;
use tokio::sync::broadcast;
use tracing::{error, info};

mod config;

use config::{load_settings, normalize_database_url};

#[derive(Clone)]
struct AppState {
    api: ApiContext,
    events: broadcast::Sender<ServerEvent>,
}

type Rejection = (StatusCode, Json<ApiError>);

#[derive(Debug, Deserialize)]
struct DeliverRequest {
    #[serde(flatten)]
    actor: ActorRequest,
    #[serde(default)]
    report: DeliveryReport,
}

#[derive(Debug, Deserialize)]
struct WsQuery {
    organization_uid: String,
    view: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let database_url = normalize_database_url(&settings.database_url);
    let storage = Storage::new(&database_url).await.map_err(|err| {
        error!(%database_url, %err, "failed to open SQLite database");
        err
    })?;
    let api = ApiContext { storage };
    let (events, _) = broadcast::channel(256);

    let state = AppState { api, events };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "dispatch server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/missions", post(http_create_mission))
        .route("/missions/:mission_uid", get(http_get_mission))
        .route("/missions/:mission_uid/assign", post(http_assign))
        .route("/missions/:mission_uid/accept", post(http_accept))
        .route("/missions/:mission_uid/start", post(http_start))
        .route("/missions/:mission_uid/deliver", post(http_deliver))
        .route("/missions/:mission_uid/release", post(http_release))
        .route(
            "/organizations/:organization_uid/views/:view",
            get(http_list_view),
        )
        .route(
            "/organizations/:organization_uid/available",
            get(http_list_available),
        )
        .route(
            "/organizations/:organization_uid/grouped",
            get(http_list_grouped),
        )
        .route("/ws", get(ws_handler))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

fn reject(err: ApiError) -> Rejection {
    let status = match err.code {
        ErrorCode::NotFound | ErrorCode::NoData => StatusCode::NOT_FOUND,
        ErrorCode::Precondition => StatusCode::CONFLICT,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(err))
}

async fn http_create_mission(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<MissionDraft>,
) -> Result<Json<ServerEvent>, Rejection> {
    let event = create_mission(&state.api, draft).await.map_err(reject)?;
    let _ = state.events.send(event.clone());
    Ok(Json(event))
}

async fn http_get_mission(
    State(state): State<Arc<AppState>>,
    Path(mission_uid): Path<String>,
) -> Result<Json<Mission>, Rejection> {
    let mission = get_mission(&state.api, &MissionId::new(mission_uid))
        .await
        .map_err(reject)?;
    Ok(Json(mission))
}

async fn run_transition(
    state: &AppState,
    action: MissionAction,
    mission_uid: String,
    actor: ActorRequest,
) -> Result<Json<ServerEvent>, Rejection> {
    let event = transition(&state.api, action, MissionId::new(mission_uid), &actor)
        .await
        .map_err(reject)?;
    let _ = state.events.send(event.clone());
    Ok(Json(event))
}

async fn http_assign(
    State(state): State<Arc<AppState>>,
    Path(mission_uid): Path<String>,
    Json(actor): Json<ActorRequest>,
) -> Result<Json<ServerEvent>, Rejection> {
    run_transition(&state, MissionAction::Assign, mission_uid, actor).await
}

async fn http_accept(
    State(state): State<Arc<AppState>>,
    Path(mission_uid): Path<String>,
    Json(actor): Json<ActorRequest>,
) -> Result<Json<ServerEvent>, Rejection> {
    run_transition(&state, MissionAction::Accept, mission_uid, actor).await
}

async fn http_start(
    State(state): State<Arc<AppState>>,
    Path(mission_uid): Path<String>,
    Json(actor): Json<ActorRequest>,
) -> Result<Json<ServerEvent>, Rejection> {
    run_transition(&state, MissionAction::Start, mission_uid, actor).await
}

async fn http_release(
    State(state): State<Arc<AppState>>,
    Path(mission_uid): Path<String>,
    Json(actor): Json<ActorRequest>,
) -> Result<Json<ServerEvent>, Rejection> {
    run_transition(&state, MissionAction::Release, mission_uid, actor).await
}

async fn http_deliver(
    State(state): State<Arc<AppState>>,
    Path(mission_uid): Path<String>,
    Json(req): Json<DeliverRequest>,
) -> Result<Json<ServerEvent>, Rejection> {
    let event = deliver(
        &state.api,
        MissionId::new(mission_uid),
        &req.actor,
        req.report,
    )
    .await
    .map_err(reject)?;
    let _ = state.events.send(event.clone());
    Ok(Json(event))
}

async fn http_list_view(
    State(state): State<Arc<AppState>>,
    Path((organization_uid, view)): Path<(String, String)>,
) -> Result<Json<Vec<Mission>>, Rejection> {
    let view = MissionView::parse(&view).ok_or_else(|| {
        reject(ApiError::new(
            ErrorCode::Validation,
            format!("unknown view '{view}'"),
        ))
    })?;
    let missions = list_view(&state.api, &OrganizationId::new(organization_uid), view)
        .await
        .map_err(reject)?;
    Ok(Json(missions))
}

async fn http_list_available(
    State(state): State<Arc<AppState>>,
    Path(organization_uid): Path<String>,
) -> Result<Json<Vec<Mission>>, Rejection> {
    let missions = list_available(&state.api, &OrganizationId::new(organization_uid))
        .await
        .map_err(reject)?;
    Ok(Json(missions))
}

async fn http_list_grouped(
    State(state): State<Arc<AppState>>,
    Path(organization_uid): Path<String>,
) -> Result<Json<GroupedMissions>, Rejection> {
    let grouped = list_grouped(&state.api, &OrganizationId::new(organization_uid))
        .await
        .map_err(reject)?;
    Ok(Json(grouped))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(q): Query<WsQuery>,
) -> Response {
    let view = match q.view.as_deref() {
        Some(raw) => match MissionView::parse(raw) {
            Some(view) => Some(view),
            None => {
                return reject(ApiError::new(
                    ErrorCode::Validation,
                    format!("unknown view '{raw}'"),
                ))
                .into_response()
            }
        },
        None => None,
    };
    let organization_uid = OrganizationId::new(q.organization_uid);
    ws.on_upgrade(move |socket| ws_connection(state, socket, organization_uid, view))
        .into_response()
}

/// Live view feed: forwards mutation events for the subscriber's
/// organization. With a view filter, an event is forwarded when the
/// mission matches the view after the mutation; the view predicate in
/// `shared::views` is the single source of that mapping.
async fn ws_connection(
    state: Arc<AppState>,
    socket: axum::extract::ws::WebSocket,
    organization_uid: OrganizationId,
    view: Option<MissionView>,
) {
    use axum::extract::ws::Message;
    use futures::{SinkExt, StreamExt};

    let (mut sender, mut receiver) = socket.split();
    let mut events_rx = state.events.subscribe();

    let send_task = tokio::spawn(async move {
        while let Ok(event) = events_rx.recv().await {
            let relevant = event.mission().is_some_and(|mission| {
                mission.organization_uid == organization_uid
                    && view.map(|v| v.matches(mission)).unwrap_or(true)
            });
            if !relevant {
                continue;
            }
            let text = match serde_json::to_string(&event) {
                Ok(v) => v,
                Err(_) => continue,
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(_msg)) = receiver.next().await {}

    send_task.abort();
}
