use axum::{extract::State, routing::post, Json, Router};
use outing_places::{SmartAddRequest, SmartAddResult};

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/places/smart-add", post(smart_add))
}

/// POST /v1/places/smart-add
///
/// Always 200: an unresolved query is reported as `ok: false` with notes.
async fn smart_add(
    State(state): State<AppState>,
    Json(req): Json<SmartAddRequest>,
) -> Json<SmartAddResult> {
    Json(state.resolver.resolve(&req))
}
