//! Axum router wiring.
//!
//! Every route, the fallback included, runs behind the metrics middleware so
//! unmatched paths are counted too.

use axum::{middleware, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{app_state::AppState, obs, ops, trips::handlers};

pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/trip", get(handlers::list_trips).post(handlers::create_trip))
        .route("/trip/:id", get(handlers::get_trip))
        .route("/hello", get(ops::hello))
        .route("/healthz", get(ops::healthz))
        .route("/metrics", get(ops::metrics))
        .fallback(ops::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), obs::track_http))
        .layer(TraceLayer::new_for_http());

    if state.cfg().server.cors_permissive {
        router = router.layer(CorsLayer::permissive());
    }

    router.with_state(state)
}
