mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, post, put},
    Router,
};

use crate::api::API;
use crate::error::{server_error, Error};
use crate::server::handlers::{form, map, page};

pub type DynAPI = Arc<dyn API + Send + Sync>;

pub fn router(api: DynAPI) -> Router {
    Router::new()
        .route("/page", get(page::show))
        .route("/states/load", post(form::load_states))
        .route("/form/state", put(form::select_state))
        .route("/form/city", put(form::select_city))
        .route("/form/submit", post(form::submit))
        .route("/map/click", post(map::click))
        .route("/map/search", post(map::search))
        .route("/map/fields/:field", put(map::edit_field))
        .route("/map/route", post(map::calculate))
        .route("/map/reset", post(map::reset))
        .route("/map/snapshot", get(page::snapshot))
        .layer(Extension(api))
}

pub async fn serve<T: API + Sync + Send + 'static>(api: T, addr: SocketAddr) -> Result<(), Error> {
    let api = Arc::new(api) as DynAPI;
    let app = router(api);

    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .map_err(server_error)
}
