use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::admin::AdminState;
use crate::mbus::inbox::{BusMessage, REGISTER_SUBJECT, UNREGISTER_SUBJECT};
use crate::registry::EndpointDescriptor;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uris: usize,
    pub endpoints: usize,
}

pub async fn get_health(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uris: state.registry.num_uris(),
        endpoints: state.registry.num_endpoints(),
    })
}

pub async fn get_routes(
    State(state): State<AdminState>,
) -> Json<BTreeMap<String, Vec<EndpointDescriptor>>> {
    Json(state.registry.snapshot())
}

pub async fn post_register(State(state): State<AdminState>, body: Bytes) -> StatusCode {
    publish(&state, REGISTER_SUBJECT, body)
}

pub async fn post_unregister(State(state): State<AdminState>, body: Bytes) -> StatusCode {
    publish(&state, UNREGISTER_SUBJECT, body)
}

fn publish(state: &AdminState, subject: &str, body: Bytes) -> StatusCode {
    if state.inbox.try_publish(BusMessage::new(subject, body.to_vec())) {
        StatusCode::ACCEPTED
    } else {
        StatusCode::TOO_MANY_REQUESTS
    }
}
