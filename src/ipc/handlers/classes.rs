use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};
use crate::model::DEFAULT_CLASSES;
use serde_json::json;

fn handle_classes_list(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let classes: Vec<serde_json::Value> = DEFAULT_CLASSES
        .iter()
        .map(|c| json!({ "id": c.id, "name": c.name }))
        .collect();
    ok(&req.id, json!({ "classes": classes }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "classes.list" => Some(handle_classes_list(state, req)),
        _ => None,
    }
}
