use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::get_required_class_id;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_called_on_get(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_class_id(&req.params)?;
    let store = state.store.as_deref().ok_or_else(HandlerErr::no_workspace)?;
    Ok(json!({ "studentIds": store.get_called_on(&class_id) }))
}

fn handle_called_on_save(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_class_id(&req.params)?;
    let ids: Vec<String> = req
        .params
        .get("studentIds")
        .cloned()
        .ok_or_else(|| HandlerErr::bad_params("missing studentIds"))
        .and_then(|v| {
            serde_json::from_value(v)
                .map_err(|_| HandlerErr::bad_params("studentIds must be an array of strings"))
        })?;
    let store = state
        .store
        .as_deref_mut()
        .ok_or_else(HandlerErr::no_workspace)?;
    store.save_called_on(&class_id, &ids);
    Ok(json!({ "studentIds": ids }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "calledOn.get" => handle_called_on_get(state, req),
        "calledOn.save" => handle_called_on_save(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
