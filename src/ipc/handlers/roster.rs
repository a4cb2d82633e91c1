use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{
    changed_view, chart_view, get_required_class_id, get_required_str, open_chart,
};
use crate::ipc::types::{AppState, Request};
use crate::model::Student;
use serde_json::json;

fn parse_roster(params: &serde_json::Value) -> Result<Vec<Student>, HandlerErr> {
    let Some(raw) = params.get("roster") else {
        return Err(HandlerErr::bad_params("missing roster"));
    };
    serde_json::from_value(raw.clone()).map_err(|e| HandlerErr {
        code: "bad_params",
        message: format!("invalid roster: {}", e),
        details: None,
    })
}

fn handle_roster_update(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_class_id(&req.params)?;
    let next = parse_roster(&req.params)?;
    let (chart, store) = open_chart(state, &class_id)?;
    let pruned = chart.update_roster(store, next);
    Ok(json!({
        "changed": true,
        "seatingPruned": pruned,
        "view": chart_view(chart),
    }))
}

fn handle_roster_add(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_class_id(&req.params)?;
    let name = req
        .params
        .get("name")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let (chart, store) = open_chart(state, &class_id)?;
    let student = chart.add_student(store, name);
    Ok(json!({
        "student": student,
        "view": chart_view(chart),
    }))
}

fn handle_roster_rename(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_class_id(&req.params)?;
    let student_id = get_required_str(&req.params, "studentId")?;
    let name = get_required_str(&req.params, "name")?;
    let (chart, store) = open_chart(state, &class_id)?;
    let changed = chart.rename_student(store, &student_id, &name);
    Ok(changed_view(changed, chart))
}

fn handle_roster_set_photo(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_class_id(&req.params)?;
    let student_id = get_required_str(&req.params, "studentId")?;
    let photo_url = match req.params.get("photoUrl") {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(_) => return Err(HandlerErr::bad_params("photoUrl must be a string or null")),
    };
    let (chart, store) = open_chart(state, &class_id)?;
    let changed = chart.set_student_photo(store, &student_id, photo_url);
    Ok(changed_view(changed, chart))
}

fn handle_roster_remove(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_class_id(&req.params)?;
    let student_id = get_required_str(&req.params, "studentId")?;
    let (chart, store) = open_chart(state, &class_id)?;
    let changed = chart.remove_student(store, &student_id);
    Ok(changed_view(changed, chart))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "roster.update" => handle_roster_update(state, req),
        "roster.add" => handle_roster_add(state, req),
        "roster.rename" => handle_roster_rename(state, req),
        "roster.setPhoto" => handle_roster_set_photo(state, req),
        "roster.remove" => handle_roster_remove(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
