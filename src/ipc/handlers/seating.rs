use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{
    changed_view, chart_view, get_required_class_id, get_required_number, get_required_str,
    get_seat_index, open_chart,
};
use crate::ipc::types::{AppState, Request};

fn handle_seating_open(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_class_id(&req.params)?;
    // Opening always rereads the store, even for the class already open.
    state.chart = None;
    let (chart, _) = open_chart(state, &class_id)?;
    Ok(chart_view(chart))
}

fn handle_seating_assign(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_class_id(&req.params)?;
    let student_id = get_required_str(&req.params, "studentId")?;
    let seat = get_seat_index(&req.params, "seatIndex")?;
    let (chart, store) = open_chart(state, &class_id)?;
    let changed = chart.assign(store, &student_id, seat);
    Ok(changed_view(changed, chart))
}

fn handle_seating_unseat(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_class_id(&req.params)?;
    let student_id = get_required_str(&req.params, "studentId")?;
    let (chart, store) = open_chart(state, &class_id)?;
    let changed = chart.unseat(store, &student_id);
    Ok(changed_view(changed, chart))
}

fn handle_seating_toggle_disabled(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_class_id(&req.params)?;
    let seat = get_seat_index(&req.params, "seatIndex")?;
    let (chart, store) = open_chart(state, &class_id)?;
    let changed = chart.toggle_disabled(store, seat);
    Ok(changed_view(changed, chart))
}

fn handle_seating_click_seat(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_class_id(&req.params)?;
    let seat = get_seat_index(&req.params, "seatIndex")?;
    let (chart, store) = open_chart(state, &class_id)?;
    let changed = chart.click_seat(store, seat);
    Ok(changed_view(changed, chart))
}

fn handle_seating_resize(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_class_id(&req.params)?;
    let rows = get_required_number(&req.params, "rows")?;
    let cols = get_required_number(&req.params, "cols")?;
    let (chart, store) = open_chart(state, &class_id)?;
    let changed = chart.resize(store, rows, cols);
    Ok(changed_view(changed, chart))
}

fn handle_seating_clear(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_class_id(&req.params)?;
    let (chart, store) = open_chart(state, &class_id)?;
    let changed = chart.clear_seating(store);
    Ok(changed_view(changed, chart))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "seating.open" => handle_seating_open(state, req),
        "seating.assign" => handle_seating_assign(state, req),
        "seating.unseat" => handle_seating_unseat(state, req),
        "seating.toggleDisabled" => handle_seating_toggle_disabled(state, req),
        "seating.clickSeat" => handle_seating_click_seat(state, req),
        "seating.resize" => handle_seating_resize(state, req),
        "seating.clear" => handle_seating_clear(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
