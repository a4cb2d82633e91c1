use crate::ipc::error::HandlerErr;
use crate::ipc::types::AppState;
use crate::model::SeatIndex;
use crate::seating::{SeatState, SeatingChart};
use crate::store::SeatingStore;
use serde_json::json;
use tracing::debug;

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_required_class_id(params: &serde_json::Value) -> Result<String, HandlerErr> {
    let class_id = get_required_str(params, "classId")?;
    if class_id.trim().is_empty() {
        return Err(HandlerErr::bad_params("classId must not be empty"));
    }
    Ok(class_id)
}

pub fn get_required_number(params: &serde_json::Value, key: &str) -> Result<f64, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_seat_index(params: &serde_json::Value, key: &str) -> Result<SeatIndex, HandlerErr> {
    let Some(raw) = params.get(key) else {
        return Err(HandlerErr::bad_params(format!("missing {}", key)));
    };
    raw.as_u64()
        .and_then(|n| SeatIndex::try_from(n).ok())
        .ok_or_else(|| HandlerErr {
            code: "bad_params",
            message: format!("{} must be a non-negative integer", key),
            details: Some(json!({ "param": key, "value": raw })),
        })
}

/// Returns the live chart for `class_id`, loading it from the store when a
/// different class (or none) is open.
pub fn open_chart<'a>(
    state: &'a mut AppState,
    class_id: &str,
) -> Result<(&'a mut SeatingChart, &'a mut dyn SeatingStore), HandlerErr> {
    let AppState { store, chart, .. } = state;
    let store = store.as_deref_mut().ok_or_else(HandlerErr::no_workspace)?;

    if chart.as_ref().is_some_and(|c| c.class_id() != class_id) {
        *chart = None;
    }
    let chart = chart.get_or_insert_with(|| {
        debug!(class_id, "loading class");
        SeatingChart::load(&mut *store, class_id)
    });
    Ok((chart, store))
}

pub fn chart_view(chart: &SeatingChart) -> serde_json::Value {
    let cells: Vec<serde_json::Value> = chart
        .cells()
        .iter()
        .map(|cell| {
            let (state, student_id) = match cell.state {
                SeatState::Empty => ("empty", None),
                SeatState::Disabled => ("disabled", None),
                SeatState::Occupied(s) => ("occupied", Some(s.id.as_str())),
            };
            json!({
                "index": cell.index,
                "row": cell.row,
                "col": cell.col,
                "state": state,
                "studentId": student_id,
            })
        })
        .collect();

    let config = chart.config();
    json!({
        "classId": chart.class_id(),
        "rows": config.rows,
        "cols": config.cols,
        "roster": chart.roster(),
        "seating": chart.seating(),
        "disabledSeats": chart.disabled_seats(),
        "unseated": chart.unseated_students(),
        "cells": cells,
    })
}

pub fn changed_view(changed: bool, chart: &SeatingChart) -> serde_json::Value {
    json!({
        "changed": changed,
        "view": chart_view(chart),
    })
}
