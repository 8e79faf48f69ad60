use crate::drag;
use crate::grid;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{
    break_names, db_conn, load_breaks, load_schedule_setup, load_timetable, required_str,
    store_snapshot,
};
use crate::ipc::types::{AppState, Request};
use crate::model::Timetable;
use serde_json::json;

/// Replaces the stored snapshot with a freshly generated/modified timetable.
/// The daemon treats the value as opaque: no count validation, no collision
/// checks. Duplicate (class, day, time) entries keep the first occurrence.
fn handle_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let Some(raw) = req.params.get("timetable") else {
        return err(&req.id, "bad_params", "missing timetable", None);
    };
    let timetable: Timetable = match serde_json::from_value(raw.clone()) {
        Ok(v) => v,
        Err(e) => {
            return err(
                &req.id,
                "bad_params",
                format!("timetable does not match the expected shape: {}", e),
                None,
            )
        }
    };

    let slot_count = match store_snapshot(conn, &timetable) {
        Ok(n) => n,
        Err(e) => return err(&req.id, "db_update_failed", e.to_string(), None),
    };
    ok(
        &req.id,
        json!({ "classes": timetable.len(), "slots": slot_count }),
    )
}

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    match load_timetable(conn) {
        Ok(timetable) => ok(&req.id, json!({ "timetable": timetable })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

/// Canonical time axis, either for one class across the configured days or
/// for one day across every class. Exactly one scope must be given.
fn handle_axis(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let class_name = req
        .params
        .get("className")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let day = req
        .params
        .get("day")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let timetable = match load_timetable(conn) {
        Ok(t) => t,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let times = match (class_name, day) {
        (Some(class_name), None) => {
            let setup = load_schedule_setup(conn);
            timetable
                .get(class_name)
                .map(|schedule| grid::class_axis(schedule, &setup.days))
                .unwrap_or_default()
        }
        (None, Some(day)) => grid::day_axis(&timetable, day),
        _ => {
            return err(
                &req.id,
                "bad_params",
                "provide exactly one of className or day",
                None,
            )
        }
    };
    ok(&req.id, json!({ "times": times }))
}

fn handle_grid(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let class_name = match required_str(req, "className") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let timetable = match load_timetable(conn) {
        Ok(t) => t,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let setup = load_schedule_setup(conn);
    let breaks = match load_breaks(conn) {
        Ok(b) => b,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let model = grid::build_grid(&timetable, &class_name, &setup.days, &break_names(&breaks));
    match serde_json::to_value(&model) {
        Ok(v) => ok(&req.id, json!({ "grid": v })),
        Err(e) => err(&req.id, "encode_failed", e.to_string(), None),
    }
}

/// Captures a drop as a `MoveIntent`, or nothing. Malformed payloads and
/// cross-class drops answer `intent: null` rather than an error; the drop is
/// simply a no-op for the frontend. The intent is never applied here — the
/// owner decides what to do with it (usually a modification round-trip).
fn handle_propose_move(state: &mut AppState, req: &Request) -> serde_json::Value {
    if state.db.is_none() {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    }
    let displayed_class = match required_str(req, "displayedClass") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let to_day = match required_str(req, "toDay") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let to_time = match required_str(req, "toTime") {
        Ok(v) => v,
        Err(e) => return e,
    };
    // The payload travels as the JSON string the frontend put on the drag;
    // an object is tolerated and serialized as-is.
    let payload_json = match req.params.get("payload") {
        Some(v) if v.is_string() => v.as_str().unwrap_or_default().to_string(),
        Some(v) => v.to_string(),
        None => String::new(),
    };

    let intent = drag::propose_move(&displayed_class, &payload_json, &to_day, &to_time);
    match intent {
        Some(intent) => match serde_json::to_value(&intent) {
            Ok(v) => ok(&req.id, json!({ "intent": v })),
            Err(e) => err(&req.id, "encode_failed", e.to_string(), None),
        },
        None => ok(&req.id, json!({ "intent": null })),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "timetable.set" => Some(handle_set(state, req)),
        "timetable.get" => Some(handle_get(state, req)),
        "timetable.axis" => Some(handle_axis(state, req)),
        "timetable.grid" => Some(handle_grid(state, req)),
        "timetable.proposeMove" => Some(handle_propose_move(state, req)),
        _ => None,
    }
}
