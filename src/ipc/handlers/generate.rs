use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{
    db_conn, load_planner_inputs, load_timetable, required_str, store_snapshot,
};
use crate::ipc::types::{AppState, Request};
use crate::prompt;
use serde_json::json;

/// Assembles the generation call from the stored inputs. The frontend sends
/// it to the model service and brings the reply back via `generate.ingest`.
fn handle_generate_request(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let inputs = match load_planner_inputs(conn) {
        Ok(i) => i,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if inputs.classes.is_empty() {
        return err(&req.id, "bad_state", "no classes configured", None);
    }
    let request = match prompt::build_generation_request(&inputs) {
        Ok(r) => r,
        Err(e) => return err(&req.id, "encode_failed", e.to_string(), None),
    };
    match serde_json::to_value(&request) {
        Ok(v) => ok(&req.id, json!({ "request": v })),
        Err(e) => err(&req.id, "encode_failed", e.to_string(), None),
    }
}

/// Same, for a modification round-trip: embeds the current snapshot and the
/// user's free-text change request.
fn handle_modify_request(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let modification = match required_str(req, "request") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let inputs = match load_planner_inputs(conn) {
        Ok(i) => i,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let current = match load_timetable(conn) {
        Ok(t) => t,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if current.is_empty() {
        return err(&req.id, "bad_state", "no timetable to modify", None);
    }
    let request = match prompt::build_modification_request(&inputs, &current, &modification) {
        Ok(r) => r,
        Err(e) => return err(&req.id, "encode_failed", e.to_string(), None),
    };
    match serde_json::to_value(&request) {
        Ok(v) => ok(&req.id, json!({ "request": v })),
        Err(e) => err(&req.id, "encode_failed", e.to_string(), None),
    }
}

/// Parses the model service's reply and replaces the stored snapshot. A
/// reply that does not parse leaves the previous snapshot untouched.
fn handle_ingest(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let text = match required_str(req, "responseText") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let timetable = match prompt::parse_timetable_response(&text) {
        Ok(t) => t,
        Err(e) => return err(&req.id, "bad_response", format!("{e:#}"), None),
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

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "generate.request" => Some(handle_generate_request(state, req)),
        "modify.request" => Some(handle_modify_request(state, req)),
        "generate.ingest" => Some(handle_ingest(state, req)),
        _ => None,
    }
}
