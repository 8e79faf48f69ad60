use crate::availability;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{
    break_names, db_conn, load_breaks, load_directory, load_timetable, required_str,
};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

/// Substitution view: for the selected day, who is teaching where and who is
/// free, per time slot. Purely derived from the stored snapshot and the
/// directory; an empty or partial timetable just yields fewer rows.
fn handle_compute(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let day = match required_str(req, "day") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let timetable = match load_timetable(conn) {
        Ok(t) => t,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let directory = match load_directory(conn) {
        Ok(d) => d,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let breaks = match load_breaks(conn) {
        Ok(b) => b,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let rows = availability::compute(&timetable, &day, &directory, &break_names(&breaks));
    match serde_json::to_value(&rows) {
        Ok(v) => ok(&req.id, json!({ "day": day, "rows": v })),
        Err(e) => err(&req.id, "encode_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "availability.compute" => Some(handle_compute(state, req)),
        _ => None,
    }
}
