use crate::export;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{
    break_names, db_conn, load_breaks, load_schedule_setup, load_timetable, required_str,
};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

/// Builds the export document model for one class. Row shapes come from the
/// same grid builder as `timetable.grid`, so the exported document always
/// matches the on-screen view. Actual PDF rendering happens in the frontend.
fn handle_model(state: &mut AppState, req: &Request) -> serde_json::Value {
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

    let model = export::build_export_model(
        &timetable,
        &class_name,
        &setup.days,
        &break_names(&breaks),
    );
    match serde_json::to_value(&model) {
        Ok(v) => ok(&req.id, json!({ "document": v })),
        Err(e) => err(&req.id, "encode_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "export.model" => Some(handle_model(state, req)),
        _ => None,
    }
}
