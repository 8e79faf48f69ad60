use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{db_conn, load_breaks};
use crate::ipc::types::{AppState, Request};
use rusqlite::params;
use serde_json::json;
use uuid::Uuid;

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return ok(&req.id, json!({ "breaks": [] }));
    };
    let breaks = match load_breaks(conn) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let rows: Vec<_> = breaks
        .iter()
        .map(|b| {
            json!({
                "id": b.id,
                "name": b.name,
                "startTime": b.start_time,
                "endTime": b.end_time,
            })
        })
        .collect();
    ok(&req.id, json!({ "breaks": rows }))
}

/// Replaces the fixed-break list wholesale, in the order given. Names feed
/// break-row consolidation; times only reach the generation prompt.
fn handle_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let Some(breaks) = req.params.get("breaks").and_then(|v| v.as_array()) else {
        return err(&req.id, "bad_params", "missing breaks", None);
    };

    let mut parsed: Vec<(String, String, String)> = Vec::with_capacity(breaks.len());
    for (idx, raw) in breaks.iter().enumerate() {
        let Some(obj) = raw.as_object() else {
            return err(&req.id, "bad_params", format!("breaks[{}] must be an object", idx), None);
        };
        let field = |key: &str| -> Option<String> {
            obj.get(key)
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
        };
        let (Some(name), Some(start), Some(end)) =
            (field("name"), field("startTime"), field("endTime"))
        else {
            return err(
                &req.id,
                "bad_params",
                format!("breaks[{}] requires name, startTime, endTime", idx),
                None,
            );
        };
        parsed.push((name, start, end));
    }

    let tx = match conn.unchecked_transaction() {
        Ok(t) => t,
        Err(e) => return err(&req.id, "db_tx_failed", e.to_string(), None),
    };
    if let Err(e) = tx.execute("DELETE FROM breaks", []) {
        let _ = tx.rollback();
        return err(&req.id, "db_delete_failed", e.to_string(), None);
    }
    for (idx, (name, start, end)) in parsed.iter().enumerate() {
        if let Err(e) = tx.execute(
            "INSERT INTO breaks(id, name, start_time, end_time, sort_order)
             VALUES(?, ?, ?, ?, ?)",
            params![Uuid::new_v4().to_string(), name, start, end, idx as i64],
        ) {
            let _ = tx.rollback();
            return err(&req.id, "db_insert_failed", e.to_string(), None);
        }
    }
    if let Err(e) = tx.commit() {
        return err(&req.id, "db_commit_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "breaks.list" => Some(handle_list(state, req)),
        "breaks.set" => Some(handle_set(state, req)),
        _ => None,
    }
}
