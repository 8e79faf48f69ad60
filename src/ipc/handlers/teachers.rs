use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{db_conn, parse_string_array, required_str};
use crate::ipc::types::{AppState, Request};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{json, Value as JsonValue};
use std::collections::HashSet;
use uuid::Uuid;

fn parse_availability(v: Option<&JsonValue>) -> Result<JsonValue, String> {
    let Some(v) = v else {
        return Ok(json!({}));
    };
    if v.is_null() {
        return Ok(json!({}));
    }
    let obj = v.as_object().ok_or("availability must be an object")?;
    for (day, window) in obj {
        let w = window
            .as_object()
            .ok_or_else(|| format!("availability.{} must be an object", day))?;
        for key in ["start", "end"] {
            if !w.get(key).map(|v| v.is_string()).unwrap_or(false) {
                return Err(format!("availability.{}.{} must be a string", day, key));
            }
        }
    }
    Ok(v.clone())
}

fn next_sort_order(conn: &Connection) -> Result<i64, String> {
    conn.query_row(
        "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM teachers",
        [],
        |r| r.get(0),
    )
    .map_err(|e| e.to_string())
}

fn teacher_row_json(r: &rusqlite::Row<'_>) -> rusqlite::Result<JsonValue> {
    let subjects_raw: String = r.get(2)?;
    let availability_raw: String = r.get(3)?;
    Ok(json!({
        "id": r.get::<_, String>(0)?,
        "name": r.get::<_, String>(1)?,
        "subjects": serde_json::from_str::<JsonValue>(&subjects_raw).unwrap_or(json!([])),
        "availability": serde_json::from_str::<JsonValue>(&availability_raw).unwrap_or(json!({})),
        "sortOrder": r.get::<_, i64>(4)?,
    }))
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return ok(&req.id, json!({ "teachers": [] }));
    };
    let mut stmt = match conn.prepare(
        "SELECT id, name, subjects_json, availability_json, sort_order
         FROM teachers
         ORDER BY sort_order, id",
    ) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let teachers = match stmt.query_map([], teacher_row_json) {
        Ok(rows) => match rows.collect::<Result<Vec<_>, _>>() {
            Ok(v) => v,
            Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
        },
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    ok(&req.id, json!({ "teachers": teachers }))
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let subjects = match parse_string_array(req.params.get("subjects")) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", format!("subjects {}", m), None),
    };
    let availability = match parse_availability(req.params.get("availability")) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let sort_order = match next_sort_order(conn) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e, None),
    };

    let teacher_id = Uuid::new_v4().to_string();
    if let Err(e) = conn.execute(
        "INSERT INTO teachers(id, name, subjects_json, availability_json, sort_order)
         VALUES(?, ?, ?, ?, ?)",
        params![
            teacher_id,
            name,
            serde_json::to_string(&subjects).unwrap_or_else(|_| "[]".to_string()),
            availability.to_string(),
            sort_order
        ],
    ) {
        return err(&req.id, "db_insert_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "teacherId": teacher_id }))
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let teacher_id = match required_str(req, "teacherId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(patch) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "missing patch", None);
    };

    let exists = match conn
        .query_row("SELECT 1 FROM teachers WHERE id = ?", [&teacher_id], |_r| Ok(()))
        .optional()
    {
        Ok(v) => v.is_some(),
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if !exists {
        return err(&req.id, "not_found", "teacher not found", None);
    }

    for (k, v) in patch {
        match k.as_str() {
            "name" => {
                let Some(s) = v.as_str().map(str::trim).filter(|s| !s.is_empty()) else {
                    return err(&req.id, "bad_params", "patch.name must be a non-empty string", None);
                };
                if let Err(e) = conn.execute(
                    "UPDATE teachers SET name = ? WHERE id = ?",
                    params![s, teacher_id],
                ) {
                    return err(&req.id, "db_update_failed", e.to_string(), None);
                }
            }
            "subjects" => {
                let subjects = match parse_string_array(Some(v)) {
                    Ok(v) => v,
                    Err(m) => {
                        return err(&req.id, "bad_params", format!("patch.subjects {}", m), None)
                    }
                };
                if let Err(e) = conn.execute(
                    "UPDATE teachers SET subjects_json = ? WHERE id = ?",
                    params![
                        serde_json::to_string(&subjects).unwrap_or_else(|_| "[]".to_string()),
                        teacher_id
                    ],
                ) {
                    return err(&req.id, "db_update_failed", e.to_string(), None);
                }
            }
            "availability" => {
                let availability = match parse_availability(Some(v)) {
                    Ok(v) => v,
                    Err(m) => return err(&req.id, "bad_params", m, None),
                };
                if let Err(e) = conn.execute(
                    "UPDATE teachers SET availability_json = ? WHERE id = ?",
                    params![availability.to_string(), teacher_id],
                ) {
                    return err(&req.id, "db_update_failed", e.to_string(), None);
                }
            }
            _ => return err(&req.id, "bad_params", format!("unknown patch field: {}", k), None),
        }
    }
    ok(&req.id, json!({ "ok": true }))
}

fn handle_remove(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let teacher_id = match required_str(req, "teacherId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    // Subject requirements fall back to "any available teacher".
    if let Err(e) = conn.execute(
        "UPDATE class_subjects SET teacher_id = NULL WHERE teacher_id = ?",
        [&teacher_id],
    ) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }
    match conn.execute("DELETE FROM teachers WHERE id = ?", [&teacher_id]) {
        Ok(0) => err(&req.id, "not_found", "teacher not found", None),
        Ok(_) => ok(&req.id, json!({ "ok": true })),
        Err(e) => err(&req.id, "db_delete_failed", e.to_string(), None),
    }
}

/// Directory order is semantic: it breaks identity-resolution ties and fixes
/// the availability view's row order.
fn handle_reorder(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let Some(ids) = req.params.get("teacherIds").and_then(|v| v.as_array()) else {
        return err(&req.id, "bad_params", "missing teacherIds", None);
    };
    let mut provided: Vec<String> = Vec::new();
    let mut seen = HashSet::new();
    for v in ids {
        let Some(s) = v.as_str().map(str::trim).filter(|s| !s.is_empty()) else {
            return err(&req.id, "bad_params", "teacherIds must be non-empty strings", None);
        };
        if seen.insert(s.to_string()) {
            provided.push(s.to_string());
        }
    }

    let mut stmt = match conn.prepare("SELECT id FROM teachers ORDER BY sort_order, id") {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let existing = match stmt.query_map([], |r| r.get::<_, String>(0)) {
        Ok(rows) => match rows.collect::<Result<Vec<_>, _>>() {
            Ok(v) => v,
            Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
        },
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let existing_set: HashSet<String> = existing.iter().cloned().collect();
    for id in &provided {
        if !existing_set.contains(id) {
            return err(&req.id, "bad_params", format!("unknown teacher id: {}", id), None);
        }
    }
    let mut final_order = provided;
    for id in existing {
        if !final_order.contains(&id) {
            final_order.push(id);
        }
    }

    let tx = match conn.unchecked_transaction() {
        Ok(t) => t,
        Err(e) => return err(&req.id, "db_tx_failed", e.to_string(), None),
    };
    for (idx, id) in final_order.iter().enumerate() {
        if let Err(e) = tx.execute(
            "UPDATE teachers SET sort_order = ? WHERE id = ?",
            params![idx as i64, id],
        ) {
            let _ = tx.rollback();
            return err(&req.id, "db_update_failed", e.to_string(), None);
        }
    }
    if let Err(e) = tx.commit() {
        return err(&req.id, "db_commit_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "teachers.list" => Some(handle_list(state, req)),
        "teachers.create" => Some(handle_create(state, req)),
        "teachers.update" => Some(handle_update(state, req)),
        "teachers.remove" => Some(handle_remove(state, req)),
        "teachers.reorder" => Some(handle_reorder(state, req)),
        _ => None,
    }
}
