use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{db_conn, parse_opt_string, required_str};
use crate::ipc::types::{AppState, Request};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

fn ensure_class_exists(conn: &Connection, class_id: &str) -> Result<(), &'static str> {
    let exists = conn
        .query_row("SELECT 1 FROM classes WHERE id = ? LIMIT 1", [class_id], |_r| Ok(()))
        .optional()
        .map_err(|_| "db_query_failed")?;
    if exists.is_some() {
        Ok(())
    } else {
        Err("not_found")
    }
}

fn subjects_for_class(conn: &Connection, class_id: &str) -> rusqlite::Result<Vec<JsonValue>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, sessions_per_week, double_period, teacher_id
         FROM class_subjects
         WHERE class_id = ?
         ORDER BY sort_order, id",
    )?;
    let rows = stmt.query_map([class_id], |r| {
        Ok(json!({
            "id": r.get::<_, String>(0)?,
            "name": r.get::<_, String>(1)?,
            "sessionsPerWeek": r.get::<_, i64>(2)?,
            "doublePeriod": r.get::<_, i64>(3)? != 0,
            "teacherId": r.get::<_, Option<String>>(4)?,
        }))
    })?;
    rows.collect()
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return ok(&req.id, json!({ "classes": [] }));
    };
    let mut stmt = match conn.prepare("SELECT id, name FROM classes ORDER BY sort_order, id") {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let base = match stmt.query_map([], |r| {
        Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
    }) {
        Ok(rows) => match rows.collect::<Result<Vec<_>, _>>() {
            Ok(v) => v,
            Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
        },
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let mut classes = Vec::with_capacity(base.len());
    for (id, name) in base {
        let subjects = match subjects_for_class(conn, &id) {
            Ok(v) => v,
            Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
        };
        classes.push(json!({ "id": id, "name": name, "subjects": subjects }));
    }
    ok(&req.id, json!({ "classes": classes }))
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
    let sort_order: i64 = match conn.query_row(
        "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM classes",
        [],
        |r| r.get(0),
    ) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let class_id = Uuid::new_v4().to_string();
    match conn.execute(
        "INSERT INTO classes(id, name, sort_order) VALUES(?, ?, ?)",
        params![class_id, name, sort_order],
    ) {
        Ok(_) => ok(&req.id, json!({ "classId": class_id })),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            err(&req.id, "duplicate_name", format!("class already exists: {}", name), None)
        }
        Err(e) => err(&req.id, "db_insert_failed", e.to_string(), None),
    }
}

fn handle_rename(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match conn.execute(
        "UPDATE classes SET name = ? WHERE id = ?",
        params![name, class_id],
    ) {
        Ok(0) => err(&req.id, "not_found", "class not found", None),
        Ok(_) => ok(&req.id, json!({ "ok": true })),
        Err(e) => err(&req.id, "db_update_failed", e.to_string(), None),
    }
}

fn handle_remove(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let tx = match conn.unchecked_transaction() {
        Ok(t) => t,
        Err(e) => return err(&req.id, "db_tx_failed", e.to_string(), None),
    };
    if let Err(e) = tx.execute("DELETE FROM class_subjects WHERE class_id = ?", [&class_id]) {
        let _ = tx.rollback();
        return err(&req.id, "db_delete_failed", e.to_string(), None);
    }
    let removed = match tx.execute("DELETE FROM classes WHERE id = ?", [&class_id]) {
        Ok(n) => n,
        Err(e) => {
            let _ = tx.rollback();
            return err(&req.id, "db_delete_failed", e.to_string(), None);
        }
    };
    if removed == 0 {
        let _ = tx.rollback();
        return err(&req.id, "not_found", "class not found", None);
    }
    if let Err(e) = tx.commit() {
        return err(&req.id, "db_commit_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "ok": true }))
}

/// Replaces the class's subject requirement list wholesale. These rows are
/// context for the generation prompt; the stored grid is never re-checked
/// against them.
fn handle_subjects_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    if let Err(code) = ensure_class_exists(conn, &class_id) {
        return err(
            &req.id,
            code,
            if code == "not_found" {
                "class not found"
            } else {
                "failed to read class"
            },
            None,
        );
    }
    let Some(subjects) = req.params.get("subjects").and_then(|v| v.as_array()) else {
        return err(&req.id, "bad_params", "missing subjects", None);
    };

    struct Parsed {
        name: String,
        sessions_per_week: i64,
        double_period: bool,
        teacher_id: Option<String>,
    }

    let mut parsed: Vec<Parsed> = Vec::with_capacity(subjects.len());
    for (idx, raw) in subjects.iter().enumerate() {
        let Some(obj) = raw.as_object() else {
            return err(&req.id, "bad_params", format!("subjects[{}] must be an object", idx), None);
        };
        let Some(name) = obj
            .get("name")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
        else {
            return err(
                &req.id,
                "bad_params",
                format!("subjects[{}].name must be a non-empty string", idx),
                None,
            );
        };
        let Some(sessions) = obj.get("sessionsPerWeek").and_then(|v| v.as_i64()).filter(|n| *n > 0)
        else {
            return err(
                &req.id,
                "bad_params",
                format!("subjects[{}].sessionsPerWeek must be a positive integer", idx),
                None,
            );
        };
        let double_period = obj
            .get("doublePeriod")
            .map(|v| v.as_bool().unwrap_or(false))
            .unwrap_or(false);
        let teacher_id = match parse_opt_string(obj.get("teacherId")) {
            Ok(v) => v,
            Err(m) => {
                return err(
                    &req.id,
                    "bad_params",
                    format!("subjects[{}].teacherId {}", idx, m),
                    None,
                )
            }
        };
        if let Some(ref tid) = teacher_id {
            let known = match conn
                .query_row("SELECT 1 FROM teachers WHERE id = ?", [tid], |_r| Ok(()))
                .optional()
            {
                Ok(v) => v.is_some(),
                Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
            };
            if !known {
                return err(
                    &req.id,
                    "bad_params",
                    format!("subjects[{}].teacherId unknown: {}", idx, tid),
                    None,
                );
            }
        }
        parsed.push(Parsed {
            name: name.to_string(),
            sessions_per_week: sessions,
            double_period,
            teacher_id,
        });
    }

    let tx = match conn.unchecked_transaction() {
        Ok(t) => t,
        Err(e) => return err(&req.id, "db_tx_failed", e.to_string(), None),
    };
    if let Err(e) = tx.execute("DELETE FROM class_subjects WHERE class_id = ?", [&class_id]) {
        let _ = tx.rollback();
        return err(&req.id, "db_delete_failed", e.to_string(), None);
    }
    for (idx, subject) in parsed.iter().enumerate() {
        if let Err(e) = tx.execute(
            "INSERT INTO class_subjects(
                id, class_id, name, sessions_per_week, double_period, teacher_id, sort_order
             ) VALUES(?, ?, ?, ?, ?, ?, ?)",
            params![
                Uuid::new_v4().to_string(),
                class_id,
                subject.name,
                subject.sessions_per_week,
                if subject.double_period { 1 } else { 0 },
                subject.teacher_id,
                idx as i64
            ],
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
        "classes.list" => Some(handle_list(state, req)),
        "classes.create" => Some(handle_create(state, req)),
        "classes.rename" => Some(handle_rename(state, req)),
        "classes.remove" => Some(handle_remove(state, req)),
        "classes.subjects.set" => Some(handle_subjects_set(state, req)),
        _ => None,
    }
}
