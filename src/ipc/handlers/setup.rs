use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{db_conn, load_schedule_setup};
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Map, Value};

fn setup_to_json(setup: &crate::ipc::helpers::ScheduleSetup) -> Value {
    json!({
        "days": setup.days,
        "schoolHours": { "start": setup.school_hours.start, "end": setup.school_hours.end },
        "sessionDurationMinutes": setup.session_duration_minutes,
        "constraints": setup.constraints,
    })
}

fn handle_setup_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({ "schedule": setup_to_json(&load_schedule_setup(conn)) }),
    )
}

fn validate_days(v: &Value) -> Result<Vec<String>, String> {
    let arr = v.as_array().ok_or("days must be an array of strings")?;
    let mut out: Vec<String> = Vec::with_capacity(arr.len());
    for item in arr {
        let s = item
            .as_str()
            .ok_or("days must be an array of strings")?
            .trim()
            .to_string();
        if s.is_empty() {
            return Err("days must not contain empty names".to_string());
        }
        if out.contains(&s) {
            return Err(format!("duplicate day name: {}", s));
        }
        out.push(s);
    }
    if out.is_empty() {
        return Err("days must contain at least one day".to_string());
    }
    Ok(out)
}

fn validate_school_hours(v: &Value) -> Result<(String, String), &'static str> {
    let obj = v.as_object().ok_or("schoolHours must be an object")?;
    let get = |key: &str| -> Result<String, &'static str> {
        obj.get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or("schoolHours requires non-empty start and end")
    };
    Ok((get("start")?, get("end")?))
}

fn handle_setup_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let Some(patch) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "missing patch", None);
    };

    let mut setup = load_schedule_setup(conn);
    for (k, v) in patch {
        match k.as_str() {
            "days" => match validate_days(v) {
                Ok(days) => setup.days = days,
                Err(m) => return err(&req.id, "bad_params", m, None),
            },
            "schoolHours" => match validate_school_hours(v) {
                Ok((start, end)) => {
                    setup.school_hours.start = start;
                    setup.school_hours.end = end;
                }
                Err(m) => return err(&req.id, "bad_params", m, None),
            },
            "sessionDurationMinutes" => match v.as_i64() {
                Some(n) if n > 0 => setup.session_duration_minutes = n,
                _ => {
                    return err(
                        &req.id,
                        "bad_params",
                        "sessionDurationMinutes must be a positive integer",
                        None,
                    )
                }
            },
            "constraints" => match v.as_str() {
                Some(s) => setup.constraints = s.to_string(),
                None => return err(&req.id, "bad_params", "constraints must be string", None),
            },
            _ => return err(&req.id, "bad_params", format!("unknown patch field: {}", k), None),
        }
    }

    let doc = setup_to_json(&setup);
    let as_map: Map<String, Value> = doc.as_object().cloned().unwrap_or_default();
    if let Err(e) = db::settings_set_json(conn, "setup.schedule", &Value::Object(as_map)) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "schedule": doc }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "setup.get" => Some(handle_setup_get(state, req)),
        "setup.update" => Some(handle_setup_update(state, req)),
        _ => None,
    }
}
