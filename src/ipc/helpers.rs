use crate::db;
use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::model::{
    ClassInfo, FixedBreak, PlannerInputs, SchoolHours, SubjectRequirement, Teacher, TimeWindow,
    Timetable,
};
use rusqlite::Connection;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

pub const DEFAULT_DAYS: [&str; 5] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"];
pub const DEFAULT_SCHOOL_START: &str = "08:00";
pub const DEFAULT_SCHOOL_END: &str = "15:00";
pub const DEFAULT_SESSION_MINUTES: i64 = 45;

pub fn db_conn<'a>(state: &'a AppState, req: &Request) -> Result<&'a Connection, serde_json::Value> {
    state
        .db
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn parse_opt_string(v: Option<&JsonValue>) -> Result<Option<String>, &'static str> {
    match v {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => {
            let s = v.as_str().ok_or("must be string or null")?.trim().to_string();
            if s.is_empty() {
                Ok(None)
            } else {
                Ok(Some(s))
            }
        }
    }
}

pub fn parse_string_array(v: Option<&JsonValue>) -> Result<Vec<String>, &'static str> {
    match v {
        None => Ok(Vec::new()),
        Some(v) if v.is_null() => Ok(Vec::new()),
        Some(v) => {
            let arr = v.as_array().ok_or("must be array of strings")?;
            let mut out = Vec::with_capacity(arr.len());
            for item in arr {
                let s = item
                    .as_str()
                    .ok_or("must be array of strings")?
                    .trim()
                    .to_string();
                if !s.is_empty() {
                    out.push(s);
                }
            }
            Ok(out)
        }
    }
}

/// Schedule-wide configuration: the `setup.schedule` settings document with
/// defaults merged on read.
#[derive(Debug, Clone)]
pub struct ScheduleSetup {
    pub days: Vec<String>,
    pub school_hours: SchoolHours,
    pub session_duration_minutes: i64,
    pub constraints: String,
}

pub fn load_schedule_setup(conn: &Connection) -> ScheduleSetup {
    let obj = db::settings_get_json(conn, "setup.schedule")
        .ok()
        .flatten()
        .and_then(|v| v.as_object().cloned())
        .unwrap_or_default();
    let days = obj
        .get("days")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
        })
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| DEFAULT_DAYS.iter().map(|d| d.to_string()).collect());
    let hours = obj.get("schoolHours").and_then(|v| v.as_object());
    let school_hours = SchoolHours {
        start: hours
            .and_then(|h| h.get("start"))
            .and_then(|v| v.as_str())
            .unwrap_or(DEFAULT_SCHOOL_START)
            .to_string(),
        end: hours
            .and_then(|h| h.get("end"))
            .and_then(|v| v.as_str())
            .unwrap_or(DEFAULT_SCHOOL_END)
            .to_string(),
    };
    let session_duration_minutes = obj
        .get("sessionDurationMinutes")
        .and_then(|v| v.as_i64())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_SESSION_MINUTES);
    let constraints = obj
        .get("constraints")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    ScheduleSetup {
        days,
        school_hours,
        session_duration_minutes,
        constraints,
    }
}

/// Teacher directory in directory order (sort_order, then id).
pub fn load_directory(conn: &Connection) -> rusqlite::Result<Vec<Teacher>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, subjects_json, availability_json
         FROM teachers
         ORDER BY sort_order, id",
    )?;
    let rows = stmt.query_map([], |r| {
        let id: String = r.get(0)?;
        let name: String = r.get(1)?;
        let subjects_raw: String = r.get(2)?;
        let availability_raw: String = r.get(3)?;
        Ok(Teacher {
            id,
            name,
            subjects: serde_json::from_str(&subjects_raw).unwrap_or_default(),
            availability: serde_json::from_str::<BTreeMap<String, TimeWindow>>(&availability_raw)
                .unwrap_or_default(),
        })
    })?;
    rows.collect()
}

pub fn load_classes(conn: &Connection) -> rusqlite::Result<Vec<ClassInfo>> {
    let mut stmt = conn.prepare("SELECT id, name FROM classes ORDER BY sort_order, id")?;
    let mut classes: Vec<ClassInfo> = stmt
        .query_map([], |r| {
            Ok(ClassInfo {
                id: r.get(0)?,
                name: r.get(1)?,
                subjects: Vec::new(),
            })
        })?
        .collect::<Result<_, _>>()?;

    let mut subj_stmt = conn.prepare(
        "SELECT name, sessions_per_week, double_period, teacher_id
         FROM class_subjects
         WHERE class_id = ?
         ORDER BY sort_order, id",
    )?;
    for class in &mut classes {
        class.subjects = subj_stmt
            .query_map([&class.id], |r| {
                Ok(SubjectRequirement {
                    name: r.get(0)?,
                    sessions_per_week: r.get(1)?,
                    double_period: r.get::<_, i64>(2)? != 0,
                    teacher_id: r.get(3)?,
                })
            })?
            .collect::<Result<_, _>>()?;
    }
    Ok(classes)
}

pub fn load_breaks(conn: &Connection) -> rusqlite::Result<Vec<FixedBreak>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, start_time, end_time FROM breaks ORDER BY sort_order, id",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok(FixedBreak {
            id: r.get(0)?,
            name: r.get(1)?,
            start_time: r.get(2)?,
            end_time: r.get(3)?,
        })
    })?;
    rows.collect()
}

pub fn break_names(breaks: &[FixedBreak]) -> Vec<String> {
    breaks.iter().map(|b| b.name.clone()).collect()
}

/// Reassembles the stored snapshot. Absent rows mean an empty timetable,
/// never an error.
pub fn load_timetable(conn: &Connection) -> rusqlite::Result<Timetable> {
    let mut stmt = conn.prepare(
        "SELECT class_name, day, time, subject, teacher
         FROM timetable_slots
         ORDER BY class_name, day, rowid",
    )?;
    let mut timetable = Timetable::new();
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
        ))
    })?;
    for row in rows {
        let (class_name, day, time, subject, teacher) = row?;
        timetable
            .entry(class_name)
            .or_default()
            .entry(day)
            .or_default()
            .push(crate::model::ScheduleSlot {
                time,
                subject,
                teacher,
            });
    }
    Ok(timetable)
}

/// Replaces the stored snapshot wholesale inside one transaction. Duplicate
/// (class, day, time) entries keep the first occurrence. Returns the number
/// of stored slots.
pub fn store_snapshot(conn: &Connection, timetable: &Timetable) -> rusqlite::Result<i64> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM timetable_slots", [])?;
    let mut slot_count = 0i64;
    for (class_name, schedule) in timetable {
        for (day, slots) in schedule {
            for slot in slots {
                let inserted = tx.execute(
                    "INSERT OR IGNORE INTO timetable_slots(class_name, day, time, subject, teacher)
                     VALUES(?, ?, ?, ?, ?)",
                    rusqlite::params![class_name, day, slot.time, slot.subject, slot.teacher],
                )?;
                slot_count += inserted as i64;
            }
        }
    }
    tx.commit()?;
    Ok(slot_count)
}

/// Everything the generation prompt needs, assembled from the workspace.
pub fn load_planner_inputs(conn: &Connection) -> rusqlite::Result<PlannerInputs> {
    let setup = load_schedule_setup(conn);
    Ok(PlannerInputs {
        teachers: load_directory(conn)?,
        classes: load_classes(conn)?,
        days: setup.days,
        school_hours: setup.school_hours,
        session_duration_minutes: setup.session_duration_minutes,
        breaks: load_breaks(conn)?,
        constraints: setup.constraints,
    })
}
