use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A teacher in the directory. The engine only reads these; the frontend's
/// data-entry forms create and edit them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subjects: Vec<String>,
    /// Weekly availability overrides, day name -> window.
    #[serde(default)]
    pub availability: BTreeMap<String, TimeWindow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    pub start: String,
    pub end: String,
}

/// Per-class subject requirement. Context for the generation request only;
/// the grid is never re-validated against these counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRequirement {
    pub name: String,
    pub sessions_per_week: i64,
    #[serde(default)]
    pub double_period: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subjects: Vec<SubjectRequirement>,
}

/// A fixed break. The name feeds break-row consolidation; the times are
/// hints for the generation prompt only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedBreak {
    pub id: String,
    pub name: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolHours {
    pub start: String,
    pub end: String,
}

/// Everything the generation service needs to produce a timetable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerInputs {
    pub teachers: Vec<Teacher>,
    pub classes: Vec<ClassInfo>,
    pub days: Vec<String>,
    pub school_hours: SchoolHours,
    pub session_duration_minutes: i64,
    pub breaks: Vec<FixedBreak>,
    #[serde(default)]
    pub constraints: String,
}

/// One cell of a generated schedule. `subject` empty means no session;
/// `teacher` is free text, with "N/A" meaning no teacher (breaks).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    pub time: String,
    pub subject: String,
    pub teacher: String,
}

/// The sentinel teacher label meaning "no teacher", e.g. on break slots.
pub const NO_TEACHER: &str = "N/A";

/// Slots for one (class, day) pair. Unordered on input; lookups key by time
/// label and keep the first occurrence.
pub type DaySchedule = Vec<ScheduleSlot>;

/// Day name -> schedule for one class. Day names are configuration strings,
/// not fixed weekdays.
pub type ClassSchedule = BTreeMap<String, DaySchedule>;

/// Class name -> schedule. BTreeMap keeps class iteration deterministic no
/// matter what order the model emitted them in.
pub type Timetable = BTreeMap<String, ClassSchedule>;

/// First slot with the given time label, if any. Duplicate labels within a
/// day are tolerated by taking the first occurrence.
pub fn slot_at<'a>(
    schedule: &'a ClassSchedule,
    day: &str,
    time: &str,
) -> Option<&'a ScheduleSlot> {
    schedule
        .get(day)
        .and_then(|slots| slots.iter().find(|s| s.time == time))
}

impl ScheduleSlot {
    /// Whether the slot carries a real session (non-empty subject).
    pub fn has_session(&self) -> bool {
        !self.subject.is_empty()
    }

    /// Teacher label, unless empty or the "N/A" sentinel.
    pub fn teacher_label(&self) -> Option<&str> {
        if self.teacher.is_empty() || self.teacher == NO_TEACHER {
            None
        } else {
            Some(self.teacher.as_str())
        }
    }
}
