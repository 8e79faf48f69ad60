use crate::grid::{classify_row, day_axis, RowKind};
use crate::model::{slot_at, ScheduleSlot, Teacher, Timetable};
use crate::resolve::resolve;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Status {
    #[serde(rename_all = "camelCase")]
    Busy {
        class_name: String,
        subject: String,
    },
    Available,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherStatus {
    pub teacher_id: String,
    pub teacher_name: String,
    #[serde(flatten)]
    pub status: Status,
    /// Present on every entry of a break row, for display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_label: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRow {
    pub time: String,
    #[serde(flatten)]
    pub kind: RowKind,
    /// One entry per directory teacher, in directory order.
    pub entries: Vec<TeacherStatus>,
}

/// Partitions the teacher directory into busy and available per time slot of
/// the selected day. Pure and total: absent classes, days, and slots are
/// simply "no session". A teacher labelled into two classes at the same time
/// keeps the last (class, subject) seen in class iteration order; that only
/// happens on inconsistent model output and this view does not police it.
pub fn compute(
    timetable: &Timetable,
    selected_day: &str,
    directory: &[Teacher],
    known_break_names: &[String],
) -> Vec<AvailabilityRow> {
    day_axis(timetable, selected_day)
        .into_iter()
        .map(|time| {
            let slots: Vec<Option<&ScheduleSlot>> = timetable
                .values()
                .map(|schedule| slot_at(schedule, selected_day, &time))
                .collect();
            let kind = classify_row(&slots, known_break_names);
            let break_label = match &kind {
                RowKind::Break { label } => Some(label.clone()),
                RowKind::Normal => None,
            };

            let mut busy: HashMap<&str, (String, String)> = HashMap::new();
            for (class_name, schedule) in timetable {
                let Some(slot) = slot_at(schedule, selected_day, &time) else {
                    continue;
                };
                let Some(label) = slot.teacher_label() else {
                    continue;
                };
                if let Some(teacher) = resolve(label, directory) {
                    busy.insert(
                        teacher.id.as_str(),
                        (class_name.clone(), slot.subject.clone()),
                    );
                }
            }

            let entries = directory
                .iter()
                .map(|teacher| {
                    let status = match busy.get(teacher.id.as_str()) {
                        Some((class_name, subject)) => Status::Busy {
                            class_name: class_name.clone(),
                            subject: subject.clone(),
                        },
                        None => Status::Available,
                    };
                    TeacherStatus {
                        teacher_id: teacher.id.clone(),
                        teacher_name: teacher.name.clone(),
                        status,
                        break_label: break_label.clone(),
                    }
                })
                .collect();

            AvailabilityRow {
                time,
                kind,
                entries,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn slot(time: &str, subject: &str, teacher: &str) -> ScheduleSlot {
        ScheduleSlot {
            time: time.to_string(),
            subject: subject.to_string(),
            teacher: teacher.to_string(),
        }
    }

    fn teacher(id: &str, name: &str) -> Teacher {
        Teacher {
            id: id.to_string(),
            name: name.to_string(),
            subjects: Vec::new(),
            availability: BTreeMap::new(),
        }
    }

    fn single_class_timetable(class: &str, day: &str, slots: Vec<ScheduleSlot>) -> Timetable {
        let mut schedule: BTreeMap<String, Vec<ScheduleSlot>> = BTreeMap::new();
        schedule.insert(day.to_string(), slots);
        let mut timetable = Timetable::new();
        timetable.insert(class.to_string(), schedule);
        timetable
    }

    #[test]
    fn busy_teacher_carries_class_and_subject_rest_available() {
        let directory = vec![
            teacher("t1", "Mrs. Sharma"),
            teacher("t2", "Mr. Rao"),
            teacher("t3", "Ms. Iyer"),
        ];
        let timetable = single_class_timetable(
            "Grade VI",
            "Monday",
            vec![slot("08:00-08:45", "Math", "Mrs. Sharma")],
        );

        let rows = compute(&timetable, "Monday", &directory, &[]);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.kind, RowKind::Normal);
        assert_eq!(row.entries.len(), 3);
        assert_eq!(
            row.entries[0].status,
            Status::Busy {
                class_name: "Grade VI".to_string(),
                subject: "Math".to_string(),
            }
        );
        assert_eq!(row.entries[1].status, Status::Available);
        assert_eq!(row.entries[2].status, Status::Available);
        assert!(row.entries.iter().all(|e| e.break_label.is_none()));
    }

    #[test]
    fn break_row_annotates_every_entry() {
        let directory = vec![teacher("t1", "Mrs. Sharma"), teacher("t2", "Mr. Rao")];
        let mut timetable = Timetable::new();
        let mut schedule: BTreeMap<String, Vec<ScheduleSlot>> = BTreeMap::new();
        for day in ["Monday", "Tuesday", "Wednesday"] {
            schedule.insert(
                day.to_string(),
                vec![slot("10:15-10:30", "Lunch", "N/A")],
            );
        }
        timetable.insert("Grade VI".to_string(), schedule);

        let rows = compute(&timetable, "Monday", &directory, &[]);
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].kind,
            RowKind::Break {
                label: "Lunch".to_string()
            }
        );
        for entry in &rows[0].entries {
            assert_eq!(entry.status, Status::Available);
            assert_eq!(entry.break_label.as_deref(), Some("Lunch"));
        }
    }

    #[test]
    fn classes_disagreeing_on_break_yield_normal_row() {
        let directory = vec![teacher("t1", "Mrs. Sharma")];
        let mut timetable = single_class_timetable(
            "Grade VI",
            "Monday",
            vec![slot("10:15-10:30", "Lunch", "N/A")],
        );
        let mut schedule: BTreeMap<String, Vec<ScheduleSlot>> = BTreeMap::new();
        schedule.insert(
            "Monday".to_string(),
            vec![slot("10:15-10:30", "Math", "Mrs. Sharma")],
        );
        timetable.insert("Grade VII".to_string(), schedule);

        let rows = compute(&timetable, "Monday", &directory, &[]);
        assert_eq!(rows[0].kind, RowKind::Normal);
        assert_eq!(
            rows[0].entries[0].status,
            Status::Busy {
                class_name: "Grade VII".to_string(),
                subject: "Math".to_string(),
            }
        );
    }

    #[test]
    fn double_booked_teacher_keeps_last_class_in_iteration_order() {
        let directory = vec![teacher("t1", "Mrs. Sharma")];
        let mut timetable = single_class_timetable(
            "Grade VI",
            "Monday",
            vec![slot("08:00-08:45", "Math", "Mrs. Sharma")],
        );
        let mut schedule: BTreeMap<String, Vec<ScheduleSlot>> = BTreeMap::new();
        schedule.insert(
            "Monday".to_string(),
            vec![slot("08:00-08:45", "Science", "Mrs. Sharma")],
        );
        timetable.insert("Grade VII".to_string(), schedule);

        let rows = compute(&timetable, "Monday", &directory, &[]);
        // BTreeMap iterates Grade VI then Grade VII; last write wins.
        assert_eq!(
            rows[0].entries[0].status,
            Status::Busy {
                class_name: "Grade VII".to_string(),
                subject: "Science".to_string(),
            }
        );
    }

    #[test]
    fn missing_day_yields_no_rows() {
        let directory = vec![teacher("t1", "Mrs. Sharma")];
        let timetable = single_class_timetable(
            "Grade VI",
            "Monday",
            vec![slot("08:00-08:45", "Math", "Mrs. Sharma")],
        );
        assert!(compute(&timetable, "Sunday", &directory, &[]).is_empty());
    }

    #[test]
    fn unresolved_labels_leave_everyone_available() {
        let directory = vec![teacher("t1", "Mrs. Sharma")];
        let timetable = single_class_timetable(
            "Grade VI",
            "Monday",
            vec![slot("08:00-08:45", "Math", "Visiting Examiner")],
        );
        let rows = compute(&timetable, "Monday", &directory, &[]);
        assert_eq!(rows[0].entries[0].status, Status::Available);
    }
}
