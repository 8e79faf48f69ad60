use crate::model::{slot_at, ClassSchedule, DaySchedule, ScheduleSlot, Timetable};
use serde::Serialize;
use std::collections::HashSet;

/// Break labels recognized even when the workspace defines no fixed breaks.
pub const FALLBACK_BREAK_NAMES: [&str; 4] = ["Break", "Lunch", "Recess", "Assembly"];

/// Collects every distinct time label from the given day schedules and sorts
/// them by the substring before the first `-`, compared as plain strings.
/// That ordering is correct for zero-padded 24h "HH:MM-HH:MM" labels and is
/// not guaranteed for anything else. Recomputed on every call.
pub fn normalize_axis<'a, I>(schedules: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a DaySchedule>,
{
    let mut seen = HashSet::new();
    let mut labels: Vec<String> = Vec::new();
    for day in schedules {
        for slot in day {
            if seen.insert(slot.time.clone()) {
                labels.push(slot.time.clone());
            }
        }
    }
    labels.sort_by(|a, b| start_key(a).cmp(start_key(b)).then_with(|| a.cmp(b)));
    labels
}

fn start_key(label: &str) -> &str {
    label.split('-').next().unwrap_or(label).trim()
}

/// Axis for one class across the given days.
pub fn class_axis(schedule: &ClassSchedule, days: &[String]) -> Vec<String> {
    normalize_axis(days.iter().filter_map(|d| schedule.get(d)))
}

/// Axis for one day across every class in the timetable.
pub fn day_axis(timetable: &Timetable, day: &str) -> Vec<String> {
    normalize_axis(timetable.values().filter_map(|cs| cs.get(day)))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RowKind {
    Normal,
    Break { label: String },
}

/// One slot per column (day in the class view, class in the day view). The
/// row is a break iff every column has a slot, all subjects equal the first
/// one, the subject is non-empty, and it is a known break name. The grid
/// renderer and the export model both go through here; they must never
/// disagree.
pub fn classify_row(slots: &[Option<&ScheduleSlot>], known_break_names: &[String]) -> RowKind {
    let Some(Some(first)) = slots.first() else {
        return RowKind::Normal;
    };
    let subject = first.subject.as_str();
    if subject.is_empty() {
        return RowKind::Normal;
    }
    let consistent = slots
        .iter()
        .all(|s| s.map(|s| s.subject == subject).unwrap_or(false));
    if !consistent {
        return RowKind::Normal;
    }
    let known = known_break_names.iter().any(|n| n == subject)
        || FALLBACK_BREAK_NAMES.contains(&subject);
    if known {
        RowKind::Break {
            label: subject.to_string(),
        }
    } else {
        RowKind::Normal
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    pub day: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher: Option<String>,
    /// Whether the frontend should allow dragging this cell.
    pub draggable: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRow {
    pub time: String,
    #[serde(flatten)]
    pub kind: RowKind,
    /// Empty for break rows; one cell per day otherwise.
    pub cells: Vec<GridCell>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridModel {
    pub class_name: String,
    pub days: Vec<String>,
    pub rows: Vec<GridRow>,
}

/// Uniform time-indexed grid for one class: normalized axis down the side,
/// configured days across the top, break rows consolidated.
pub fn build_grid(
    timetable: &Timetable,
    class_name: &str,
    days: &[String],
    known_break_names: &[String],
) -> GridModel {
    let mut rows = Vec::new();
    if let Some(schedule) = timetable.get(class_name) {
        for time in class_axis(schedule, days) {
            let slots: Vec<Option<&ScheduleSlot>> = days
                .iter()
                .map(|day| slot_at(schedule, day, &time))
                .collect();
            let kind = classify_row(&slots, known_break_names);
            let cells = match kind {
                RowKind::Break { .. } => Vec::new(),
                RowKind::Normal => days
                    .iter()
                    .zip(&slots)
                    .map(|(day, slot)| match slot {
                        Some(s) if s.has_session() => GridCell {
                            day: day.clone(),
                            subject: Some(s.subject.clone()),
                            teacher: s.teacher_label().map(|t| t.to_string()),
                            draggable: true,
                        },
                        _ => GridCell {
                            day: day.clone(),
                            subject: None,
                            teacher: None,
                            draggable: false,
                        },
                    })
                    .collect(),
            };
            rows.push(GridRow { time, kind, cells });
        }
    }
    GridModel {
        class_name: class_name.to_string(),
        days: days.to_vec(),
        rows,
    }
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

    fn days(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn axis_sorts_by_start_time_prefix_and_dedups() {
        let monday = vec![
            slot("10:15-10:30", "Lunch", "N/A"),
            slot("08:00-08:45", "Math", "Mrs. Sharma"),
        ];
        let tuesday = vec![
            slot("09:00-09:45", "English", "Mr. Rao"),
            slot("08:00-08:45", "Science", "Mrs. Sharma"),
        ];
        let axis = normalize_axis([&monday, &tuesday]);
        assert_eq!(axis, vec!["08:00-08:45", "09:00-09:45", "10:15-10:30"]);
    }

    #[test]
    fn axis_is_empty_for_empty_scope() {
        let empty: Vec<&DaySchedule> = Vec::new();
        assert!(normalize_axis(empty).is_empty());
    }

    #[test]
    fn axis_tolerates_unpadded_labels_lexicographically() {
        // Documented limitation: "9:00" sorts after "10:00" as strings.
        let day = vec![slot("9:00-9:45", "Math", "A"), slot("10:00-10:45", "Art", "B")];
        let axis = normalize_axis([&day]);
        assert_eq!(axis, vec!["10:00-10:45", "9:00-9:45"]);
    }

    #[test]
    fn classify_requires_every_column_to_agree() {
        let lunch = slot("10:15-10:30", "Lunch", "N/A");
        let math = slot("10:15-10:30", "Math", "Mrs. Sharma");
        let all_lunch = vec![Some(&lunch), Some(&lunch), Some(&lunch)];
        assert_eq!(
            classify_row(&all_lunch, &[]),
            RowKind::Break {
                label: "Lunch".to_string()
            }
        );
        let mixed = vec![Some(&lunch), Some(&math), Some(&lunch)];
        assert_eq!(classify_row(&mixed, &[]), RowKind::Normal);
        let sparse = vec![Some(&lunch), None, Some(&lunch)];
        assert_eq!(classify_row(&sparse, &[]), RowKind::Normal);
    }

    #[test]
    fn classify_accepts_configured_break_names() {
        let tea = slot("11:00-11:15", "Tea Pause", "N/A");
        let row = vec![Some(&tea), Some(&tea)];
        assert_eq!(classify_row(&row, &[]), RowKind::Normal);
        assert_eq!(
            classify_row(&row, &["Tea Pause".to_string()]),
            RowKind::Break {
                label: "Tea Pause".to_string()
            }
        );
    }

    #[test]
    fn classify_empty_row_is_normal() {
        assert_eq!(classify_row(&[], &[]), RowKind::Normal);
        assert_eq!(classify_row(&[None, None], &[]), RowKind::Normal);
    }

    #[test]
    fn classify_ignores_empty_subject() {
        let blank = slot("12:00-12:45", "", "N/A");
        let row = vec![Some(&blank), Some(&blank)];
        assert_eq!(classify_row(&row, &[]), RowKind::Normal);
    }

    #[test]
    fn grid_consolidates_break_rows_and_marks_draggable_cells() {
        let mut schedule: ClassSchedule = BTreeMap::new();
        for day in ["Monday", "Tuesday"] {
            schedule.insert(
                day.to_string(),
                vec![
                    slot("08:00-08:45", "Math", "Mrs. Sharma"),
                    slot("10:15-10:30", "Recess", "N/A"),
                ],
            );
        }
        // Tuesday has an extra empty-subject filler slot.
        schedule
            .get_mut("Tuesday")
            .unwrap()
            .push(slot("09:00-09:45", "", "N/A"));

        let mut timetable: Timetable = BTreeMap::new();
        timetable.insert("Grade VI".to_string(), schedule);

        let grid = build_grid(&timetable, "Grade VI", &days(&["Monday", "Tuesday"]), &[]);
        assert_eq!(grid.rows.len(), 3);

        assert_eq!(grid.rows[0].time, "08:00-08:45");
        assert_eq!(grid.rows[0].kind, RowKind::Normal);
        assert!(grid.rows[0].cells[0].draggable);
        assert_eq!(grid.rows[0].cells[0].teacher.as_deref(), Some("Mrs. Sharma"));

        // Monday has no 09:00 slot at all; Tuesday's is an empty filler.
        assert_eq!(grid.rows[1].time, "09:00-09:45");
        assert!(!grid.rows[1].cells[0].draggable);
        assert!(grid.rows[1].cells[1].subject.is_none());

        assert_eq!(
            grid.rows[2].kind,
            RowKind::Break {
                label: "Recess".to_string()
            }
        );
        assert!(grid.rows[2].cells.is_empty());
    }

    #[test]
    fn grid_for_unknown_class_is_empty() {
        let timetable: Timetable = BTreeMap::new();
        let grid = build_grid(&timetable, "Grade IX", &days(&["Monday"]), &[]);
        assert!(grid.rows.is_empty());
    }

    #[test]
    fn duplicate_time_labels_keep_first_occurrence() {
        let mut schedule: ClassSchedule = BTreeMap::new();
        schedule.insert(
            "Monday".to_string(),
            vec![
                slot("08:00-08:45", "Math", "Mrs. Sharma"),
                slot("08:00-08:45", "Science", "Mr. Rao"),
            ],
        );
        let mut timetable: Timetable = BTreeMap::new();
        timetable.insert("Grade VI".to_string(), schedule);

        let grid = build_grid(&timetable, "Grade VI", &days(&["Monday"]), &[]);
        assert_eq!(grid.rows.len(), 1);
        assert_eq!(grid.rows[0].cells[0].subject.as_deref(), Some("Math"));
    }
}
