use crate::grid::{build_grid, GridModel, RowKind};
use crate::model::Timetable;
use chrono::Local;
use serde::Serialize;

/// One exported table cell. `span` > 1 only on merged break cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportCell {
    pub text: String,
    pub span: usize,
    pub is_break: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRow {
    pub time: String,
    pub cells: Vec<ExportCell>,
}

/// Renderer-agnostic export document for one class. The frontend feeds this
/// to its PDF layer; the row shapes come from the same grid builder as the
/// interactive view, so exported documents match the screen.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportModel {
    pub title: String,
    pub generated_on: String,
    pub header: Vec<String>,
    pub rows: Vec<ExportRow>,
}

fn cell_text(subject: Option<&str>, teacher: Option<&str>) -> String {
    match subject {
        Some(subject) => match teacher {
            Some(teacher) => format!("{}\n({})", subject, teacher),
            None => subject.to_string(),
        },
        None => "-".to_string(),
    }
}

fn rows_from_grid(grid: &GridModel) -> Vec<ExportRow> {
    grid.rows
        .iter()
        .map(|row| {
            let cells = match &row.kind {
                RowKind::Break { label } => vec![ExportCell {
                    text: label.clone(),
                    span: grid.days.len(),
                    is_break: true,
                }],
                RowKind::Normal => row
                    .cells
                    .iter()
                    .map(|cell| ExportCell {
                        text: cell_text(cell.subject.as_deref(), cell.teacher.as_deref()),
                        span: 1,
                        is_break: false,
                    })
                    .collect(),
            };
            ExportRow {
                time: row.time.clone(),
                cells,
            }
        })
        .collect()
}

pub fn build_export_model(
    timetable: &Timetable,
    class_name: &str,
    days: &[String],
    known_break_names: &[String],
) -> ExportModel {
    let grid = build_grid(timetable, class_name, days, known_break_names);
    let mut header = Vec::with_capacity(days.len() + 1);
    header.push("Time".to_string());
    header.extend(days.iter().cloned());
    ExportModel {
        title: format!("School Timetable - {}", class_name),
        generated_on: Local::now().format("%Y-%m-%d").to_string(),
        header,
        rows: rows_from_grid(&grid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassSchedule, ScheduleSlot};
    use std::collections::BTreeMap;

    fn slot(time: &str, subject: &str, teacher: &str) -> ScheduleSlot {
        ScheduleSlot {
            time: time.to_string(),
            subject: subject.to_string(),
            teacher: teacher.to_string(),
        }
    }

    fn sample_timetable() -> Timetable {
        let mut schedule: ClassSchedule = BTreeMap::new();
        for day in ["Monday", "Tuesday"] {
            schedule.insert(
                day.to_string(),
                vec![
                    slot("08:00-08:45", "Math", "Mrs. Sharma"),
                    slot("10:15-10:30", "Lunch", "N/A"),
                ],
            );
        }
        let mut timetable = Timetable::new();
        timetable.insert("Grade VI".to_string(), schedule);
        timetable
    }

    #[test]
    fn break_rows_export_as_one_merged_cell() {
        let days = vec!["Monday".to_string(), "Tuesday".to_string()];
        let model = build_export_model(&sample_timetable(), "Grade VI", &days, &[]);
        assert_eq!(model.header, vec!["Time", "Monday", "Tuesday"]);
        assert_eq!(model.rows.len(), 2);

        let lunch = &model.rows[1];
        assert_eq!(
            lunch.cells,
            vec![ExportCell {
                text: "Lunch".to_string(),
                span: 2,
                is_break: true,
            }]
        );
    }

    #[test]
    fn normal_cells_render_subject_with_teacher_and_dash_for_empty() {
        let days = vec![
            "Monday".to_string(),
            "Tuesday".to_string(),
            "Wednesday".to_string(),
        ];
        let model = build_export_model(&sample_timetable(), "Grade VI", &days, &[]);
        let first = &model.rows[0];
        assert_eq!(first.cells[0].text, "Math\n(Mrs. Sharma)");
        // No Wednesday data at all.
        assert_eq!(first.cells[2].text, "-");
        // With three day columns, Monday/Tuesday-only Lunch is no longer
        // consistent across every day, so it stays a normal row.
        assert_eq!(model.rows[1].cells[0].text, "Lunch");
    }

    #[test]
    fn export_rows_mirror_grid_rows() {
        let days = vec!["Monday".to_string(), "Tuesday".to_string()];
        let timetable = sample_timetable();
        let grid = build_grid(&timetable, "Grade VI", &days, &[]);
        let model = build_export_model(&timetable, "Grade VI", &days, &[]);
        let grid_times: Vec<&str> = grid.rows.iter().map(|r| r.time.as_str()).collect();
        let export_times: Vec<&str> = model.rows.iter().map(|r| r.time.as_str()).collect();
        assert_eq!(grid_times, export_times);
        for (g, e) in grid.rows.iter().zip(&model.rows) {
            assert_eq!(
                matches!(g.kind, RowKind::Break { .. }),
                e.cells.len() == 1 && e.cells[0].is_break
            );
        }
    }
}
