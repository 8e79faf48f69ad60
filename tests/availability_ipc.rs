mod test_support;

use serde_json::json;
use test_support::{request_ok, spawn_sidecar, temp_dir};

#[test]
fn availability_partitions_directory_per_slot() {
    let workspace = temp_dir("timetabled-availability");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let sharma = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "teachers.create",
        json!({ "name": "Mrs. Sharma", "subjects": ["Math"] }),
    );
    let sharma_id = sharma["teacherId"].as_str().expect("teacherId").to_string();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "teachers.create",
        json!({ "name": "Mr. Rao", "subjects": ["Science"] }),
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "timetable.set",
        json!({ "timetable": {
            "Grade VI": { "Monday": [
                { "time": "08:00-08:45", "subject": "Math", "teacher": "Mrs. Sharma" },
                { "time": "12:00-12:30", "subject": "Lunch", "teacher": "N/A" }
            ] },
            "Grade VII": { "Monday": [
                { "time": "12:00-12:30", "subject": "Lunch", "teacher": "N/A" }
            ] }
        } }),
    );

    let result = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "availability.compute",
        json!({ "day": "Monday" }),
    );
    assert_eq!(result["day"], "Monday");
    let rows = result["rows"].as_array().expect("rows");
    assert_eq!(rows.len(), 2);

    // First slot: Mrs. Sharma teaches Grade VI, Mr. Rao is free. Entries
    // follow directory order.
    let first = &rows[0];
    assert_eq!(first["time"], "08:00-08:45");
    assert_eq!(first["kind"], "normal");
    let entries = first["entries"].as_array().expect("entries");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["teacherId"].as_str(), Some(sharma_id.as_str()));
    assert_eq!(entries[0]["status"], "busy");
    assert_eq!(entries[0]["className"], "Grade VI");
    assert_eq!(entries[0]["subject"], "Math");
    assert_eq!(entries[1]["teacherName"], "Mr. Rao");
    assert_eq!(entries[1]["status"], "available");
    assert!(entries[1].get("breakLabel").is_none());

    // Lunch is shared by every class, so the row is a break and every entry
    // carries the label.
    let lunch = &rows[1];
    assert_eq!(lunch["kind"], "break");
    assert_eq!(lunch["label"], "Lunch");
    for entry in lunch["entries"].as_array().expect("entries") {
        assert_eq!(entry["status"], "available");
        assert_eq!(entry["breakLabel"], "Lunch");
    }
}

#[test]
fn id_suffixed_labels_resolve_before_substrings() {
    let workspace = temp_dir("timetabled-availability-resolve");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    // A directory with a name that is a substring of another.
    let full = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "teachers.create",
        json!({ "name": "Sharma" }),
    );
    let full_id = full["teacherId"].as_str().expect("teacherId").to_string();
    let other = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "teachers.create",
        json!({ "name": "Mrs. Sharma" }),
    );
    let other_id = other["teacherId"].as_str().expect("teacherId").to_string();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "timetable.set",
        json!({ "timetable": {
            "Grade VI": { "Monday": [
                { "time": "08:00-08:45", "subject": "Math",
                  "teacher": format!("Mrs. Sharma (ID: {})", other_id) }
            ] }
        } }),
    );

    let result = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "availability.compute",
        json!({ "day": "Monday" }),
    );
    let entries = result["rows"][0]["entries"].as_array().expect("entries");
    let busy: Vec<&str> = entries
        .iter()
        .filter(|e| e["status"] == "busy")
        .filter_map(|e| e["teacherId"].as_str())
        .collect();
    assert_eq!(busy, vec![other_id.as_str()]);
    assert_ne!(busy[0], full_id.as_str());
}

#[test]
fn unknown_day_and_unresolved_labels_fall_back_cleanly() {
    let workspace = temp_dir("timetabled-availability-edges");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "teachers.create",
        json!({ "name": "Mrs. Sharma" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "timetable.set",
        json!({ "timetable": {
            "Grade VI": { "Monday": [
                { "time": "08:00-08:45", "subject": "Math", "teacher": "Visiting Examiner" }
            ] }
        } }),
    );

    let sunday = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "availability.compute",
        json!({ "day": "Sunday" }),
    );
    assert_eq!(sunday["rows"], json!([]));

    let monday = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "availability.compute",
        json!({ "day": "Monday" }),
    );
    let entries = monday["rows"][0]["entries"].as_array().expect("entries");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["status"], "available");
}
