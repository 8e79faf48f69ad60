use crate::model::{PlannerInputs, Timetable};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

const DEFAULT_DAYS: [&str; 5] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"];

const SYSTEM_INSTRUCTION: &str = "You are an expert school-timetable planner. Your task is to generate a complete, conflict-free school timetable.\n\n\
CRITICAL RULES:\n\
1. **Session Counts**: You MUST schedule EXACTLY the number of sessions requested for each subject. If a class needs 4 Math sessions, there must be exactly 4 Math slots in the timetable for that class. Count them carefully.\n\
2. **Teacher Conflicts**: No teacher can teach two classes at the same time.\n\
3. **Teacher Assignment**: If a specific teacher is named for a subject, you MUST use that teacher. If not, use a teacher from the general teacher list who teaches that subject.\n\
4. **Class Conflicts**: No class can have two subjects at the same time.\n\
5. **Time Slots**: Create time slots starting from the school start time, labelled \"HH:MM-HH:MM\". You can combine slots for double periods.\n\
6. **Fixed Breaks**: You MUST include the defined fixed breaks (like Lunch, Recess) at their specific start and end times for EVERY class and EVERY day. The subject for these slots should be the break name (e.g. 'Lunch') and the teacher must be 'N/A'.\n\
7. **Days**: Only schedule on the provided days.\n\
8. **Double Periods**: If a subject is marked as a double period or is a long block like 'Main Lesson', try to schedule consecutive slots or a longer time slot for it.\n\n\
Optimization:\n\
- Distribute sessions evenly across the week.\n\
- Do not schedule academic classes during break times.";

const MODIFY_SYSTEM_INSTRUCTION: &str = "You are an expert school-timetable planner. Modify the timetable based on the user request.\n\
- Maintain all original constraints (no teacher overlaps, correct session counts, fixed breaks) unless the user explicitly asks to change them.\n\
- If moving a class, ensure the new slot is valid and doesn't create a conflict.\n\
- Return the full updated timetable JSON.";

/// One round-trip to the model service, fully assembled. The frontend owns
/// the actual network exchange; we only decide what gets sent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub system_instruction: String,
    pub prompt: String,
    /// Response schema keyed by the configured classes and days, so the
    /// model cannot omit either.
    pub response_schema: Value,
}

fn days_in_scope(inputs: &PlannerInputs) -> Vec<String> {
    if inputs.days.is_empty() {
        DEFAULT_DAYS.iter().map(|d| d.to_string()).collect()
    } else {
        inputs.days.clone()
    }
}

fn response_schema(inputs: &PlannerInputs) -> Value {
    let days = days_in_scope(inputs);
    let slot_schema = json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "time": { "type": "STRING" },
                "subject": { "type": "STRING" },
                "teacher": { "type": "STRING" }
            },
            "required": ["time", "subject", "teacher"]
        }
    });

    let mut day_properties = Map::new();
    for day in &days {
        day_properties.insert(day.clone(), slot_schema.clone());
    }

    let mut class_properties = Map::new();
    for class in &inputs.classes {
        class_properties.insert(
            class.name.clone(),
            json!({
                "type": "OBJECT",
                "description": format!("Schedule for {}", class.name),
                "properties": day_properties.clone(),
                "required": days.clone()
            }),
        );
    }

    json!({
        "type": "OBJECT",
        "properties": {
            "timetable": {
                "type": "OBJECT",
                "description": "The complete timetable, with class names as keys.",
                "properties": class_properties,
                "required": inputs.classes.iter().map(|c| c.name.clone()).collect::<Vec<_>>()
            }
        },
        "required": ["timetable"]
    })
}

fn requirements_section(inputs: &PlannerInputs) -> String {
    let mut out = String::from("Detailed Requirements per Class:\n");
    for class in &inputs.classes {
        out.push_str(&format!("Class '{}':\n", class.name));
        for subject in &class.subjects {
            let teacher_info = subject
                .teacher_id
                .as_deref()
                .and_then(|id| inputs.teachers.iter().find(|t| t.id == id))
                .map(|t| format!("{} (ID: {})", t.name, t.id))
                .unwrap_or_else(|| "Any available teacher".to_string());
            let double = if subject.double_period {
                " (Double Period Preferred)"
            } else {
                ""
            };
            out.push_str(&format!(
                "  - Subject: \"{}\" needs {} sessions/week{}. Teacher: {}.\n",
                subject.name, subject.sessions_per_week, double, teacher_info
            ));
        }
    }
    out
}

fn breaks_section(inputs: &PlannerInputs) -> String {
    if inputs.breaks.is_empty() {
        return "No fixed breaks.".to_string();
    }
    inputs
        .breaks
        .iter()
        .map(|b| format!("- {}: {} to {}", b.name, b.start_time, b.end_time))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Assembles the initial generation request from the stored planner inputs.
pub fn build_generation_request(inputs: &PlannerInputs) -> anyhow::Result<GenerationRequest> {
    let days = days_in_scope(inputs);
    let inputs_json = serde_json::to_string(inputs).context("serialize planner inputs")?;
    let prompt = format!(
        "School Information:\n\
         - Days: {}\n\
         - Hours: {} to {}\n\
         - Session Duration: {} minutes (Approximate. Use this as a base but adjust for breaks or double periods)\n\n\
         Fixed Breaks (MUST be included for all classes at these exact times):\n{}\n\n\
         {}\n\
         Constraints: {}\n\n\
         Full Input JSON: {}\n\n\
         Generate the timetable JSON matching the schema.\n\
         - Ensure every single session count is met exactly.\n\
         - Ensure breaks are exactly at the times specified.\n\
         - Fill the rest of the time with classes according to session duration.\n\
         - 'Main Lesson' typically is the first block of the day and can be longer than a standard session.",
        days.join(", "),
        inputs.school_hours.start,
        inputs.school_hours.end,
        inputs.session_duration_minutes,
        breaks_section(inputs),
        requirements_section(inputs),
        inputs.constraints,
        inputs_json,
    );
    Ok(GenerationRequest {
        system_instruction: SYSTEM_INSTRUCTION.to_string(),
        prompt,
        response_schema: response_schema(inputs),
    })
}

/// Assembles a modification round-trip: same schema, current snapshot plus
/// the user's free-text request.
pub fn build_modification_request(
    inputs: &PlannerInputs,
    current: &Timetable,
    modification_request: &str,
) -> anyhow::Result<GenerationRequest> {
    let inputs_json =
        serde_json::to_string(inputs).context("serialize planner inputs")?;
    let current_json =
        serde_json::to_string(current).context("serialize current timetable")?;
    let prompt = format!(
        "Original Inputs: {}\n\
         Current Timetable: {}\n\
         User Request: \"{}\"\n\n\
         Update the timetable.",
        inputs_json, current_json, modification_request,
    );
    Ok(GenerationRequest {
        system_instruction: MODIFY_SYSTEM_INSTRUCTION.to_string(),
        prompt,
        response_schema: response_schema(inputs),
    })
}

#[derive(Debug, Deserialize)]
struct TimetableResponse {
    timetable: Timetable,
}

/// Parses the model's reply. The reply must be a JSON object with a
/// `timetable` key; anything else is a bad response. Whitespace around the
/// body is tolerated.
pub fn parse_timetable_response(text: &str) -> anyhow::Result<Timetable> {
    let parsed: TimetableResponse =
        serde_json::from_str(text.trim()).context("model response is not valid timetable JSON")?;
    Ok(parsed.timetable)
}
