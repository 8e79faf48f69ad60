use serde::{Deserialize, Serialize};

/// What the frontend serializes into the drag at drag start. Mirrors the
/// data-transfer payload of the interactive grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragPayload {
    pub class_name: String,
    pub day: String,
    pub time: String,
}

/// A captured relocation request. Describes what the user asked for; nothing
/// here has been applied to any timetable. The owning layer decides whether
/// to apply it, ignore a same-cell move, or hand it to the generation
/// service for re-validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveIntent {
    pub class_name: String,
    pub from_day: String,
    pub from_time: String,
    pub to_day: String,
    pub to_time: String,
}

/// Turns a drop into a `MoveIntent`, or nothing. Malformed payloads are
/// swallowed and cross-class drops are silently rejected. No other checks:
/// the destination may be occupied, the source may be empty, and same-cell
/// drops still produce an intent.
pub fn propose_move(
    displayed_class: &str,
    payload_json: &str,
    to_day: &str,
    to_time: &str,
) -> Option<MoveIntent> {
    let payload: DragPayload = serde_json::from_str(payload_json).ok()?;
    if payload.class_name != displayed_class {
        return None;
    }
    Some(MoveIntent {
        class_name: payload.class_name,
        from_day: payload.day,
        from_time: payload.time,
        to_day: to_day.to_string(),
        to_time: to_time.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRef {
    pub day: String,
    pub time: String,
}

/// Drag lifecycle for one grid, driven by discrete input events:
/// `Idle -> Dragging -> Hovering* -> (drop | cancel) -> Idle`. Hover is
/// idempotent and a drop consumes the carried payload, so replayed events
/// cannot produce a second intent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        payload_json: String,
    },
    Hovering {
        payload_json: String,
        target: CellRef,
    },
}

impl DragState {
    /// Drag started on a cell of the displayed class's grid.
    pub fn begin(&mut self, payload: &DragPayload) {
        // A stray start while mid-drag just restarts with the new origin.
        let json = serde_json::to_string(payload).unwrap_or_default();
        *self = DragState::Dragging { payload_json: json };
    }

    /// Pointer moved over a candidate cell. Repeated hovers over the same
    /// target are no-ops.
    pub fn hover(&mut self, day: &str, time: &str) {
        let target = CellRef {
            day: day.to_string(),
            time: time.to_string(),
        };
        match self {
            DragState::Idle => {}
            DragState::Dragging { payload_json } => {
                *self = DragState::Hovering {
                    payload_json: std::mem::take(payload_json),
                    target,
                };
            }
            DragState::Hovering {
                target: current, ..
            } => {
                if *current != target {
                    *current = target;
                }
            }
        }
    }

    /// Pointer left the hovered cell without dropping.
    pub fn leave(&mut self) {
        if let DragState::Hovering { payload_json, .. } = self {
            *self = DragState::Dragging {
                payload_json: std::mem::take(payload_json),
            };
        }
    }

    /// Drop on a cell. Consumes the payload and returns to `Idle`; yields an
    /// intent only when the payload parses and names the displayed class.
    pub fn drop_on(
        &mut self,
        displayed_class: &str,
        day: &str,
        time: &str,
    ) -> Option<MoveIntent> {
        let payload_json = match std::mem::take(self) {
            DragState::Idle => return None,
            DragState::Dragging { payload_json } => payload_json,
            DragState::Hovering { payload_json, .. } => payload_json,
        };
        propose_move(displayed_class, &payload_json, day, time)
    }

    /// Drag ended outside any valid cell.
    pub fn cancel(&mut self) {
        *self = DragState::Idle;
    }
}
