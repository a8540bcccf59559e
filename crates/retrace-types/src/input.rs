use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mouse event kinds, stored as their integer discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i64)]
pub enum MouseEventType {
    Move = 0,
    Down = 1,
    Up = 2,
    Over = 3,
    Out = 4,
}

impl MouseEventType {
    pub fn code(&self) -> i64 {
        *self as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i64)]
pub enum FocusEventType {
    In = 0,
    Out = 1,
}

impl FocusEventType {
    pub fn code(&self) -> i64 {
        *self as i64
    }
}

/// A mouse event observed in the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MouseEvent {
    pub tab_id: i64,
    pub frame_id: i64,
    pub event_type: MouseEventType,
    pub page_x: i64,
    pub page_y: i64,
    /// Pressed-button bitmask as reported by the browser.
    pub buttons: i64,
    pub target_node_id: Option<i64>,
    pub related_target_node_id: Option<i64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusEvent {
    pub tab_id: i64,
    pub frame_id: i64,
    pub event_type: FocusEventType,
    pub target_node_id: Option<i64>,
    pub related_target_node_id: Option<i64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollEvent {
    pub tab_id: i64,
    pub frame_id: i64,
    pub scroll_x: i64,
    pub scroll_y: i64,
    pub timestamp: DateTime<Utc>,
}

/// Kind of a scripted interaction step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    Click,
    DoubleClick,
    Move,
    Scroll,
    Type,
    KeyPress,
    WaitForMillis,
}

impl InteractionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionType::Click => "click",
            InteractionType::DoubleClick => "double_click",
            InteractionType::Move => "move",
            InteractionType::Scroll => "scroll",
            InteractionType::Type => "type",
            InteractionType::KeyPress => "key_press",
            InteractionType::WaitForMillis => "wait_for_millis",
        }
    }
}

/// One resolved step of an interaction command (a click, a keypress, ...)
/// as it was actually performed by the human emulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionStep {
    pub command_id: i64,
    /// Position of this step within its command's interaction groups.
    pub step_index: i64,
    pub interaction_type: InteractionType,
    pub x: Option<i64>,
    pub y: Option<i64>,
    pub mouse_button: Option<String>,
    /// Key codes sent by a type/key_press step.
    pub key_codes: Option<Vec<String>>,
    pub duration_ms: Option<i64>,
    pub timestamp: DateTime<Utc>,
}
