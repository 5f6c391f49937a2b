//! Line-oriented console front end for live sessions.

use crate::config::CaptureMode;
use crate::detection::{Detection, SortOrder};
use crate::session::{SessionCommand, SessionEvent, SessionState};
use crate::signal::SignalDecision;

/// A line typed by the user during a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    /// Forward a command to the session.
    Session(SessionCommand),
    /// Print the session log.
    ShowLog,
    /// Flip the log's time ordering.
    ToggleSort,
    /// Discard the session log.
    ClearLog,
    /// Print the command list.
    Help,
    /// Blank line.
    Empty,
    /// Anything else.
    Unknown(String),
}

/// Parse one input line.
pub fn parse_input(line: &str) -> ConsoleInput {
    let word = line.trim().to_ascii_lowercase();
    match word.as_str() {
        "" => ConsoleInput::Empty,
        "c" | "capture" => ConsoleInput::Session(SessionCommand::Capture),
        "p" | "pause" => ConsoleInput::Session(SessionCommand::Pause),
        "r" | "resume" => ConsoleInput::Session(SessionCommand::Resume),
        "s" | "switch" => ConsoleInput::Session(SessionCommand::SwitchDevice),
        "t" | "retry" => ConsoleInput::Session(SessionCommand::Retry),
        "q" | "quit" | "exit" => ConsoleInput::Session(SessionCommand::Shutdown),
        "l" | "log" => ConsoleInput::ShowLog,
        "o" | "sort" => ConsoleInput::ToggleSort,
        "clear" => ConsoleInput::ClearLog,
        "h" | "help" | "?" => ConsoleInput::Help,
        _ => ConsoleInput::Unknown(word),
    }
}

/// Command list for the given mode.
pub fn help_text(mode: CaptureMode) -> String {
    let mut lines = Vec::new();
    if mode == CaptureMode::OnDemand {
        lines.push("  c, capture   classify the current frame");
    }
    lines.extend([
        "  p, pause     stop the camera",
        "  r, resume    clear the result and restart the camera",
        "  s, switch    switch to the next camera",
        "  t, retry     retry after an error",
        "  l, log       show the session log",
        "  o, sort      toggle log order (newest/oldest first)",
        "  clear        clear the session log",
        "  q, quit      end the session",
    ]);
    lines.join("\n")
}

/// One-line rendering of a session event, or `None` for events that are
/// not shown.
pub fn describe_event(event: &SessionEvent) -> Option<String> {
    let line = match event {
        SessionEvent::StateChanged(SessionState::Live) => "Camera live".to_string(),
        SessionEvent::StateChanged(SessionState::Paused) => {
            "Paused (r to resume)".to_string()
        }
        SessionEvent::StateChanged(_) => return None,
        SessionEvent::Failed { reason, detail } => {
            format!("{} [{detail}] (t to retry)", reason.message())
        }
        SessionEvent::DeviceSelected { index, device } => {
            format!("Using camera {}: {}", index + 1, device.label)
        }
        SessionEvent::Detection(detection) => format!("Detected {detection}"),
        SessionEvent::NoDetection { .. } => "No animal detected".to_string(),
        SessionEvent::InferenceFailed { reason } => {
            format!("Classification failed: {reason}")
        }
        SessionEvent::SignalEmitted(signal) => SignalDecision::Emit(*signal).to_string(),
        SessionEvent::SignalSuppressed => SignalDecision::Suppress.to_string(),
        SessionEvent::CaptureQueued => "Capture queued".to_string(),
    };
    Some(line)
}

/// Tabular rendering of the session log.
pub fn format_log(detections: &[Detection], order: SortOrder) -> String {
    if detections.is_empty() {
        return "Session log is empty".to_string();
    }

    let direction = match order {
        SortOrder::Ascending => "oldest first",
        SortOrder::Descending => "newest first",
    };
    let mut out = format!(
        "{} detection(s), {direction}\n{:<10} {:<10} {:>10} {:<12} Image",
        detections.len(),
        "Time",
        "Animal",
        "Confidence",
        "Range"
    );
    for detection in detections {
        out.push_str(&format!(
            "\n{:<10} {:<10} {:>10} {:<12} {}",
            detection.timestamp().format("%H:%M:%S"),
            detection.animal(),
            detection.confidence_percent(),
            detection.audio_range(),
            detection.image_url()
        ));
    }
    out
}
