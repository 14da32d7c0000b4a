use serde::Serialize;

/// Scan controller state machine.
///
/// State transitions:
/// ```text
/// idle ──start_camera──→ preview_active ──capture_and_decode──→ capturing
///  ↑                          │  ↑                                 │
///  └────────stop_camera───────┘  └─────────── error ←──────────────┤
///                                                                  ↓
///                                                               decoded
/// ```
/// `decode_from_file` reaches `decoded` / `error` from any state; editing the
/// acquired text leaves `decoded` / `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum ScanState {
    Idle,
    PreviewActive,
    Capturing,
    Decoded(String),
    /// Operator-facing message.
    Error(String),
}

impl ScanState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_preview_active(&self) -> bool {
        matches!(self, Self::PreviewActive)
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self, Self::Capturing)
    }

    /// Decoded or errored: the last acquisition attempt has settled.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Decoded(_) | Self::Error(_))
    }

    pub fn decoded_text(&self) -> Option<&str> {
        match self {
            Self::Decoded(text) => Some(text),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }
}
