use serde::Serialize;

use crate::ballot::book::book_id_for;
use crate::ballot::validator::validate;

use super::state::ScanState;

/// What the presentation surface renders.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanView {
    /// Identifier text as scanned or typed.
    pub acquired_text: Option<String>,
    pub error_message: Option<String>,
    /// Book display string, present only for a valid identifier.
    pub computed_result: Option<String>,
}

impl ScanView {
    /// Derive the view from the controller state and the acquired text.
    ///
    /// A non-empty, invalid identifier shows the validator's message in place
    /// of any scan error.
    pub fn compose(state: &ScanState, acquired_text: Option<&str>) -> Self {
        let text = acquired_text.unwrap_or_default();

        match validate(text) {
            Ok(id) => Self {
                acquired_text: Some(text.to_string()),
                error_message: state.error_message().map(str::to_string),
                computed_result: Some(book_id_for(&id)),
            },
            Err(reason) if !text.is_empty() => Self {
                acquired_text: Some(text.to_string()),
                error_message: Some(reason.message().to_string()),
                computed_result: None,
            },
            Err(_) => Self {
                acquired_text: None,
                error_message: state.error_message().map(str::to_string),
                computed_result: None,
            },
        }
    }
}
