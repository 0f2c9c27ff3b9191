//! The external service seam: blocking submit calls and marker search.
//!
//! The core never parses the service's full response grammar. It only
//! needs two things from raw response text: whether the encounter page
//! is still being served, and the numeric ids echoed in a submitted
//! form URL. Everything else belongs to the collaborator layer.
//!
//! [`ScriptedService`] is shipped as a real type (not test-only) so
//! the encounter and production loops can be exercised end-to-end
//! without a live service.

use std::collections::VecDeque;

/// Errors surfaced by the external service collaborator.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The call could not be delivered or the connection dropped.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The service refused the call outright.
    #[error("call rejected: {0}")]
    Rejected(String),
}

/// A blocking gateway to the external service.
///
/// `submit` posts a form to an endpoint and returns the raw response
/// text. The call is synchronous from the caller's point of view; the
/// caller does not proceed until it completes. Timeouts and transport
/// details belong to the implementor.
pub trait GameService {
    /// Submit a form and return the raw response text.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when the call cannot be completed.
    fn submit(
        &mut self,
        endpoint: &str,
        fields: &[(String, String)],
    ) -> Result<String, ServiceError>;
}

/// The endpoint serving encounter rounds. Its presence in a response
/// is the "still in encounter" marker.
pub const ENCOUNTER_ENDPOINT: &str = "fight.php";

/// Form field marker for a cast skill id.
pub const SKILL_FIELD_MARKER: &str = "whichskill=";

/// Form field marker for the first used item id.
pub const ITEM_FIELD_MARKER: &str = "whichitem=";

/// Form field marker for the second used item id.
pub const SECOND_ITEM_FIELD_MARKER: &str = "whichitem2=";

/// Whether a raw response indicates the encounter page is still being
/// served.
pub fn shows_encounter(response: &str) -> bool {
    response.contains(ENCOUNTER_ENDPOINT)
}

/// Find the decimal number immediately following `marker` in `text`.
///
/// Returns `None` when the marker is absent or not followed by digits.
pub fn numeric_field(text: &str, marker: &str) -> Option<u32> {
    let start = text.find(marker)?.checked_add(marker.len())?;
    let digits: String = text
        .get(start..)?
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// A scripted service that replays canned responses in order.
///
/// Records every submitted call so tests can assert on endpoints and
/// form fields. When the script runs dry it returns an empty response,
/// which no marker search matches.
#[derive(Debug, Default)]
pub struct ScriptedService {
    responses: VecDeque<String>,
    /// Every call submitted so far, in order.
    pub calls: Vec<SubmittedCall>,
}

/// One recorded `submit` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedCall {
    /// The endpoint the form was posted to.
    pub endpoint: String,
    /// The form fields, in submission order.
    pub fields: Vec<(String, String)>,
}

impl SubmittedCall {
    /// Value of the first field with the given name, if present.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

impl ScriptedService {
    /// Create a service that replays the given responses in order.
    pub fn new(responses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            responses: responses.into_iter().map(Into::into).collect(),
            calls: Vec::new(),
        }
    }

    /// Number of calls submitted so far.
    pub const fn call_count(&self) -> usize {
        self.calls.len()
    }
}

impl GameService for ScriptedService {
    fn submit(
        &mut self,
        endpoint: &str,
        fields: &[(String, String)],
    ) -> Result<String, ServiceError> {
        self.calls.push(SubmittedCall {
            endpoint: endpoint.to_owned(),
            fields: fields.to_vec(),
        });
        Ok(self.responses.pop_front().unwrap_or_default())
    }
}
