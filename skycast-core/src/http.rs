//! Small shared helpers for talking to the upstream HTTP APIs.

/// Cap error-message body excerpts so upstream HTML error pages don't flood
/// logs or user-facing messages.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX { format!("{}...", &body[..MAX]) } else { body.to_string() }
}
