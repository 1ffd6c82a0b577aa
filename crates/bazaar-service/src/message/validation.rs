//! Message content rules.

use bazaar_core::error::AppError;
use bazaar_core::result::AppResult;

/// Check a message body before it is stored.
///
/// The body may be blank only when an attachment carries the message.
pub fn validate_content(
    content: &str,
    attachment_url: Option<&str>,
    max_length: usize,
) -> AppResult<()> {
    let has_attachment = attachment_url.is_some_and(|url| !url.trim().is_empty());
    if content.trim().is_empty() && !has_attachment {
        return Err(AppError::validation("Message content cannot be empty"));
    }

    let length = content.chars().count();
    if length > max_length {
        return Err(AppError::validation(format!(
            "Message content is {length} characters; the limit is {max_length}"
        )));
    }
    Ok(())
}
