//! Helpers for Telegram MarkdownV2 formatting.
//!
//! MarkdownV2 rejects messages containing unescaped special characters, so
//! every piece of user-supplied text goes through [`escape_markdown`].

const SPECIAL_CHARS: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '\\',
];

/// Escapes every MarkdownV2 special character with a backslash.
///
/// # Example
/// ```
/// use uiu_study_bot::utils::markdown::escape_markdown;
///
/// assert_eq!(escape_markdown("CSE-321 (A)"), "CSE\\-321 \\(A\\)");
/// ```
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if SPECIAL_CHARS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Bold text with its content escaped.
pub fn bold(text: &str) -> String {
    format!("*{}*", escape_markdown(text))
}

/// Inline code. Only backticks and backslashes need escaping inside.
pub fn code(text: &str) -> String {
    format!("`{}`", text.replace('\\', "\\\\").replace('`', "\\`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_course_and_route_text() {
        assert_eq!(escape_markdown("CSE321 sec. A"), "CSE321 sec\\. A");
        assert_eq!(escape_markdown("Mirpur-10 -> UIU"), "Mirpur\\-10 \\-\\> UIU");
        assert_eq!(escape_markdown("3.75 (B+)"), "3\\.75 \\(B\\+\\)");
    }

    #[test]
    fn test_escape_plain_text_unchanged() {
        assert_eq!(escape_markdown(""), "");
        assert_eq!(escape_markdown("Dhanmondi to UIU"), "Dhanmondi to UIU");
    }

    #[test]
    fn test_bold_and_code() {
        assert_eq!(bold("Ride match!"), "*Ride match\\!*");
        assert_eq!(code("/study find CSE321"), "`/study find CSE321`");
        assert_eq!(code("a`b"), "`a\\`b`");
    }
}
