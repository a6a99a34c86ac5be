use std::collections::BTreeMap;

use crate::error::{BotError, BotResult};

const MAX_LOCATION_LEN: usize = 60;
const MAX_TASK_LEN: usize = 200;
const MAX_CONTACTS: usize = 5;
const MAX_TAGS: usize = 5;
const MAX_TAG_LEN: usize = 20;
const MAX_DESCRIPTION_LEN: usize = 100;
const MAX_SNIPPET_LEN: usize = 1000;

/// Splits command arguments on whitespace, keeping double-quoted runs
/// together: `"Mirpur 10" UIU 08:00` yields three arguments.
pub fn split_args(input: &str) -> BotResult<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;

    for c in input.chars() {
        match c {
            '"' | '“' | '”' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() || quoted {
                    args.push(std::mem::take(&mut current));
                }
                quoted = false;
            }
            c => current.push(c),
        }
    }

    if in_quotes {
        return Err(BotError::validation("Unclosed quote in arguments."));
    }
    if !current.is_empty() || quoted {
        args.push(current);
    }

    Ok(args)
}

/// Canonical course code: letters followed by digits with an optional
/// trailing letter, uppercased with spaces removed (`cse 321` -> `CSE321`).
pub fn validate_course_code(input: &str) -> BotResult<String> {
    let code: String = input
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    let invalid = || {
        BotError::validation(format!(
            "Invalid course code '{}'. Use a code like CSE321 or ENG1011.",
            input.trim()
        ))
    };

    let letters = code.chars().take_while(|c| c.is_ascii_alphabetic()).count();
    let digits = code[letters..].chars().take_while(|c| c.is_ascii_digit()).count();
    let suffix = &code[letters + digits..];

    if !(2..=4).contains(&letters) || !(3..=4).contains(&digits) {
        return Err(invalid());
    }
    if suffix.len() > 1 || !suffix.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(invalid());
    }

    Ok(code)
}

pub fn validate_section(input: &str) -> BotResult<String> {
    let section = input.trim().to_uppercase();

    if section.is_empty() || section.len() > 3 || !section.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(BotError::validation(format!(
            "Invalid section '{}'. Use up to 3 letters or digits, e.g. A or 02.",
            input.trim()
        )));
    }

    Ok(section)
}

pub fn validate_location(input: &str) -> BotResult<String> {
    let location = input.split_whitespace().collect::<Vec<_>>().join(" ");

    if location.chars().count() < 2 {
        return Err(BotError::validation("Location must be at least 2 characters long."));
    }
    if location.chars().count() > MAX_LOCATION_LEN {
        return Err(BotError::validation(format!(
            "Location cannot be longer than {MAX_LOCATION_LEN} characters."
        )));
    }
    if location.chars().any(char::is_control) {
        return Err(BotError::validation("Location contains unsupported characters."));
    }

    Ok(location)
}

pub fn validate_department(input: &str) -> BotResult<String> {
    let department = input.trim().to_uppercase();

    if !(2..=10).contains(&department.len()) || !department.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(BotError::validation(format!(
            "Invalid department '{}'. Use its short name, e.g. CSE or EEE.",
            input.trim()
        )));
    }

    Ok(department)
}

pub fn validate_year(input: &str) -> BotResult<i64> {
    match input.trim().parse::<i64>() {
        Ok(year) if (1..=6).contains(&year) => Ok(year),
        _ => Err(BotError::validation(format!(
            "Invalid year '{}'. Use a number from 1 to 6.",
            input.trim()
        ))),
    }
}

pub fn parse_opt_in(input: &str) -> BotResult<bool> {
    match input.trim().to_lowercase().as_str() {
        "1" | "yes" | "on" => Ok(true),
        "0" | "no" | "off" => Ok(false),
        other => Err(BotError::validation(format!(
            "Ride opt-in must be 0 or 1, got '{other}'."
        ))),
    }
}

/// Parses `telegram=@me,phone=01700000000`. A lone `-` means no contacts.
pub fn parse_contacts(input: &str) -> BotResult<BTreeMap<String, String>> {
    let input = input.trim();
    let mut contacts = BTreeMap::new();

    if input == "-" || input.is_empty() {
        return Ok(contacts);
    }

    for entry in input.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (channel, handle) = entry.split_once('=').ok_or_else(|| {
            BotError::validation(format!(
                "Invalid contact '{entry}'. Use channel=handle, e.g. telegram=@you."
            ))
        })?;

        let channel = channel.trim().to_lowercase();
        let handle = handle.trim();

        if channel.is_empty() || channel.len() > 20 || !channel.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(BotError::validation(format!("Invalid contact channel '{channel}'.")));
        }
        if handle.is_empty() || handle.len() > 64 {
            return Err(BotError::validation(format!("Invalid handle for {channel}.")));
        }

        contacts.insert(channel, handle.to_string());
    }

    if contacts.len() > MAX_CONTACTS {
        return Err(BotError::validation(format!(
            "At most {MAX_CONTACTS} contacts are allowed."
        )));
    }

    Ok(contacts)
}

pub fn validate_task(input: &str) -> BotResult<String> {
    let task = input.trim();

    if task.is_empty() {
        return Err(BotError::validation("Reminder task cannot be empty."));
    }
    if task.chars().count() > MAX_TASK_LEN {
        return Err(BotError::validation(format!(
            "Reminder task cannot be longer than {MAX_TASK_LEN} characters."
        )));
    }
    if task.contains('\n') || task.contains('\r') {
        return Err(BotError::validation("Reminder task cannot contain line breaks."));
    }

    Ok(task.to_string())
}

/// Lowercase tag such as `rust`, `c++` or `dp`.
pub fn validate_tag(input: &str) -> BotResult<String> {
    let tag = input.trim().to_lowercase();

    if tag.is_empty() || tag.chars().count() > MAX_TAG_LEN {
        return Err(BotError::validation(format!(
            "Tags must be 1 to {MAX_TAG_LEN} characters long."
        )));
    }
    if !tag
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '#' | '.' | '-'))
    {
        return Err(BotError::validation(format!(
            "Invalid tag '{}'. Use letters, digits, '+', '#', '.' or '-'.",
            input.trim()
        )));
    }

    Ok(tag)
}

/// Comma-separated tags, or `-` for none. Duplicates are dropped.
pub fn parse_tags(input: &str) -> BotResult<Vec<String>> {
    if input.trim() == "-" {
        return Ok(Vec::new());
    }

    let mut tags: Vec<String> = Vec::new();
    for raw in input.split(',').filter(|t| !t.trim().is_empty()) {
        let tag = validate_tag(raw)?;
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    if tags.len() > MAX_TAGS {
        return Err(BotError::validation(format!("At most {MAX_TAGS} tags per snippet.")));
    }

    Ok(tags)
}

pub fn validate_snippet(description: &str, code: &str) -> BotResult<(String, String)> {
    let description = description.split_whitespace().collect::<Vec<_>>().join(" ");
    if description.is_empty() || description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(BotError::validation(format!(
            "The description must be 1 to {MAX_DESCRIPTION_LEN} characters long."
        )));
    }

    let code = code.trim();
    if code.is_empty() {
        return Err(BotError::validation("The snippet has no code."));
    }
    if code.chars().count() > MAX_SNIPPET_LEN {
        return Err(BotError::validation(format!(
            "Snippets cannot be longer than {MAX_SNIPPET_LEN} characters."
        )));
    }

    Ok((description, code.to_string()))
}
