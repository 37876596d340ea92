// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message-batch formatting for the summary prompt.
//!
//! One line per message with text:
//! `- {author}: {text} ({source})`, oldest first, stopping before the
//! batch would exceed the prompt budget.

use recap_core::{StoredMessage, SummaryCommand};

/// `@name (user:id)`, `@name`, `user:id`, or `unknown`.
pub fn author_label(message: &StoredMessage) -> String {
    let user_token = message.user_id.map(|id| format!("user:{id}"));
    let username = message
        .username
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());
    match (username, user_token) {
        (Some(name), Some(token)) => format!("@{name} ({token})"),
        (Some(name), None) => format!("@{name}"),
        (None, Some(token)) => token,
        (None, None) => "unknown".to_string(),
    }
}

/// Public message link when the chat has a username, else `message:{id}`.
pub fn source_label(chat_username: Option<&str>, message_id: i64) -> String {
    match chat_username.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => format!("https://t.me/{name}/{message_id}"),
        None => format!("message:{message_id}"),
    }
}

/// Formats `messages` (oldest first) into prompt lines.
///
/// Whitespace runs collapse to one space and each text is clipped to
/// `max_message_length` characters. Returns an empty string when no
/// message carries text.
pub fn format_messages(
    messages: &[StoredMessage],
    chat_username: Option<&str>,
    max_message_length: usize,
    max_prompt_chars: usize,
) -> String {
    let mut used = 0usize;
    let mut lines = Vec::new();

    for message in messages {
        let Some(text) = message.text.as_deref() else {
            continue;
        };
        let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if cleaned.is_empty() {
            continue;
        }
        let clipped: String = cleaned.chars().take(max_message_length).collect();
        let line = format!(
            "- {}: {} ({})",
            author_label(message),
            clipped,
            source_label(chat_username, message.message_id)
        );

        let cost = line.chars().count() + 1;
        if used + cost > max_prompt_chars {
            break;
        }
        used += cost;
        lines.push(line);
    }

    lines.join("\n")
}

/// "the last N hours" or "N to M hours ago", for the user prompt.
pub fn window_text(command: &SummaryCommand) -> String {
    if command.to_hours == 0 {
        format!("the last {} hours", command.from_hours)
    } else {
        format!("{} to {} hours ago", command.from_hours, command.to_hours)
    }
}
