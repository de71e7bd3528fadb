use super::events::{Cursor, ItemDescriptor};
use std::fmt::Write;

/// Escape a name for the service-message text protocol.
///
/// Only the first `\n` and the first `\r` are escaped; later ones are left as-is.
pub fn sanitize(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\'' | '|' | '[' | ']') {
            escaped.push('|');
        }
        escaped.push(c);
    }

    let escaped = escaped.replacen('\n', "|n", 1).replacen('\r', "|r", 1);

    let mut out = String::with_capacity(escaped.len());
    for c in escaped.chars() {
        let code = u32::from(c);
        if code >= 0x0100 {
            let _ = write!(out, "| 0x{:04x}", code);
        } else {
            out.push(c);
        }
    }
    out
}

/// Fully qualified, sanitized item name: `[folder/]item[/iteration]`.
///
/// The collection's root folder is never shown as a prefix.
pub fn resolve_name(item: &ItemDescriptor, cursor: Option<&Cursor>, collection_name: &str) -> String {
    let folder = match item.parent_name() {
        Some(parent) if parent != collection_name => format!("{}/", parent),
        _ => String::new(),
    };

    let iteration = match cursor {
        Some(cursor) if cursor.cycles > 1 => format!("/{}", cursor.iteration),
        _ => String::new(),
    };

    sanitize(&format!("{}{}{}", folder, item.name, iteration))
}
