//! Stable item identity.
//!
//! Rendered comments carry no guaranteed identifier, so identity is
//! derived in order of preference: a provider-supplied stable id, else a
//! bounded prefix of the visible text combined with the author handle when
//! one is available. Items yielding neither are unkeyable and dropped for
//! the round: a missed item is acceptable, merging two distinct items is
//! not.

/// Raw inputs a provider extracts from one rendered item.
#[derive(Debug, Clone, Default)]
pub struct KeyInput {
    /// Provider-supplied stable identifier attribute, when present.
    pub stable_id: Option<String>,
    /// Visible text of the item.
    pub text: String,
    /// Secondary discriminator, e.g. the author handle.
    pub author: Option<String>,
}

/// Derive the session-stable key for an item, or `None` when the item is
/// unkeyable. Pure and deterministic: identical inputs always yield the
/// same key.
pub fn resolve_key(input: &KeyInput, prefix_chars: usize) -> Option<String> {
    if let Some(id) = input.stable_id.as_deref() {
        let id = id.trim();
        if !id.is_empty() {
            return Some(id.to_string());
        }
    }

    let text = input.text.trim();
    if text.is_empty() {
        return None;
    }
    let prefix: String = text.chars().take(prefix_chars).collect();

    match input.author.as_deref().map(str::trim) {
        Some(author) if !author.is_empty() => Some(format!("{author}:{prefix}")),
        _ => Some(prefix),
    }
}
