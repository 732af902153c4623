//! Title validation mirroring the backend's draft constraints.
//!
//! The backend rejects blank titles and titles longer than [`TITLE_MAX`]
//! characters. Generated titles are normalised and checked here so seeding
//! never trips draft validation.

/// Maximum allowed length for a title.
pub const TITLE_MAX: usize = 80;

/// Validates a title against backend constraints.
///
/// # Examples
///
/// ```
/// use demo_data::is_valid_title;
///
/// assert!(is_valid_title("Quantum computing meetup"));
/// assert!(!is_valid_title("   "));
/// assert!(!is_valid_title(" padded "));
/// ```
#[must_use]
pub fn is_valid_title(title: &str) -> bool {
    if title.trim().is_empty() || title.trim() != title {
        return false;
    }
    title.chars().count() <= TITLE_MAX && !title.chars().any(char::is_control)
}

/// Collapses runs of whitespace, capitalises the first letter and truncates
/// to [`TITLE_MAX`] characters.
#[must_use]
pub(crate) fn normalise_title(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let capitalised = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    capitalised
        .chars()
        .take(TITLE_MAX)
        .collect::<String>()
        .trim_end()
        .to_owned()
}
