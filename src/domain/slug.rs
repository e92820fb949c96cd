/// Default maximum length of a derived slug
pub const MAX_SLUG_LENGTH: usize = 30;

/// Derive a slug from a post title.
///
/// Keeps ASCII letters, digits, `-`, `_` and spaces, turns spaces into
/// dashes, lowercases, truncates to `max_length` characters and strips
/// trailing dashes.
///
/// # Example
/// ```rust
/// # use blogtool::domain::slug::slug_from_title;
/// assert_eq!(slug_from_title("This is a test!", 30), "this-is-a-test");
/// ```
pub fn slug_from_title(title: &str, max_length: usize) -> String {
    let mut slug: String = title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ' '))
        .map(|c| if c == ' ' { '-' } else { c.to_ascii_lowercase() })
        .take(max_length)
        .collect();

    while slug.ends_with('-') {
        slug.pop();
    }

    slug
}
