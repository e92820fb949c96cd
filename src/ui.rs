//! Terminal output helpers.
//!
//! Plain results that scripts consume (paths, branch names, rendered posts)
//! are printed by the caller without decoration; these helpers are for
//! human-facing status lines.

use std::path::Path;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("\x1b[31mERROR:\x1b[0m {}", message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("\x1b[32m✓\x1b[0m {}", message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("\x1b[33m→\x1b[0m {}", message);
}

/// Report a post moved by a refresh.
pub fn display_rename(from: &Path, to: &Path) {
    display_status(&format!("{} -> {}", from.display(), to.display()));
}
