//! Domain logic - post files and draft bookkeeping, independent of git

pub mod draft;
pub mod post;
pub mod slug;

pub use draft::{FileChange, LivePosts};
pub use post::{format_date, parse_date, today, Post, PostBuilder};
pub use slug::{slug_from_title, MAX_SLUG_LENGTH};
