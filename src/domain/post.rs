//! Post source files: a YAML front-matter block followed by free-form body text.
//!
//! ```text
//! ---
//! title: Test post
//! slug: test-post
//! date: 2021-01-01
//! categories:
//! - tech
//! filename: 2021-01-01-test-post.md
//! ---
//! body text
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use chrono::{Local, NaiveDate};
use log::warn;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::slug::{slug_from_title, MAX_SLUG_LENGTH};
use crate::error::{BlogtoolError, Result};

const DELIMITER: &str = "---";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| BlogtoolError::InvalidDate(s.to_string()))
}

/// Format a date as `YYYY-MM-DD`
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Today's date in local time
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Front matter as stored on disk.
///
/// Each field carries its own omission rule; `filename` is written for
/// readers of the file but never trusted on import.
#[derive(Debug, Default, Serialize, Deserialize)]
struct FrontMatter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,

    #[serde(default, alias = "stub", skip_serializing_if = "Option::is_none")]
    slug: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    date: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    categories: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    weight: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    draft: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    filename: Option<String>,

    #[serde(flatten)]
    properties: BTreeMap<String, serde_yaml::Value>,
}

/// A single blog post.
///
/// # Example
/// ```rust
/// # use blogtool::domain::Post;
/// let post = Post::builder().title("This is a test").build().unwrap();
/// assert_eq!(post.slug, "this-is-a-test");
/// assert!(post.filename().ends_with("-this-is-a-test.md"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub title: String,
    pub slug: String,
    pub date: NaiveDate,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub weight: Option<i64>,
    pub draft: Option<bool>,
    /// Front-matter keys blogtool does not interpret, kept verbatim
    pub properties: BTreeMap<String, serde_yaml::Value>,
    pub body: String,
}

impl Post {
    pub fn builder() -> PostBuilder {
        PostBuilder::default()
    }

    /// `{date}-{slug}.md`
    pub fn filename(&self) -> String {
        format!("{}-{}.md", self.date_string(), self.slug)
    }

    pub fn date_string(&self) -> String {
        format_date(self.date)
    }

    /// Read a post from disk.
    ///
    /// A file without a front-matter block is not an error by itself: a
    /// warning is logged and the metadata is treated as empty, which then
    /// fails for lack of a title.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Self::parse_with_origin(&text, Some(path))
    }

    /// Parse post source text.
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with_origin(text, None)
    }

    fn parse_with_origin(text: &str, origin: Option<&Path>) -> Result<Self> {
        let (front, body) = match split_front_matter(text) {
            Some((block, body)) if !block.trim().is_empty() => {
                (serde_yaml::from_str::<FrontMatter>(block)?, body)
            }
            split => {
                match origin {
                    Some(path) => warn!("no metadata in {}", path.display()),
                    None => warn!("no metadata in post text"),
                }
                let body = split.map_or(text, |(_, body)| body);
                (FrontMatter::default(), body)
            }
        };

        let from_name = origin
            .and_then(Path::file_name)
            .and_then(|name| name.to_str())
            .and_then(parse_filename);

        let date = match front.date {
            Some(date) => Some(parse_date(&date)?),
            None => from_name.as_ref().map(|(date, _)| *date),
        };

        PostBuilder {
            title: front.title,
            slug: front.slug.or_else(|| from_name.map(|(_, slug)| slug)),
            date,
            tags: front.tags,
            categories: front.categories,
            weight: front.weight,
            draft: front.draft,
            properties: front.properties,
            body: body.to_string(),
            max_slug_length: None,
        }
        .build()
    }

    /// Serialize to the on-disk format.
    pub fn render(&self) -> Result<String> {
        let front = FrontMatter {
            title: Some(self.title.clone()),
            slug: Some(self.slug.clone()),
            date: Some(self.date_string()),
            tags: self.tags.clone(),
            categories: self.categories.clone(),
            weight: self.weight,
            draft: self.draft,
            filename: Some(self.filename()),
            properties: self.properties.clone(),
        };

        let yaml = serde_yaml::to_string(&front)?;
        Ok(format!("{DELIMITER}\n{yaml}{DELIMITER}\n{}", self.body))
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.render().map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

/// Builder for [Post]; `build` fails without a title.
#[derive(Debug, Clone, Default)]
pub struct PostBuilder {
    title: Option<String>,
    slug: Option<String>,
    date: Option<NaiveDate>,
    tags: Vec<String>,
    categories: Vec<String>,
    weight: Option<i64>,
    draft: Option<bool>,
    properties: BTreeMap<String, serde_yaml::Value>,
    body: String,
    max_slug_length: Option<usize>,
}

impl PostBuilder {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn weight(mut self, weight: Option<i64>) -> Self {
        self.weight = weight;
        self
    }

    pub fn draft(mut self, draft: Option<bool>) -> Self {
        self.draft = draft;
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: serde_yaml::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Length limit for a slug derived from the title
    pub fn max_slug_length(mut self, max: usize) -> Self {
        self.max_slug_length = Some(max);
        self
    }

    pub fn build(self) -> Result<Post> {
        let title = match self.title {
            Some(title) if !title.trim().is_empty() => title,
            _ => return Err(BlogtoolError::MissingTitle),
        };

        let slug = self.slug.unwrap_or_else(|| {
            slug_from_title(&title, self.max_slug_length.unwrap_or(MAX_SLUG_LENGTH))
        });

        Ok(Post {
            title,
            slug,
            date: self.date.unwrap_or_else(today),
            tags: self.tags,
            categories: self.categories,
            weight: self.weight,
            draft: self.draft,
            properties: self.properties,
            body: self.body,
        })
    }
}

/// Split `text` into (front-matter block, body).
///
/// Returns `None` when the first line is not the delimiter. An unterminated
/// block takes the rest of the text and leaves the body empty.
fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let mut lines = text.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim_end() != DELIMITER {
        return None;
    }

    let start = first.len();
    let mut offset = start;
    for line in lines {
        if line.trim_end() == DELIMITER {
            return Some((&text[start..offset], &text[offset + line.len()..]));
        }
        offset += line.len();
    }

    Some((&text[start..], ""))
}

/// Split a `YYYY-MM-DD-{slug}.md` file name into its date and slug.
fn parse_filename(name: &str) -> Option<(NaiveDate, String)> {
    static RE_FILENAME: OnceLock<Regex> = OnceLock::new();
    let re = RE_FILENAME.get_or_init(|| {
        Regex::new(r"^(?P<date>\d{4}-\d\d-\d\d)-(?P<slug>[^.]+)\.md$").expect("valid regex")
    });

    let caps = re.captures(name)?;
    let date = parse_date(&caps["date"]).ok()?;
    Some((date, caps["slug"].to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_create_no_title() {
        assert!(matches!(
            Post::builder().build(),
            Err(BlogtoolError::MissingTitle)
        ));
        assert!(matches!(
            Post::builder().title("   ").build(),
            Err(BlogtoolError::MissingTitle)
        ));
    }

    #[test]
    fn test_create_title() {
        let now = today();
        let post = Post::builder().title("This is a test").build().unwrap();

        assert_eq!(post.title, "This is a test");
        assert_eq!(post.date, now);
        assert_eq!(post.slug, "this-is-a-test");
        assert_eq!(
            post.filename(),
            format!("{}-this-is-a-test.md", now.format("%Y-%m-%d"))
        );
        assert!(post.tags.is_empty());
        assert!(post.categories.is_empty());
    }

    #[test]
    fn test_explicit_slug_wins() {
        let post = Post::builder()
            .title("This is a test")
            .slug("custom")
            .date(date("2021-01-01"))
            .build()
            .unwrap();
        assert_eq!(post.filename(), "2021-01-01-custom.md");
    }

    #[test]
    fn test_max_slug_length() {
        let post = Post::builder()
            .title("This is a test")
            .max_slug_length(7)
            .build()
            .unwrap();
        assert_eq!(post.slug, "this-is");
    }

    #[test]
    fn test_render_omits_empty_fields() {
        let post = Post::builder()
            .title("This is a test")
            .tags(["tag1", "tag2"])
            .date(date("2021-02-01"))
            .build()
            .unwrap();
        let text = post.render().unwrap();

        assert!(text.starts_with("---\n"));
        assert!(text.contains("\ndate: ") && text.contains("2021-02-01"));
        assert!(text.contains("- tag1\n- tag2\n"));
        assert!(text.contains("filename: 2021-02-01-this-is-a-test.md\n"));
        assert!(!text.contains("categories"));
        assert!(!text.contains("weight"));
        assert!(!text.contains("draft"));
        assert!(text.ends_with("---\n"));
    }

    #[test]
    fn test_parse() {
        let text = [
            "---",
            "title: Test File",
            "date: 2021-02-1",
            "tags:",
            "  - tag1",
            "  - tag2",
            "---",
            "",
            "This is test content.",
        ]
        .join("\n");

        let post = Post::parse(&text).unwrap();

        assert_eq!(post.title, "Test File");
        assert_eq!(post.body, "\nThis is test content.");
        assert_eq!(post.date, date("2021-02-01"));
        assert_eq!(post.tags, vec!["tag1", "tag2"]);
        assert_eq!(post.slug, "test-file");
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(Post::parse(""), Err(BlogtoolError::MissingTitle)));
    }

    #[test]
    fn test_parse_without_metadata_block() {
        let result = Post::parse("just some text\n");
        assert!(matches!(result, Err(BlogtoolError::MissingTitle)));
    }

    #[test]
    fn test_parse_unterminated_block() {
        let post = Post::parse("---\ntitle: Dangling\n").unwrap();
        assert_eq!(post.title, "Dangling");
        assert_eq!(post.body, "");
    }

    #[test]
    fn test_parse_ignores_filename_and_accepts_stub() {
        let text = "---\ntitle: Old\nstub: old-style\ndate: 2020-05-05\nfilename: bogus.md\n---\n";
        let post = Post::parse(text).unwrap();

        assert_eq!(post.slug, "old-style");
        assert_eq!(post.filename(), "2020-05-05-old-style.md");
        assert!(post.properties.is_empty());
    }

    #[test]
    fn test_parse_invalid_date() {
        let text = "---\ntitle: Bad\ndate: 2021-13-45\n---\n";
        assert!(matches!(
            Post::parse(text),
            Err(BlogtoolError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_round_trip() {
        let post = Post::builder()
            .title("Round trip: a test")
            .date(date("2021-03-04"))
            .tags(["rust", "yaml"])
            .categories(["tech"])
            .weight(Some(5))
            .draft(Some(true))
            .property("layout", serde_yaml::Value::String("wide".to_string()))
            .body("\nSome *markdown* body.\n\n---\n\nafter a rule\n")
            .build()
            .unwrap();

        let parsed = Post::parse(&post.to_string()).unwrap();
        assert_eq!(parsed, post);
    }

    #[test]
    fn test_from_file_falls_back_to_filename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2021-06-07-from-name.md");
        fs::write(&path, "---\ntitle: Some Other Title\n---\nbody\n").unwrap();

        let post = Post::from_file(&path).unwrap();
        assert_eq!(post.date, date("2021-06-07"));
        assert_eq!(post.slug, "from-name");
        assert_eq!(post.body, "body\n");
    }

    #[test]
    fn test_parse_filename() {
        assert_eq!(
            parse_filename("2021-01-01-test-post.md"),
            Some((date("2021-01-01"), "test-post".to_string()))
        );
        assert_eq!(parse_filename("README.md"), None);
        assert_eq!(parse_filename("2021-01-01-test-post.txt"), None);
    }
}
