use crate::ident::ShortId;
use crate::tokenizer::split_front_matter;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::macros::format_description;
use time::Date;

pub const UNKNOWN_DATE: &str = "Unknown";

lazy_static! {
    static ref META_LINE: Regex = Regex::new(r"^[ ]{0,3}([A-Za-z0-9_-]+):\s*(.*)$").expect("valid regex");
    static ref META_MORE: Regex = Regex::new(r"^[ ]{4,}(.*)$").expect("valid regex");
}

/// One corpus entry. `path` is the canonical output path and must be unique.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub path: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// `DD-MM-YYYY`
    #[serde(default)]
    pub created: Option<String>,
    /// `DD-MM-YYYY`
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub prev: Option<String>,
    #[serde(default)]
    pub next: Option<String>,
}

impl Document {
    pub fn new(path: impl Into<String>, body: impl Into<String>) -> Self {
        Self { path: path.into(), body: body.into(), ..Self::default() }
    }

    /// Build a document from a markdown source with an optional front-matter
    /// block. The block stays in `body`; normalization strips it later.
    pub fn from_markdown(path: impl Into<String>, source: &str) -> Self {
        let meta = split_front_matter(source).map(|(block, _)| parse_metadata(block)).unwrap_or_default();
        let first = |key: &str| meta.get(key).and_then(|v| v.first()).cloned();
        let keywords = meta
            .get("keywords")
            .map(|lines| lines.iter().flat_map(|l| l.split(", ")).map(str::to_string).collect())
            .unwrap_or_default();
        Self {
            path: path.into(),
            body: source.to_string(),
            title: first("title"),
            about: meta.get("about").map(|v| v.join(" ")),
            authors: meta.get("authors").cloned().unwrap_or_default(),
            keywords,
            created: first("created"),
            updated: first("updated"),
            prev: first("prev"),
            next: first("next"),
        }
    }

    pub fn with_authors(mut self, authors: Vec<String>) -> Self {
        self.authors = authors;
        self
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn with_dates(mut self, created: Option<String>, updated: Option<String>) -> Self {
        self.created = created;
        self.updated = updated;
        self
    }

    /// Display dates; `updated` falls back to `created`. Unparsable values are
    /// logged and dropped.
    pub fn dates(&self) -> DocDates {
        let parse = |field: &str, raw: &Option<String>| {
            raw.as_deref().and_then(|s| match format_date(s) {
                Some(d) => Some(d),
                None => {
                    tracing::warn!(path = %self.path, field, value = s, "unparsable date, expected DD-MM-YYYY");
                    None
                }
            })
        };
        let created = parse("created", &self.created);
        let updated = parse("updated", &self.updated).or_else(|| created.clone());
        DocDates { created, updated }
    }

    /// Everything that gets tokenized for this document.
    ///
    /// A front-matter title and description are stripped along with their
    /// block, so only records that carry them as fields have them indexed.
    pub fn raw_text(&self, dates: &DocDates) -> String {
        let mut raw = String::new();
        if split_front_matter(&self.body).is_none() {
            for field in [&self.title, &self.about].into_iter().flatten() {
                raw.push_str(field);
                raw.push(' ');
            }
        }
        raw.push_str(&self.body);
        if !self.authors.is_empty() {
            raw.push(' ');
            raw.push_str(&self.authors.join(" "));
        }
        if !self.keywords.is_empty() {
            raw.push(' ');
            raw.push_str(&self.keywords.join(" "));
        }
        for date in [&dates.created, &dates.updated].into_iter().flatten() {
            raw.push(' ');
            raw.push_str(date);
        }
        raw
    }

    pub fn page_data(&self, identifier: ShortId, dates: &DocDates, site_url: Option<&str>) -> PageData {
        let location = self.path.strip_suffix(".html").unwrap_or(&self.path).to_string();
        let folder = location.rsplit('/').next() == Some("index");
        PageData {
            identifier,
            title: self.title.clone().unwrap_or_else(|| "Untitled".to_string()),
            about: self.about.clone().unwrap_or_else(|| "No description".to_string()),
            authors: self.authors.clone(),
            keywords: self.keywords.clone(),
            folder,
            location,
            canonical: site_url.map(|base| format!("{}/{}", base.trim_end_matches('/'), self.path)),
            created: dates.created.clone().unwrap_or_else(|| UNKNOWN_DATE.to_string()),
            updated: dates.updated.clone().unwrap_or_else(|| UNKNOWN_DATE.to_string()),
            prev: self.prev.clone(),
            next: self.next.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocDates {
    pub created: Option<String>,
    pub updated: Option<String>,
}

/// Per-page record shipped to the client alongside the search index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageData {
    pub identifier: ShortId,
    pub title: String,
    pub about: String,
    pub authors: Vec<String>,
    pub keywords: Vec<String>,
    pub location: String,
    pub canonical: Option<String>,
    pub created: String,
    pub updated: String,
    pub prev: Option<String>,
    pub next: Option<String>,
    pub folder: bool,
}

/// `DD-MM-YYYY` -> `Weekday, Month DD YYYY`.
pub fn format_date(raw: &str) -> Option<String> {
    let date = Date::parse(raw.trim(), format_description!("[day padding:none]-[month padding:none]-[year]")).ok()?;
    date.format(format_description!("[weekday], [month repr:long] [day] [year]")).ok()
}

/// Parse a front-matter block into lowercase keys with list values.
/// Indented lines continue the previous key.
pub fn parse_metadata(block: &str) -> BTreeMap<String, Vec<String>> {
    let mut meta: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut last: Option<String> = None;
    for line in block.lines().skip(1) {
        if let Some(caps) = META_LINE.captures(line) {
            let key = caps[1].to_lowercase();
            meta.entry(key.clone()).or_default().push(caps[2].trim().to_string());
            last = Some(key);
        } else if let (Some(caps), Some(key)) = (META_MORE.captures(line), last.as_ref()) {
            if let Some(values) = meta.get_mut(key) {
                values.push(caps[1].trim().to_string());
            }
        } else {
            last = None;
        }
    }
    meta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::IdentifierMap;

    const SOURCE: &str = "---\ntitle: Getting Started\nauthors: Ann\n    Bob\nkeywords: setup, install\ncreated: 01-01-2024\n---\nHello world";

    #[test]
    fn metadata_block_is_parsed() {
        let doc = Document::from_markdown("guide/start.html", SOURCE);
        assert_eq!(doc.title.as_deref(), Some("Getting Started"));
        assert_eq!(doc.authors, vec!["Ann", "Bob"]);
        assert_eq!(doc.keywords, vec!["setup", "install"]);
        assert_eq!(doc.created.as_deref(), Some("01-01-2024"));
        assert_eq!(doc.updated, None);
        assert_eq!(doc.body, SOURCE);
    }

    #[test]
    fn missing_metadata_falls_back_to_defaults() {
        let doc = Document::from_markdown("plain.html", "no front matter here");
        assert_eq!(doc.title, None);
        assert!(doc.authors.is_empty());
        let page = doc.page_data(IdentifierMap::new().short_id(&doc.path), &doc.dates(), None);
        assert_eq!(page.title, "Untitled");
        assert_eq!(page.about, "No description");
        assert_eq!(page.created, UNKNOWN_DATE);
        assert_eq!(page.updated, UNKNOWN_DATE);
    }

    #[test]
    fn dates_are_rendered_and_updated_defaults_to_created() {
        let doc = Document::from_markdown("guide/start.html", SOURCE);
        let dates = doc.dates();
        assert_eq!(dates.created.as_deref(), Some("Monday, January 01 2024"));
        assert_eq!(dates.updated, dates.created);
    }

    #[test]
    fn bad_dates_are_tolerated() {
        let doc = Document::new("a.html", "x").with_dates(Some("2024/01/01".into()), None);
        assert_eq!(doc.dates(), DocDates::default());
    }

    #[test]
    fn raw_text_appends_metadata() {
        let doc = Document::new("a.html", "body")
            .with_authors(vec!["Ann".into()])
            .with_keywords(vec!["rust".into(), "search".into()]);
        assert_eq!(doc.raw_text(&doc.dates()), "body Ann rust search");
        assert_eq!(Document::new("b.html", "body").raw_text(&DocDates::default()), "body");
    }

    #[test]
    fn record_title_and_about_are_indexed() {
        let mut doc = Document::new("z.html", "body");
        doc.title = Some("Zebra".into());
        doc.about = Some("Striped animals".into());
        assert_eq!(doc.raw_text(&DocDates::default()), "Zebra Striped animals body");

        // front-matter titles leave with their block
        let md = Document::from_markdown("guide/start.html", SOURCE);
        assert!(md.raw_text(&DocDates::default()).starts_with("---\ntitle: Getting Started"));
    }

    #[test]
    fn unpadded_dates_are_accepted() {
        assert_eq!(format_date("1-1-2024").as_deref(), Some("Monday, January 01 2024"));
        assert_eq!(format_date("01-01-2024").as_deref(), Some("Monday, January 01 2024"));
        assert_eq!(format_date("15-3-2023").as_deref(), Some("Wednesday, March 15 2023"));
        assert_eq!(format_date("32-1-2024"), None);
    }

    #[test]
    fn page_data_locations() {
        let doc = Document::from_markdown("guide/index.html", SOURCE);
        let page = doc.page_data(IdentifierMap::new().short_id(&doc.path), &doc.dates(), Some("https://example.org/"));
        assert_eq!(page.location, "guide/index");
        assert!(page.folder);
        assert_eq!(page.canonical.as_deref(), Some("https://example.org/guide/index.html"));
    }
}
