// SPDX-License-Identifier: MIT OR Apache-2.0

//! Corpus record loading
//!
//! Books arrive already split into documents, one JSON object per line. A
//! record without an explicit date gets one from its session label; labels
//! that omit the year inherit it from the previous dated record of the file.

use std::path::Path;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::CorpusError;

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

static SESSION_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(january|february|march|april|may|june|july|august|september|october|november|december) (\d+)\b(?:, (\d+))?",
    )
    .expect("valid session date regex")
});

/// One line of a corpus file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CorpusRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub book_abbr: String,
    pub book_name: String,
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub short: Option<String>,
    #[serde(default)]
    pub long: Option<String>,
    #[serde(default)]
    pub session: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub text: String,
}

/// A record ready for indexing: stable id assigned, date resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusDocument {
    pub id: String,
    pub book_abbr: String,
    pub book_name: String,
    pub heading: String,
    pub short: String,
    pub long: String,
    pub session: String,
    pub date: Option<NaiveDate>,
    pub text: String,
    /// Most distinctive words of the text, filled in at index time
    pub key_terms: Vec<String>,
}

impl CorpusDocument {
    /// Midnight UTC of the document date, as Unix seconds.
    pub fn date_secs(&self) -> Option<i64> {
        date_to_secs(self.date?)
    }
}

pub fn date_to_secs(date: NaiveDate) -> Option<i64> {
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp())
}

/// Session-label date parser carrying the last seen year.
#[derive(Debug, Default)]
pub struct SessionDates {
    last: Option<NaiveDate>,
}

impl SessionDates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Date named in a label such as `"Session 906, March 6, 1980"`.
    pub fn parse(&mut self, session: &str) -> Option<NaiveDate> {
        let caps = SESSION_DATE_RE.captures(session)?;
        let month_name = caps.get(1)?.as_str().to_lowercase();
        let month = MONTHS.iter().position(|m| *m == month_name)? as u32 + 1;
        let day: u32 = caps.get(2)?.as_str().parse().ok()?;

        let year = match caps.get(3) {
            Some(year) => year.as_str().parse().ok()?,
            None => {
                let Some(last) = self.last else {
                    tracing::debug!(session, "session label has no year and none to inherit");
                    return None;
                };
                chrono::Datelike::year(&last)
            }
        };

        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        self.last = Some(date);
        Some(date)
    }

    /// Record an explicit date so later year-less labels inherit its year.
    pub fn observe(&mut self, date: NaiveDate) {
        self.last = Some(date);
    }
}

/// Parse a JSON Lines corpus file's content. `path` names it in errors and ids.
///
/// A record without an id gets `<book>-<file stem>-<line>`, unique across the
/// files of one corpus directory.
pub fn parse_records(content: &str, path: &str) -> Result<Vec<CorpusDocument>, CorpusError> {
    let stem = Path::new(path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let mut dates = SessionDates::new();
    let mut documents = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: CorpusRecord = serde_json::from_str(line).map_err(|source| CorpusError::Record {
            path: path.to_string(),
            line: idx + 1,
            source,
        })?;

        let session = record.session.unwrap_or_default();
        let date = match record.date {
            Some(date) => {
                dates.observe(date);
                Some(date)
            }
            None => dates.parse(&session),
        };
        let id = record
            .id
            .unwrap_or_else(|| format!("{}-{}-{}", record.book_abbr.to_lowercase(), stem, idx + 1));

        documents.push(CorpusDocument {
            id,
            book_abbr: record.book_abbr,
            book_name: record.book_name,
            heading: record.heading,
            short: record.short.unwrap_or_default(),
            long: record.long.unwrap_or_default(),
            session,
            date,
            text: record.text,
            key_terms: Vec::new(),
        });
    }

    Ok(documents)
}

/// Read and parse one corpus file.
pub fn load_file(path: &Path) -> Result<Vec<CorpusDocument>, CorpusError> {
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|source| CorpusError::Read {
        path: display.clone(),
        source,
    })?;
    parse_records(&content, &display)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn session_labels_yield_dates() {
        let mut dates = SessionDates::new();
        assert_eq!(dates.parse("Session 906, March 6, 1980"), Some(date(1980, 3, 6)));
        assert_eq!(dates.parse("SESSION 907, MARCH 10, 1980"), Some(date(1980, 3, 10)));
    }

    #[test]
    fn missing_year_is_inherited() {
        let mut dates = SessionDates::new();
        assert_eq!(dates.parse("Deleted session, May 1"), None);
        assert_eq!(dates.parse("Session 1, April 30, 1971"), Some(date(1971, 4, 30)));
        assert_eq!(dates.parse("Deleted session, May 1"), Some(date(1971, 5, 1)));
    }

    #[test]
    fn labels_without_a_date_yield_none() {
        let mut dates = SessionDates::new();
        assert_eq!(dates.parse("Appendix"), None);
        assert_eq!(dates.parse("February 30, 1970"), None);
    }

    #[test]
    fn records_get_ids_and_dates() {
        let content = r#"{"book_abbr":"ABC","book_name":"A Book","heading":"Chapter 1","session":"Session 1, January 2, 1964","text":"one"}

{"id":"custom","book_abbr":"ABC","book_name":"A Book","session":"Session 2, January 8","text":"two"}
{"book_abbr":"ABC","book_name":"A Book","date":"1965-07-04","text":"three"}"#;
        let docs = parse_records(content, "abc.jsonl").expect("parse");

        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0].id, "abc-abc-1");
        assert_eq!(docs[0].date, Some(date(1964, 1, 2)));
        assert_eq!(docs[1].id, "custom");
        assert_eq!(docs[1].date, Some(date(1964, 1, 8)));
        assert_eq!(docs[2].date, Some(date(1965, 7, 4)));
        assert_eq!(docs[2].date_secs(), Some(-141_868_800));
    }

    #[test]
    fn default_ids_differ_between_files_of_one_book() {
        let line = "{\"book_abbr\":\"TB\",\"book_name\":\"B\",\"text\":\"x\"}\n";
        let first = parse_records(line, "books/Volume1.jsonl").expect("parse");
        let second = parse_records(line, "books/volume2.jsonl").expect("parse");
        assert_eq!(first[0].id, "tb-volume1-1");
        assert_eq!(second[0].id, "tb-volume2-1");
    }

    #[test]
    fn malformed_lines_name_their_location() {
        let content = "{\"book_abbr\":\"A\",\"book_name\":\"B\",\"text\":\"x\"}\nnot json\n";
        let err = parse_records(content, "broken.jsonl").unwrap_err();
        assert!(matches!(err, CorpusError::Record { line: 2, .. }));
        assert!(err.to_string().contains("broken.jsonl:2"));
    }

    #[test]
    fn load_file_reads_from_disk() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("book.jsonl");
        std::fs::write(&path, "{\"book_abbr\":\"A\",\"book_name\":\"B\",\"text\":\"x\"}\n").expect("write");
        let docs = load_file(&path).expect("load");
        assert_eq!(docs.len(), 1);
        assert!(docs[0].date.is_none());
    }
}
