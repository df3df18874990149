use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Physical/digital form of a catalog entry. Serialized with the backend's
/// uppercase wire names (`EPUB`, `HARDCOVER`, `PAPERBACK`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaKind {
    Epub,
    Hardcover,
    Paperback,
}

/// Title wrapper as the backend stores it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TitleInfo {
    #[serde(rename = "titel")]
    pub title: String,

    #[serde(rename = "untertitel", skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
}

/// A catalog entry as returned by the backend. The backend is the single
/// source of truth; instances here are transient, read-mostly copies.
///
/// Wire field names are the backend's German ones; Rust names are English.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Book {
    pub id: i64,
    pub isbn: String,

    #[serde(rename = "preis")]
    pub price: f64,

    /// Discount as a fraction in `0..=1`.
    #[serde(rename = "rabatt", skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,

    /// Integer rating in `0..=5`.
    pub rating: u8,

    #[serde(rename = "art", skip_serializing_if = "Option::is_none")]
    pub kind: Option<MediaKind>,

    #[serde(rename = "lieferbar", skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,

    #[serde(rename = "datum", skip_serializing_if = "Option::is_none")]
    pub release_date: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,

    #[serde(rename = "titel", skip_serializing_if = "Option::is_none")]
    pub title: Option<TitleInfo>,
}

/// Pagination metadata, zero-based `number`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageMeta {
    pub size: u32,
    pub number: u32,

    #[serde(rename = "totalElements")]
    pub total_elements: u64,

    #[serde(rename = "totalPages")]
    pub total_pages: u32,
}

/// One page of search results. Invariant: `content.len() <= page.size`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookPage {
    pub content: Vec<Book>,
    pub page: PageMeta,
}

/// Input for creating a catalog entry. Bare `title` here; the client wraps
/// it into the backend's title-object shape when building the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct BookDraft {
    pub title: String,
    pub isbn: String,
    pub price: f64,
    pub discount: Option<f64>,
    pub homepage: Option<String>,
    /// Plain `YYYY-MM-DD` date; expanded to a full UTC timestamp on send.
    pub release_date: Option<String>,
    pub rating: u8,
    pub available: Option<bool>,
    pub kind: Option<MediaKind>,
}

impl BookDraft {
    /// Field validation applied before a create is issued.
    /// Returns all violations, not just the first.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();

        if self.title.trim().is_empty() {
            problems.push("title must not be empty".to_string());
        }
        if self.isbn.trim().is_empty() {
            problems.push("isbn must not be empty".to_string());
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            problems.push("price must be a positive number".to_string());
        }
        if self.rating > 5 {
            problems.push("rating must be between 0 and 5".to_string());
        }
        if let Some(discount) = self.discount
            && !(0.0..=1.0).contains(&discount)
        {
            problems.push("discount must be a fraction between 0 and 1".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}
