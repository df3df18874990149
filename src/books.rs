use anyhow::Context as _;
use chrono::SecondsFormat;
use serde::Serialize;

use crate::model::{Book, BookDraft, BookPage, MediaKind, PageMeta, TitleInfo};
use crate::query::{SearchFilter, build_query};

/// Typed operations against the catalog backend, issued through the
/// gateway's `/api/backend` prefix (or straight at a backend in tests).
#[derive(Debug, Clone)]
pub struct BookClient {
    client: reqwest::Client,
    base_url: String,
}

impl BookClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn rest_url(&self, suffix: &str) -> String {
        format!("{}/rest{suffix}", self.base_url)
    }

    /// Runs one search. The backend signals "no matches" with a 404 rather
    /// than an empty 200 body; that status is normalized into an empty page
    /// here. Any other non-success status is an error carrying status and
    /// body text. Single attempt, no retry, no timeout.
    pub async fn search(
        &self,
        filter: &SearchFilter,
        token: Option<&str>,
    ) -> anyhow::Result<BookPage> {
        let url = format!("{}?{}", self.rest_url(""), build_query(filter));

        let mut request = self
            .client
            .get(&url)
            .header(reqwest::header::CACHE_CONTROL, "no-store");
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(empty_page(filter));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("search failed ({status}): {body}");
        }

        response.json().await.context("parse search result page")
    }

    pub async fn get_by_id(&self, id: i64, token: Option<&str>) -> anyhow::Result<Book> {
        let url = self.rest_url(&format!("/{id}"));

        let mut request = self.client.get(&url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("get book {id} failed ({status}): {body}");
        }

        response.json().await.context("parse book")
    }

    /// Creates a catalog entry. The creation response body is not
    /// authoritative: the new id only appears in the `Location` header, so
    /// a follow-up `get_by_id` fetches the full resource (two round trips
    /// by design). A 2xx without a parsable `Location` id is a fatal,
    /// distinct error rather than a silent fallback.
    pub async fn create(&self, draft: &BookDraft, token: Option<&str>) -> anyhow::Result<Book> {
        if let Err(problems) = draft.validate() {
            anyhow::bail!("invalid book draft: {}", problems.join("; "));
        }

        let url = self.rest_url("");
        let payload = CreatePayload::from_draft(draft)?;

        let mut request = self
            .client
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&payload);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("POST {url}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("create book failed ({status}): {body}");
        }

        let id = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .and_then(extract_id_from_location)
            .context("create succeeded, but the Location header is missing or has no id")?;

        self.get_by_id(id, token).await
    }
}

/// Cover image URL for a catalog entry. Pure formatting, no network call.
pub fn cover_path(id: i64) -> String {
    format!("/api/backend/rest/file/{id}")
}

/// Pulls the created id out of a `Location` header value: the trailing
/// numeric path segment, with an optional trailing slash.
pub fn extract_id_from_location(location: &str) -> Option<i64> {
    let trimmed = location.trim_end_matches('/');
    let (_, last) = trimmed.rsplit_once('/')?;
    if last.is_empty() || !last.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    last.parse().ok()
}

fn empty_page(filter: &SearchFilter) -> BookPage {
    BookPage {
        content: Vec::new(),
        page: PageMeta {
            size: filter.page_size(),
            number: filter.backend_page(),
            total_elements: 0,
            total_pages: 0,
        },
    }
}

/// Creation payload in the backend's wire shape: bare title wrapped into
/// the title object, plain date expanded to a full timestamp, unset
/// optionals omitted entirely.
#[derive(Debug, Serialize)]
struct CreatePayload<'a> {
    isbn: &'a str,
    rating: u8,

    #[serde(skip_serializing_if = "Option::is_none")]
    art: Option<MediaKind>,

    preis: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    rabatt: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    lieferbar: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    datum: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    homepage: Option<&'a str>,

    titel: TitleInfo,
}

impl<'a> CreatePayload<'a> {
    fn from_draft(draft: &'a BookDraft) -> anyhow::Result<Self> {
        Ok(Self {
            isbn: draft.isbn.trim(),
            rating: draft.rating,
            art: draft.kind,
            preis: draft.price,
            rabatt: draft.discount,
            lieferbar: draft.available,
            datum: draft
                .release_date
                .as_deref()
                .map(expand_date)
                .transpose()?,
            homepage: draft.homepage.as_deref(),
            titel: TitleInfo {
                title: draft.title.trim().to_string(),
                subtitle: None,
            },
        })
    }
}

/// `YYYY-MM-DD` → midnight UTC, RFC 3339 with milliseconds (the timestamp
/// shape the backend accepts).
fn expand_date(date: &str) -> anyhow::Result<String> {
    let day = chrono::NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid release date: {date:?}"))?;
    let midnight = day
        .and_hms_opt(0, 0, 0)
        .context("construct midnight timestamp")?
        .and_utc();
    Ok(midnight.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_with_trailing_id_parses() {
        assert_eq!(
            extract_id_from_location("https://host/rest/42"),
            Some(42)
        );
        assert_eq!(extract_id_from_location("/rest/7/"), Some(7));
    }

    #[test]
    fn location_without_numeric_tail_is_none() {
        assert_eq!(extract_id_from_location("https://host/rest/abc"), None);
        assert_eq!(extract_id_from_location("https://host/rest/4x2"), None);
        assert_eq!(extract_id_from_location(""), None);
        assert_eq!(extract_id_from_location("42"), None);
    }

    #[test]
    fn cover_path_is_pure_formatting() {
        assert_eq!(cover_path(5), "/api/backend/rest/file/5");
    }

    #[test]
    fn payload_wraps_title_and_expands_date() {
        let draft = BookDraft {
            title: " Alpha ".to_string(),
            isbn: "978-3-16-148410-0".to_string(),
            price: 12.5,
            discount: None,
            homepage: None,
            release_date: Some("2024-03-01".to_string()),
            rating: 4,
            available: Some(true),
            kind: None,
        };
        let payload = CreatePayload::from_draft(&draft).unwrap();
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["titel"]["titel"], "Alpha");
        assert_eq!(value["datum"], "2024-03-01T00:00:00.000Z");
        assert_eq!(value["lieferbar"], true);
        assert!(value.get("rabatt").is_none());
        assert!(value.get("homepage").is_none());
        assert!(value.get("art").is_none());
    }

    #[test]
    fn bad_date_is_an_error() {
        let draft = BookDraft {
            title: "Alpha".to_string(),
            isbn: "1".to_string(),
            price: 1.0,
            discount: None,
            homepage: None,
            release_date: Some("01.03.2024".to_string()),
            rating: 1,
            available: None,
            kind: None,
        };
        assert!(CreatePayload::from_draft(&draft).is_err());
    }
}
