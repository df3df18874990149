use crate::model::MediaKind;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Immutable snapshot of one search invocation. Built fresh per query,
/// never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilter {
    /// Title substring match.
    pub title: Option<String>,
    /// ISBN substring match.
    pub isbn: Option<String>,
    pub kind: Option<MediaKind>,
    /// Only emitted when explicitly `true`.
    pub available: bool,
    pub rating: Option<u8>,
    /// 1-based page as the UI counts; `None` means page 1.
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl SearchFilter {
    pub fn page_size(&self) -> u32 {
        self.size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Zero-based page index the backend expects. The UI counts from 1;
    /// the clamp guards callers passing 0.
    pub fn backend_page(&self) -> u32 {
        self.page.unwrap_or(1).saturating_sub(1)
    }
}

/// Translates a filter into the backend's query string. Pure: the same
/// filter always yields the same string.
///
/// `titel`, `isbn`, `art` are only set when non-empty after trimming,
/// `lieferbar` only when true, `rating` only when present. `size` and
/// `page` are always set, `page` already converted to the backend's
/// zero-based index.
pub fn build_query(filter: &SearchFilter) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());

    if let Some(title) = filter.title.as_deref() {
        let title = title.trim();
        if !title.is_empty() {
            query.append_pair("titel", title);
        }
    }
    if let Some(isbn) = filter.isbn.as_deref() {
        let isbn = isbn.trim();
        if !isbn.is_empty() {
            query.append_pair("isbn", isbn);
        }
    }
    if let Some(kind) = filter.kind {
        query.append_pair("art", kind_wire_name(kind));
    }
    if filter.available {
        query.append_pair("lieferbar", "true");
    }
    if let Some(rating) = filter.rating {
        query.append_pair("rating", &rating.to_string());
    }

    query.append_pair("size", &filter.page_size().to_string());
    query.append_pair("page", &filter.backend_page().to_string());

    query.finish()
}

fn kind_wire_name(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Epub => "EPUB",
        MediaKind::Hardcover => "HARDCOVER",
        MediaKind::Paperback => "PAPERBACK",
    }
}
