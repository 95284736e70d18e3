//! Extraction output types
//!
//! Plain data structures produced by the engine and consumed by the
//! surrounding crawler: field values, emitted sub-documents and annotated
//! outlinks. All maps preserve insertion order, since downstream index
//! mapping is declaration-order sensitive.

/// Well-known metadata keys attached to outlinks and documents
pub mod keys {
    /// Session cookie propagated from the parent fetch
    pub const COOKIE: &str = "Cookie";
    pub const COOKIE_DOMAIN: &str = "CookieDomain";
    pub const COOKIE_PATH: &str = "CookiePath";
    pub const COOKIE_EXPIRY: &str = "CookieExpiry";
    pub const COOKIE_SECURE: &str = "CookieSecure";

    /// Back-reference to the page a link was discovered on
    pub const PARENT_URL: &str = "parentUrl";

    /// Marks a link as a pagination link
    pub const NEXT_PAGE: &str = "nextPage";
    pub const NEXT_PAGE_INDEX: &str = "nextPageIndex";

    /// Set by the crawl scheduler on links it already intends to fetch
    pub const SHOULD_FETCH: &str = "shouldFetch";

    pub const CONTENT_TYPE: &str = "Content-Type";

    /// Document-level tag for freshly dated content items
    pub const ITEM_TYPE: &str = "itemType";
    pub const FETCH_INTERVAL: &str = "fetchInterval";
}

/// String metadata map, ordered by insertion, keys unique
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    pub fn new() -> Metadata {
        Metadata::default()
    }

    /// Inserts a key/value pair, replacing any existing value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Copies `key` from `source` into this map, if present.
    pub fn copy_from(&mut self, source: &Metadata, key: &str) {
        if let Some(value) = source.get(key) {
            self.insert(key, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A discovered or synthesized link leaving a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outlink {
    /// Absolute target URL
    pub url: String,

    /// Anchor text of the link, normalized
    pub anchor: String,

    /// Engine-attached annotations (dates, cookies, pagination markers)
    pub metadata: Metadata,
}

impl Outlink {
    pub fn new(url: String, anchor: String) -> Outlink {
        Outlink {
            url,
            anchor,
            metadata: Metadata::new(),
        }
    }
}

/// A synthetic document emitted from a repeated structure inside a page
/// (one listing row becomes one record)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedDocument {
    /// The representative URL captured from the structure's links
    pub url: String,

    /// Synthetic text body: the nested field values concatenated
    pub text: String,

    /// Nested field values plus inherited session metadata
    pub metadata: Metadata,

    /// Content type inherited from the parent document
    pub content_type: Option<String>,

    /// Re-fetch interval in seconds; zero means fetch-once
    pub fetch_interval: u64,
}

/// Named field values, ordered by first insertion; a field may take
/// multiple values (one per matched node)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    entries: Vec<(String, Vec<String>)>,
}

impl FieldMap {
    pub fn new() -> FieldMap {
        FieldMap::default()
    }

    /// Appends a value to the named field.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1.push(value.into()),
            None => self.entries.push((name, vec![value.into()])),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    /// First value of the named field, if any.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|values| values.first()).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(n, values)| (n.as_str(), values.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything extracted from one document.
///
/// Built in an isolated buffer during extraction and returned only on full
/// success; a fatal error mid-extraction yields no partial result.
#[derive(Debug, Clone, Default)]
pub struct ExtractionResult {
    /// Extracted field values, in declaration order
    pub fields: FieldMap,

    /// Document-level metadata attached by the engine
    pub document_meta: Metadata,

    /// Synthetic sub-documents emitted from repeated structures
    pub documents: Vec<EmittedDocument>,

    /// Final outlink set after filtering and pagination analysis
    pub outlinks: Vec<Outlink>,
}

impl ExtractionResult {
    pub fn new() -> ExtractionResult {
        ExtractionResult::default()
    }
}
