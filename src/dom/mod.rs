//! Document tree abstraction
//!
//! This module defines the read-only view the extraction engine has of a
//! parsed document, plus the default HTML implementation:
//! - `DocumentView`: node access, path-query selection and link discovery
//! - `HtmlDocument`: scraper-backed implementation using CSS selectors
//! - Text extraction and value filtering helpers

mod html;
mod text;

pub use html::HtmlDocument;
pub use text::{extract_text, filter_value, normalize_ws, unescape_entities};

use crate::extract::Outlink;
use crate::GleanError;

/// The kind of a document node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    Comment,
    /// Document roots, doctypes, processing instructions
    Other,
}

/// Read-only view of a parsed document tree.
///
/// The engine never mutates the document; it only selects nodes with path
/// queries, reads text content and discovers outbound hyperlinks. Callers
/// with a different query engine (XPath, XML) implement this trait; the
/// crate ships [`HtmlDocument`] for HTML with CSS selector queries.
pub trait DocumentView {
    /// Opaque node handle, valid only for the document that produced it.
    type NodeId: Copy + Eq + std::fmt::Debug;

    /// The root node of the document.
    fn root(&self) -> Self::NodeId;

    /// The kind of the given node.
    fn kind(&self, node: Self::NodeId) -> NodeKind;

    /// Tag name for element nodes, lowercase.
    fn tag_name(&self, node: Self::NodeId) -> Option<String>;

    /// Raw textual value for text nodes.
    fn text_value(&self, node: Self::NodeId) -> Option<String>;

    /// Child nodes in document order.
    fn children(&self, node: Self::NodeId) -> Vec<Self::NodeId>;

    /// The node's rendered text content (all descendant text, unmodified).
    fn own_text(&self, node: Self::NodeId) -> String;

    /// Evaluates a path query within `node`, returning matches in document
    /// order. Fails with [`GleanError::Query`] on unparsable query syntax.
    fn select(&self, node: Self::NodeId, query: &str) -> Result<Vec<Self::NodeId>, GleanError>;

    /// Evaluates a path query within `node`, returning the first match.
    fn select_one(
        &self,
        node: Self::NodeId,
        query: &str,
    ) -> Result<Option<Self::NodeId>, GleanError> {
        Ok(self.select(node, query)?.into_iter().next())
    }

    /// Discovers outbound hyperlinks reachable from `node`, resolved against
    /// `base_url`. Fails with [`GleanError::MalformedBaseUrl`] if the base
    /// URL cannot be parsed; this aborts the whole extraction call.
    fn discover_links(
        &self,
        base_url: &str,
        node: Self::NodeId,
    ) -> Result<Vec<Outlink>, GleanError>;
}
