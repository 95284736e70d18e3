//! Scraper-backed document view
//!
//! The default [`DocumentView`] implementation: HTML parsed with `scraper`,
//! path queries evaluated as CSS selectors, hyperlink discovery over
//! `<a href>`/`<area href>` elements resolved against the document base URL.

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use super::{normalize_ws, DocumentView, NodeKind};
use crate::extract::Outlink;
use crate::GleanError;

/// An HTML document with CSS selector path queries
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    /// Parses an HTML string into a queryable document.
    ///
    /// Parse errors are tolerated the way browsers tolerate them; the
    /// resulting tree is always usable.
    pub fn parse(html: &str) -> Self {
        HtmlDocument {
            html: Html::parse_document(html),
        }
    }

    fn compile_selector(&self, query: &str) -> Result<Selector, GleanError> {
        Selector::parse(query).map_err(|e| GleanError::Query {
            query: query.to_string(),
            message: e.to_string(),
        })
    }
}

impl DocumentView for HtmlDocument {
    type NodeId = NodeId;

    fn root(&self) -> NodeId {
        self.html.tree.root().id()
    }

    fn kind(&self, node: NodeId) -> NodeKind {
        match self.html.tree.get(node).map(|n| n.value()) {
            Some(Node::Element(_)) => NodeKind::Element,
            Some(Node::Text(_)) => NodeKind::Text,
            Some(Node::Comment(_)) => NodeKind::Comment,
            _ => NodeKind::Other,
        }
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        match self.html.tree.get(node)?.value() {
            Node::Element(element) => Some(element.name().to_string()),
            _ => None,
        }
    }

    fn text_value(&self, node: NodeId) -> Option<String> {
        match self.html.tree.get(node)?.value() {
            Node::Text(text) => Some(text.to_string()),
            _ => None,
        }
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        match self.html.tree.get(node) {
            Some(node_ref) => node_ref.children().map(|c| c.id()).collect(),
            None => Vec::new(),
        }
    }

    fn own_text(&self, node: NodeId) -> String {
        let Some(node_ref) = self.html.tree.get(node) else {
            return String::new();
        };
        match node_ref.value() {
            Node::Text(text) => text.to_string(),
            Node::Element(_) => match ElementRef::wrap(node_ref) {
                Some(element) => element.text().collect(),
                None => String::new(),
            },
            _ => String::new(),
        }
    }

    fn select(&self, node: NodeId, query: &str) -> Result<Vec<NodeId>, GleanError> {
        let selector = self.compile_selector(query)?;

        if node == self.root() {
            return Ok(self.html.select(&selector).map(|el| el.id()).collect());
        }

        let Some(node_ref) = self.html.tree.get(node) else {
            return Ok(Vec::new());
        };
        match ElementRef::wrap(node_ref) {
            Some(element) => Ok(element.select(&selector).map(|el| el.id()).collect()),
            // Text and comment nodes contain no selectable elements
            None => Ok(Vec::new()),
        }
    }

    fn discover_links(&self, base_url: &str, node: NodeId) -> Result<Vec<Outlink>, GleanError> {
        let base = Url::parse(base_url).map_err(|_| GleanError::MalformedBaseUrl {
            url: base_url.to_string(),
        })?;

        let Some(node_ref) = self.html.tree.get(node) else {
            return Ok(Vec::new());
        };

        let mut links = Vec::new();
        for descendant in node_ref.descendants() {
            let Some(element) = ElementRef::wrap(descendant) else {
                continue;
            };
            let name = element.value().name();
            if name != "a" && name != "area" {
                continue;
            }
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            if let Some(absolute_url) = resolve_link(href, &base) {
                let anchor = normalize_ws(&element.text().collect::<String>());
                links.push(Outlink::new(absolute_url, anchor));
            }
        }

        Ok(links)
    }
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid or non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_from_root() {
        let doc = HtmlDocument::parse("<div><p>one</p><p>two</p></div>");
        let nodes = doc.select(doc.root(), "p").unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(doc.own_text(nodes[0]), "one");
        assert_eq!(doc.own_text(nodes[1]), "two");
    }

    #[test]
    fn test_select_scoped_to_node() {
        let doc = HtmlDocument::parse(
            "<div id='a'><span>in</span></div><div id='b'><span>out</span></div>",
        );
        let scope = doc.select(doc.root(), "div#a").unwrap()[0];
        let spans = doc.select(scope, "span").unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(doc.own_text(spans[0]), "in");
    }

    #[test]
    fn test_select_one() {
        let doc = HtmlDocument::parse("<ul><li>first</li><li>second</li></ul>");
        let node = doc.select_one(doc.root(), "li").unwrap().unwrap();
        assert_eq!(doc.own_text(node), "first");
        assert!(doc.select_one(doc.root(), "table").unwrap().is_none());
    }

    #[test]
    fn test_select_invalid_query() {
        let doc = HtmlDocument::parse("<p>x</p>");
        // A bare pseudo-class colon cannot parse as a selector
        let result = doc.select(doc.root(), ":");
        assert!(matches!(result, Err(GleanError::Query { .. })));
    }

    #[test]
    fn test_node_kinds() {
        let doc = HtmlDocument::parse("<p>text<!-- c --></p>");
        let p = doc.select(doc.root(), "p").unwrap()[0];
        assert_eq!(doc.kind(p), NodeKind::Element);
        assert_eq!(doc.tag_name(p), Some("p".to_string()));

        let children = doc.children(p);
        assert_eq!(children.len(), 2);
        assert_eq!(doc.kind(children[0]), NodeKind::Text);
        assert_eq!(doc.text_value(children[0]), Some("text".to_string()));
        assert_eq!(doc.kind(children[1]), NodeKind::Comment);
    }

    #[test]
    fn test_discover_links_resolves_relative() {
        let doc = HtmlDocument::parse(
            r#"<div><a href="/jobs/1">Job One</a><a href="https://other.com/x">Other</a></div>"#,
        );
        let links = doc
            .discover_links("https://example.com/list", doc.root())
            .unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].url, "https://example.com/jobs/1");
        assert_eq!(links[0].anchor, "Job One");
        assert_eq!(links[1].url, "https://other.com/x");
    }

    #[test]
    fn test_discover_links_skips_special_schemes() {
        let doc = HtmlDocument::parse(
            r##"<a href="javascript:void(0)">js</a>
               <a href="mailto:x@y.z">mail</a>
               <a href="#top">frag</a>
               <a href="/ok">ok</a>"##,
        );
        let links = doc.discover_links("https://example.com/", doc.root()).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://example.com/ok");
    }

    #[test]
    fn test_discover_links_scoped() {
        let doc = HtmlDocument::parse(
            r#"<div id="row"><a href="/in">in</a></div><a href="/out">out</a>"#,
        );
        let row = doc.select(doc.root(), "div#row").unwrap()[0];
        let links = doc.discover_links("https://example.com/", row).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://example.com/in");
    }

    #[test]
    fn test_discover_links_malformed_base() {
        let doc = HtmlDocument::parse(r#"<a href="/x">x</a>"#);
        let result = doc.discover_links("not a url", doc.root());
        assert!(matches!(result, Err(GleanError::MalformedBaseUrl { .. })));
    }
}
