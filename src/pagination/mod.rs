//! Pagination analysis
//!
//! Listing pages repeat the same dated links fetch after fetch; only the
//! links dated since the last fetch are worth following, and only pages
//! whose links are all still fresh are worth paging past. This module
//! partitions a page's dated outlinks by freshness, decides whether to
//! continue to the next listing page, and synthesizes a next-page link
//! for sites whose pagination is driven by the crawler itself.

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};
use url::Url;

use crate::extract::{keys, Metadata, Outlink};
use crate::rules::dates;
use crate::GleanError;

/// Decides which of a listing page's outlinks are still worth fetching.
///
/// Dated links at or after `last_fetch` are kept (unless already scheduled);
/// older ones are dropped. Undated links carry no signal and are dropped.
/// When no stale link was seen at all the page may continue: its next-page
/// links are kept too, synthesizing one if the page had none.
pub fn classify(
    source_url: &str,
    source_meta: &Metadata,
    links: Vec<Outlink>,
    last_fetch: DateTime<Local>,
    date_pattern: &str,
    date_field: &str,
) -> Vec<Outlink> {
    let total = links.len();
    let cutoff = last_fetch.naive_local();
    let now = Local::now();

    let mut next_page_links: Vec<Outlink> = links
        .iter()
        .filter(|link| link.metadata.contains_key(keys::NEXT_PAGE))
        .cloned()
        .collect();

    // A page reached through synthesized pagination knows its own index;
    // the candidate successor continues from there.
    if let Some(index) = source_meta.get(keys::NEXT_PAGE_INDEX) {
        match generate_next_page_link(source_url, index.parse().ok()) {
            Ok(link) => next_page_links.push(link),
            Err(e) => warn!(url = %source_url, error = %e, "cannot continue pagination"),
        }
    }

    let mut kept = Vec::new();
    let mut stale_seen = false;
    let mut fresh_count = 0usize;

    for link in &links {
        let Some(date) = link.metadata.get(date_field) else {
            continue;
        };
        let Some(parsed) = dates::parse_with_pattern(date, date_pattern, now) else {
            warn!(url = %link.url, date = %date, "unparseable link date, dropped");
            continue;
        };

        if parsed >= cutoff {
            fresh_count += 1;
            // Links the scheduler already queued would be fetched twice
            if !link.metadata.contains_key(keys::SHOULD_FETCH) {
                let mut link = link.clone();
                propagate_session(&mut link, source_meta, source_url);
                kept.push(link);
            }
        } else {
            stale_seen = true;
        }
    }

    if !stale_seen && total > 0 {
        if next_page_links.is_empty() {
            match generate_next_page_link(source_url, None) {
                Ok(link) => next_page_links.push(link),
                Err(e) => warn!(url = %source_url, error = %e, "cannot synthesize next-page link"),
            }
        }
        for mut link in next_page_links {
            debug!(url = %link.url, "continuing to next listing page");
            propagate_session(&mut link, source_meta, source_url);
            kept.push(link);
        }
    }

    info!(
        url = %source_url,
        total,
        fresh = fresh_count,
        kept = kept.len(),
        "pagination analysis finished"
    );

    kept
}

/// Builds the synthetic link for the next listing page of `base_url`.
///
/// The target is the base URL with its path replaced by `/nextPage/<index>`
/// and query and fragment cleared; the fetch layer translates that marker
/// path back into the site's own pagination action.
pub fn generate_next_page_link(
    base_url: &str,
    previous_index: Option<u32>,
) -> Result<Outlink, GleanError> {
    let next_index = previous_index.unwrap_or(1) + 1;

    let mut url = Url::parse(base_url).map_err(|_| GleanError::MalformedBaseUrl {
        url: base_url.to_string(),
    })?;
    url.set_path(&format!("/nextPage/{next_index}"));
    url.set_query(None);
    url.set_fragment(None);

    let mut link = Outlink::new(url.to_string(), format!("nextPage {next_index}"));
    link.metadata.insert(keys::NEXT_PAGE, "true");
    link.metadata
        .insert(keys::NEXT_PAGE_INDEX, next_index.to_string());
    Ok(link)
}

/// Copies the crawl session (cookies) and the parent back-reference onto a
/// link about to be scheduled.
fn propagate_session(link: &mut Outlink, source_meta: &Metadata, source_url: &str) {
    if source_meta.contains_key(keys::COOKIE) {
        for key in [
            keys::COOKIE,
            keys::COOKIE_DOMAIN,
            keys::COOKIE_PATH,
            keys::COOKIE_EXPIRY,
            keys::COOKIE_SECURE,
        ] {
            link.metadata.copy_from(source_meta, key);
        }
    }
    link.metadata.insert(keys::PARENT_URL, source_url);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SOURCE: &str = "https://example.com/jobs?page=1";

    fn last_fetch() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn dated_link(url: &str, date: &str) -> Outlink {
        let mut link = Outlink::new(url.to_string(), "job".to_string());
        link.metadata.insert("offerdate", date);
        link
    }

    fn run(links: Vec<Outlink>) -> Vec<Outlink> {
        classify(
            SOURCE,
            &Metadata::new(),
            links,
            last_fetch(),
            "dd.MM.yyyy",
            "offerdate",
        )
    }

    #[test]
    fn test_all_fresh_synthesizes_next_page() {
        let kept = run(vec![
            dated_link("https://example.com/offer/1", "02.06.2024"),
            dated_link("https://example.com/offer/2", "01.06.2024"),
            dated_link("https://example.com/offer/3", "10.06.2024"),
        ]);

        // 3 fresh links plus exactly one synthetic next-page link
        assert_eq!(kept.len(), 4);
        let synthetic = kept.last().unwrap();
        assert_eq!(synthetic.url, "https://example.com/nextPage/2");
        assert_eq!(synthetic.metadata.get(keys::NEXT_PAGE), Some("true"));
        assert_eq!(synthetic.metadata.get(keys::NEXT_PAGE_INDEX), Some("2"));
    }

    #[test]
    fn test_stale_link_stops_pagination() {
        let kept = run(vec![
            dated_link("https://example.com/offer/1", "02.06.2024"),
            dated_link("https://example.com/offer/2", "01.05.2024"),
        ]);

        // The fresh link survives; the stale one and any next page do not
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].url, "https://example.com/offer/1");
    }

    #[test]
    fn test_date_equal_to_last_fetch_is_fresh() {
        let kept = run(vec![dated_link("https://example.com/offer/1", "01.06.2024")]);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].url, "https://example.com/offer/1");
    }

    #[test]
    fn test_already_scheduled_links_not_duplicated() {
        let mut link = dated_link("https://example.com/offer/1", "02.06.2024");
        link.metadata.insert(keys::SHOULD_FETCH, "true");

        let kept = run(vec![link]);
        // Only the synthetic next-page link remains
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].url, "https://example.com/nextPage/2");
    }

    #[test]
    fn test_undated_links_dropped() {
        let undated = Outlink::new("https://example.com/about".to_string(), "About".to_string());
        let kept = run(vec![
            undated,
            dated_link("https://example.com/offer/1", "02.06.2024"),
        ]);

        let urls: Vec<_> = kept.iter().map(|l| l.url.as_str()).collect();
        assert!(!urls.contains(&"https://example.com/about"));
        assert!(urls.contains(&"https://example.com/offer/1"));
    }

    #[test]
    fn test_empty_page_gets_no_next_page() {
        assert!(run(Vec::new()).is_empty());
    }

    #[test]
    fn test_natural_next_page_link_preferred() {
        let mut natural = Outlink::new(
            "https://example.com/jobs?page=2".to_string(),
            "next".to_string(),
        );
        natural.metadata.insert(keys::NEXT_PAGE, "true");

        let kept = run(vec![
            dated_link("https://example.com/offer/1", "02.06.2024"),
            natural,
        ]);

        let urls: Vec<_> = kept.iter().map(|l| l.url.as_str()).collect();
        assert!(urls.contains(&"https://example.com/jobs?page=2"));
        assert!(!urls.iter().any(|u| u.contains("/nextPage/")));
    }

    #[test]
    fn test_index_continues_from_source_metadata() {
        let mut source_meta = Metadata::new();
        source_meta.insert(keys::NEXT_PAGE_INDEX, "4");

        let kept = classify(
            "https://example.com/nextPage/4",
            &source_meta,
            vec![dated_link("https://example.com/offer/1", "02.06.2024")],
            last_fetch(),
            "dd.MM.yyyy",
            "offerdate",
        );

        assert!(kept
            .iter()
            .any(|l| l.url == "https://example.com/nextPage/5"));
    }

    #[test]
    fn test_session_propagated_to_kept_links() {
        let mut source_meta = Metadata::new();
        source_meta.insert(keys::COOKIE, "session=xyz");
        source_meta.insert(keys::COOKIE_PATH, "/");

        let kept = classify(
            SOURCE,
            &source_meta,
            vec![dated_link("https://example.com/offer/1", "02.06.2024")],
            last_fetch(),
            "dd.MM.yyyy",
            "offerdate",
        );

        for link in &kept {
            assert_eq!(link.metadata.get(keys::COOKIE), Some("session=xyz"));
            assert_eq!(link.metadata.get(keys::COOKIE_PATH), Some("/"));
            assert_eq!(link.metadata.get(keys::PARENT_URL), Some(SOURCE));
        }
        assert!(!kept.is_empty());
    }

    #[test]
    fn test_generate_next_page_link_clears_query() {
        let link = generate_next_page_link("https://example.com/jobs?page=1#top", None).unwrap();
        assert_eq!(link.url, "https://example.com/nextPage/2");
        assert_eq!(link.anchor, "nextPage 2");
    }

    #[test]
    fn test_generate_next_page_link_bad_base() {
        assert!(generate_next_page_link("not a url", None).is_err());
    }
}
