use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::{error, info, warn};

use crate::fetch::Fetcher;
use crate::parser::dom::{resolve_href, selector, text_of};
use crate::settings::Settings;

static PAGE_LINK: LazyLock<Selector> = LazyLock::new(|| selector("a.page-link"));
static DETAIL_LINK: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"a[href^="/Details/"]:not(.text-danger)"#));
static PAGE_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]p=([0-9]+)").expect("valid regex"));

/// Detail-page URLs found during one walk, unique, in first-seen order.
#[derive(Debug, Default)]
pub struct LinkSet {
    seen: HashSet<String>,
    links: Vec<String>,
}

impl LinkSet {
    /// Returns false when the URL was already present.
    pub fn insert(&mut self, url: String) -> bool {
        if self.seen.contains(&url) {
            return false;
        }
        self.seen.insert(url.clone());
        self.links.push(url);
        true
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.links.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.links
    }
}

/// Listing URL for page `page` (1-based).
pub fn page_url(list_url: &str, page: u32) -> String {
    let sep = if list_url.contains('?') { '&' } else { '?' };
    format!("{list_url}{sep}p={page}")
}

/// Page number carried by the pagination control's "Last" anchor.
pub fn last_page_number(html: &str) -> Option<u32> {
    let doc = Html::parse_document(html);
    let last = doc
        .select(&PAGE_LINK)
        .find(|a| is_last_control(&text_of(*a)))?;
    let href = last.value().attr("href")?;
    PAGE_PARAM.captures(href)?[1].parse().ok()
}

/// "Last", optionally followed by an arrow or other decoration ("Last »").
fn is_last_control(text: &str) -> bool {
    text.split_whitespace()
        .next()
        .is_some_and(|word| word.eq_ignore_ascii_case("last"))
}

/// Absolute detail links on one listing page, in document order.
pub fn page_links(html: &str, origin: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    doc.select(&DETAIL_LINK)
        .filter_map(|a| a.value().attr("href"))
        .map(|href| resolve_href(origin, href))
        .collect()
}

/// Walk every listing page and collect unique detail-page URLs.
///
/// A missing pagination control ends the walk with an empty set; a failed
/// listing page is logged and skipped.
pub async fn discover_links<F: Fetcher>(fetcher: &F, settings: &Settings) -> LinkSet {
    let mut links = LinkSet::default();

    info!("Finding last listing page: {}", settings.list_url);
    let max_pages = match fetcher.fetch(&settings.list_url).await {
        Ok(html) => last_page_number(&html),
        Err(e) => {
            error!("Could not fetch first listing page: {}", e);
            None
        }
    };
    let Some(max_pages) = max_pages else {
        warn!("No 'Last' pagination link found; no regulation links discovered");
        return links;
    };
    info!("Listing has {} pages", max_pages);

    for page in 1..=max_pages {
        let url = page_url(&settings.list_url, page);
        info!("Scraping listing page {}/{}: {}", page, max_pages, url);

        match fetcher.fetch(&url).await {
            Ok(html) => {
                let found = page_links(&html, &settings.base_url)
                    .into_iter()
                    .filter(|link| links.insert(link.clone()))
                    .count();
                info!("Found {} new links on page {}", found, page);
            }
            Err(e) => warn!("Could not fetch listing page {}: {}. Skipping.", page, e),
        }

        if page < max_pages && !settings.page_delay().is_zero() {
            tokio::time::sleep(settings.page_delay()).await;
        }
    }

    info!("Discovered {} unique regulation links", links.len());
    links
}
