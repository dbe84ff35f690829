use scraper::{ElementRef, Selector};

/// Compile a selector literal. All selectors in this crate are constants
/// exercised by the parser tests.
pub fn selector(css: &'static str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector `{css}`: {e}"))
}

/// Visible text with whitespace runs collapsed to single spaces.
pub fn text_of(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

/// First following sibling element accepted by `pred`.
pub fn next_sibling_where<'a>(
    element: ElementRef<'a>,
    pred: impl Fn(ElementRef<'a>) -> bool,
) -> Option<ElementRef<'a>> {
    element
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|e| pred(*e))
}

/// Nearest ancestor element accepted by `pred`.
pub fn ancestor_where<'a>(
    element: ElementRef<'a>,
    pred: impl Fn(ElementRef<'a>) -> bool,
) -> Option<ElementRef<'a>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| pred(*e))
}

/// Resolve a site-relative href against `origin`; anything else is kept as-is.
pub fn resolve_href(origin: &str, href: &str) -> String {
    if href.starts_with('/') {
        format!("{}{}", origin.trim_end_matches('/'), href)
    } else {
        href.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn resolves_relative_links_only() {
        let origin = "https://peraturan.bpk.go.id";
        assert_eq!(
            resolve_href(origin, "/Details/1"),
            "https://peraturan.bpk.go.id/Details/1"
        );
        assert_eq!(
            resolve_href("https://peraturan.bpk.go.id/", "/Details/1"),
            "https://peraturan.bpk.go.id/Details/1"
        );
        assert_eq!(resolve_href(origin, "https://x.test/a"), "https://x.test/a");
    }

    #[test]
    fn text_is_collapsed() {
        let doc = Html::parse_fragment("<p>  PP  No. 15\n   Tahun <b>2021</b> </p>");
        let p = doc.select(&selector("p")).next().unwrap();
        assert_eq!(text_of(p), "PP No. 15 Tahun 2021");
    }

    #[test]
    fn sibling_and_ancestor_lookup() {
        let doc = Html::parse_fragment(
            r#"<div class="row"><span>a</span><p>skip</p><span id="b">b</span></div>"#,
        );
        let first = doc.select(&selector("span")).next().unwrap();
        let next = next_sibling_where(first, |e| e.value().name() == "span").unwrap();
        assert_eq!(next.value().id(), Some("b"));
        let row = ancestor_where(first, |e| has_class(e, "row")).unwrap();
        assert_eq!(row.value().name(), "div");
    }
}
