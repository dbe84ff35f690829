use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::dom::{ancestor_where, has_class, next_sibling_where, resolve_href, text_of};
use crate::record::{RelationLink, Relations};

static HEADER: LazyLock<Selector> =
    LazyLock::new(|| super::dom::selector("div.fw-semibold, div.bg-light-primary"));
static ORDERED_LIST: LazyLock<Selector> = LazyLock::new(|| super::dom::selector("ol"));
static ITEM: LazyLock<Selector> = LazyLock::new(|| super::dom::selector("li"));
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| super::dom::selector("a"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RelationKind {
    AmendedBy,
    Revokes,
    Amends,
    RevokedBy,
}

impl RelationKind {
    fn from_header(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "diubah dengan" => Some(Self::AmendedBy),
            "mencabut" => Some(Self::Revokes),
            "mengubah" => Some(Self::Amends),
            "dicabut dengan" => Some(Self::RevokedBy),
            _ => None,
        }
    }

    fn slot(self, relations: &mut Relations) -> &mut Vec<RelationLink> {
        match self {
            Self::AmendedBy => &mut relations.diubah_dengan,
            Self::Revokes => &mut relations.mencabut,
            Self::Amends => &mut relations.mengubah,
            Self::RevokedBy => &mut relations.dicabut_dengan,
        }
    }
}

/// Collect the revoked-by / revokes / amended-by / amends sections of a detail page.
///
/// A section is a header row followed by a sibling row holding an `<ol>`.
/// Sections with any part of that structure missing are skipped.
pub fn extract(page: &Html, origin: &str) -> Relations {
    let mut relations = Relations::default();

    for header in page.select(&HEADER) {
        let Some(kind) = RelationKind::from_header(&text_of(header)) else {
            continue;
        };
        let Some(list) = section_list(header) else {
            debug!("relation section {:?} has no list, skipping", kind);
            continue;
        };

        let items = list_items(list, origin);
        if !items.is_empty() {
            *kind.slot(&mut relations) = items;
        }
    }

    relations
}

fn section_list(header: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let is_row = |e: ElementRef<'_>| e.value().name() == "div" && has_class(e, "row");
    let row = ancestor_where(header, is_row)?;
    let next_row = next_sibling_where(row, is_row)?;
    next_row.select(&ORDERED_LIST).next()
}

fn list_items(list: ElementRef<'_>, origin: &str) -> Vec<RelationLink> {
    list.select(&ITEM)
        .filter_map(|li| li.select(&ANCHOR).next())
        .map(|a| RelationLink {
            text: text_of(a),
            link: resolve_href(origin, a.value().attr("href").unwrap_or_default()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://peraturan.bpk.go.id";

    fn parse(body: &str) -> Relations {
        extract(&Html::parse_document(body), ORIGIN)
    }

    #[test]
    fn fixture_sections() {
        let html = std::fs::read_to_string("tests/fixtures/detail.html").unwrap();
        let r = parse(&html);
        assert_eq!(
            r.diubah_dengan,
            vec![RelationLink {
                text: "PP No. 15 Tahun 2021 tentang Update Testing".into(),
                link: "https://peraturan.bpk.go.id/Details/12345".into(),
            }]
        );
        assert_eq!(r.mengubah.len(), 1);
        assert_eq!(r.mengubah[0].link, "https://peraturan.bpk.go.id/Details/54321");
        assert!(r.mencabut.is_empty());
        assert!(r.dicabut_dengan.is_empty());
    }

    #[test]
    fn keeps_document_order_and_absolute_links() {
        let r = parse(
            r#"<div class="container">
                <div class="row"><div class="fw-semibold bg-light-primary">Diubah Dengan</div></div>
                <div class="row"><ol>
                    <li><a href="/Details/2">PP   No. 2
                        Tahun 2022</a></li>
                    <li><a href="https://elsewhere.test/Details/1">PP No. 1 Tahun 2021</a></li>
                    <li>no link here</li>
                </ol></div>
            </div>"#,
        );
        assert_eq!(r.diubah_dengan.len(), 2);
        assert_eq!(r.diubah_dengan[0].text, "PP No. 2 Tahun 2022");
        assert_eq!(r.diubah_dengan[0].link, "https://peraturan.bpk.go.id/Details/2");
        assert_eq!(r.diubah_dengan[1].link, "https://elsewhere.test/Details/1");
    }

    #[test]
    fn broken_sections_are_skipped() {
        let r = parse(
            r#"<div class="container">
                <div class="row"><div class="fw-semibold">mencabut</div></div>
                <div class="row"><p>no list</p></div>
                <div class="row"><div class="fw-semibold">dicabut dengan</div></div>
            </div>
            <div class="fw-semibold">mengubah</div>"#,
        );
        assert_eq!(r, Relations::default());
    }

    #[test]
    fn empty_section_does_not_clear_earlier_items() {
        let r = parse(
            r#"<div>
                <div class="row"><div class="fw-semibold">mencabut</div></div>
                <div class="row"><ol><li><a href="/Details/9">UU No. 9</a></li></ol></div>
                <div class="row"><div class="fw-semibold">mencabut</div></div>
                <div class="row"><ol></ol></div>
            </div>"#,
        );
        assert_eq!(r.mencabut.len(), 1);
        assert_eq!(r.mencabut[0].text, "UU No. 9");
    }
}
