pub mod dates;
pub mod detail;
pub mod dom;
pub mod relations;

use scraper::Html;

use crate::record::RegulationRecord;

/// HTML body of a detail page → normalized record.
pub fn parse_detail(html: &str, source_url: &str, origin: &str) -> RegulationRecord {
    let page = Html::parse_document(html);
    detail::extract(&page, source_url, origin)
}
