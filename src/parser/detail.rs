use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use super::dates;
use super::dom::{next_sibling_where, resolve_href, selector, text_of};
use super::relations;
use crate::record::{RegulationRecord, RelationLink};

static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("h4.mb-8"));
static SUBJECT: LazyLock<Selector> = LazyLock::new(|| selector("h1.text-white"));
static DETAIL_ROW: LazyLock<Selector> =
    LazyLock::new(|| selector("div.py-4, div.bg-light-primary"));
static ROW_LABEL: LazyLock<Selector> = LazyLock::new(|| selector("div.fw-bold"));
static DOWNLOAD: LazyLock<Selector> = LazyLock::new(|| selector("a.download-file"));

static TYPE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s+(?:Nomor|No\.)").expect("valid regex"));
static SHORT_FORM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]+)\)").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Judul,
    Nomor,
    Tahun,
    TempatPenetapan,
    TanggalPenetapan,
    TanggalPengundangan,
    TanggalBerlaku,
    Sumber,
    Status,
    Bahasa,
    Subjek,
    Bidang,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transform {
    /// Value as shown, blank included.
    Text,
    /// Blank becomes `None`.
    NonBlank,
    Date,
}

/// Label substring → field, evaluated top to bottom; the first hit wins.
const LABEL_RULES: &[(&str, Field, Transform)] = &[
    ("Judul", Field::Judul, Transform::Text),
    ("Nomor", Field::Nomor, Transform::Text),
    ("Tahun", Field::Tahun, Transform::Text),
    ("Tempat Penetapan", Field::TempatPenetapan, Transform::Text),
    ("Tanggal Penetapan", Field::TanggalPenetapan, Transform::Date),
    ("Tanggal Pengundangan", Field::TanggalPengundangan, Transform::Date),
    ("Tanggal Berlaku", Field::TanggalBerlaku, Transform::Date),
    ("Sumber", Field::Sumber, Transform::Text),
    ("Status", Field::Status, Transform::Text),
    ("Bahasa", Field::Bahasa, Transform::Text),
    ("Subjek", Field::Subjek, Transform::NonBlank),
    ("Bidang", Field::Bidang, Transform::NonBlank),
];

fn match_label(label: &str) -> Option<(Field, Transform)> {
    LABEL_RULES
        .iter()
        .find(|(needle, _, _)| label.contains(needle))
        .map(|&(_, field, transform)| (field, transform))
}

impl Transform {
    fn apply(self, value: String) -> Option<String> {
        match self {
            Transform::Text => Some(value),
            Transform::NonBlank => Some(value).filter(|v| !v.is_empty()),
            Transform::Date => dates::normalize(Some(&value)),
        }
    }
}

impl Field {
    fn slot(self, record: &mut RegulationRecord) -> &mut Option<String> {
        match self {
            Field::Judul => &mut record.judul,
            Field::Nomor => &mut record.nomor,
            Field::Tahun => &mut record.tahun,
            Field::TempatPenetapan => &mut record.tempat_penetapan,
            Field::TanggalPenetapan => &mut record.tanggal_penetapan,
            Field::TanggalPengundangan => &mut record.tanggal_pengundangan,
            Field::TanggalBerlaku => &mut record.tanggal_berlaku,
            Field::Sumber => &mut record.sumber,
            Field::Status => &mut record.status,
            Field::Bahasa => &mut record.bahasa,
            Field::Subjek => &mut record.subjek,
            Field::Bidang => &mut record.bidang,
        }
    }
}

/// Build a record from a parsed regulation detail page.
///
/// Missing elements leave their fields empty; this never fails.
pub fn extract(page: &Html, source_url: &str, origin: &str) -> RegulationRecord {
    let mut record = RegulationRecord::new(source_url);

    record.nama_peraturan = page.select(&TITLE).next().map(text_of);
    record.materi_pokok = page.select(&SUBJECT).next().map(text_of);

    scan_detail_rows(page, &mut record);

    if let Some(type_label) = record.nama_peraturan.as_deref().and_then(document_type) {
        record.bentuk_singkat = short_form(&type_label);
        record.bentuk = Some(type_label.clone());
        record.tipe_dokumen = Some(type_label);
    }

    let downloads: Vec<RelationLink> = page
        .select(&DOWNLOAD)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            Some(RelationLink {
                text: text_of(a),
                link: resolve_href(origin, href),
            })
        })
        .collect();
    // The first download anchor is a different artifact; the PDF is the second.
    record.file_pdf = page
        .select(&DOWNLOAD)
        .nth(1)
        .and_then(|a| a.value().attr("href"))
        .map(|href| resolve_href(origin, href));
    record.file_peraturan = downloads;

    record.set_relations(relations::extract(page, origin));
    record
}

fn scan_detail_rows(page: &Html, record: &mut RegulationRecord) {
    for row in page.select(&DETAIL_ROW) {
        let Some(label_cell) = row.select(&ROW_LABEL).next() else {
            continue;
        };
        let Some(value_cell) = next_sibling_where(label_cell, |e| e.value().name() == "div")
        else {
            continue;
        };
        let Some((field, transform)) = match_label(&text_of(label_cell)) else {
            continue;
        };
        *field.slot(record) = transform.apply(text_of(value_cell));
    }
}

/// Type label of a title: everything before the first "Nomor" / "No.".
fn document_type(title: &str) -> Option<String> {
    let caps = TYPE_PREFIX.captures(title)?;
    let label = caps[1].trim();
    (!label.is_empty()).then(|| label.to_string())
}

/// Inner text of the first parenthesized segment, e.g. "PP".
fn short_form(type_label: &str) -> Option<String> {
    SHORT_FORM
        .captures(type_label)
        .map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://peraturan.bpk.go.id";
    const URL: &str = "https://peraturan.bpk.go.id/Details/49482/pp-no-34-tahun-2005";

    fn fixture() -> RegulationRecord {
        let html = std::fs::read_to_string("tests/fixtures/detail.html").unwrap();
        extract(&Html::parse_document(&html), URL, ORIGIN)
    }

    fn from_body(body: &str) -> RegulationRecord {
        extract(&Html::parse_document(body), URL, ORIGIN)
    }

    #[test]
    fn full_detail_page() {
        let r = fixture();
        assert_eq!(r.link_peraturan, URL);
        assert_eq!(
            r.nama_peraturan.as_deref(),
            Some("Peraturan Pemerintah (PP) No. 12 Tahun 2020")
        );
        assert_eq!(r.materi_pokok.as_deref(), Some("Tentang Testing dan Automation"));
        assert_eq!(
            r.judul.as_deref(),
            Some("Peraturan Pemerintah (PP) Nomor 12 Tahun 2020 tentang Testing dan Automation")
        );
        assert_eq!(r.nomor.as_deref(), Some("12"));
        assert_eq!(r.tahun.as_deref(), Some("2020"));
        assert_eq!(r.tanggal_penetapan.as_deref(), Some("2020-06-15"));
        assert_eq!(r.status.as_deref(), Some("Berlaku"));
        assert_eq!(r.subjek.as_deref(), Some("TESTING"));

        assert_eq!(r.tipe_dokumen.as_deref(), Some("Peraturan Pemerintah (PP)"));
        assert_eq!(r.bentuk.as_deref(), Some("Peraturan Pemerintah (PP)"));
        assert_eq!(r.bentuk_singkat.as_deref(), Some("PP"));

        assert_eq!(r.teu.as_deref(), Some("Indonesia, Pemerintah Pusat"));
        assert_eq!(r.lokasi.as_deref(), Some("Pemerintah Pusat"));

        assert_eq!(
            r.file_pdf.as_deref(),
            Some("https://peraturan.bpk.go.id/fake/path2.pdf")
        );
        assert_eq!(r.file_peraturan.len(), 2);
        assert_eq!(r.file_peraturan[0].text, "Link 1");

        assert_eq!(r.diubah_dengan.len(), 1);
        assert_eq!(r.diubah_dengan[0].link, "https://peraturan.bpk.go.id/Details/12345");
        assert_eq!(r.mengubah.len(), 1);
        assert!(r.mencabut.is_empty());
        assert!(r.dicabut_dengan.is_empty());
        assert!(r.ujimateri_mk.is_empty());

        assert_eq!(r.tanggal_berlaku, None);
        assert_eq!(r.bidang, None);
        assert!(!r.is_sparse());
    }

    #[test]
    fn reparsing_is_stable() {
        assert_eq!(fixture(), fixture());
    }

    #[test]
    fn type_derivation() {
        assert_eq!(
            document_type("Peraturan Pemerintah (PP) No. 12 Tahun 2020").as_deref(),
            Some("Peraturan Pemerintah (PP)")
        );
        assert_eq!(
            document_type("Peraturan Menteri Negara Nomor 3 Tahun 2010").as_deref(),
            Some("Peraturan Menteri Negara")
        );
        assert_eq!(document_type("Tanpa nomor apapun"), None);
        assert_eq!(short_form("Peraturan Pemerintah (PP)").as_deref(), Some("PP"));
        assert_eq!(short_form("Keputusan Presiden"), None);
    }

    #[test]
    fn title_without_number_leaves_type_empty() {
        let r = from_body(r#"<h4 class="mb-8">Undang-Undang Dasar 1945</h4>"#);
        assert_eq!(r.nama_peraturan.as_deref(), Some("Undang-Undang Dasar 1945"));
        assert_eq!(r.tipe_dokumen, None);
        assert_eq!(r.bentuk, None);
        assert_eq!(r.bentuk_singkat, None);
    }

    #[test]
    fn pdf_needs_two_download_anchors() {
        let none = from_body("<p>nothing</p>");
        assert_eq!(none.file_pdf, None);
        assert!(none.file_peraturan.is_empty());

        let one = from_body(r#"<a class="download-file" href="/fake/path1.pdf">1</a>"#);
        assert_eq!(one.file_pdf, None);
        assert_eq!(one.file_peraturan.len(), 1);

        let two = from_body(
            r#"<a class="download-file" href="/fake/path1.pdf">1</a>
               <a class="download-file" href="/fake/path2.pdf">2</a>"#,
        );
        assert_eq!(
            two.file_pdf.as_deref(),
            Some("https://peraturan.bpk.go.id/fake/path2.pdf")
        );
    }

    #[test]
    fn label_rules_use_containment_and_order() {
        let r = from_body(
            r#"
            <div class="py-4"><div class="fw-bold">Tempat Penetapan</div><div>Jakarta</div></div>
            <div class="py-4"><div class="fw-bold">Tanggal Pengundangan</div><div>2 Maret 2010</div></div>
            <div class="py-4"><div class="fw-bold">Tanggal Berlaku</div><div>belum ditentukan</div></div>
            <div class="py-4"><div class="fw-bold">Bidang Hukum</div><div>  </div></div>
            <div class="py-4"><div class="fw-bold">Subjek</div><div></div></div>
            <div class="py-4"><div class="fw-bold">Sumber</div><div></div></div>
            <div class="py-4"><div class="fw-bold">Catatan</div><div>ignored</div></div>
            <div class="py-4"><div class="fw-bold">Bahasa</div></div>
            "#,
        );
        assert_eq!(r.tempat_penetapan.as_deref(), Some("Jakarta"));
        assert_eq!(r.tanggal_pengundangan.as_deref(), Some("2010-03-02"));
        assert_eq!(r.tanggal_berlaku, None);
        assert_eq!(r.bidang, None);
        assert_eq!(r.subjek, None);
        assert_eq!(r.sumber.as_deref(), Some(""));
        assert_eq!(r.bahasa, None);
    }

    #[test]
    fn rule_table_priority() {
        assert_eq!(match_label("Nomor Tahun").map(|m| m.0), Some(Field::Nomor));
        assert_eq!(
            match_label("Tanggal Penetapan").map(|m| m.1),
            Some(Transform::Date)
        );
        assert_eq!(match_label("judul"), None);
    }

    #[test]
    fn unrelated_markup_is_sparse() {
        let r = from_body("<html><body><div>Halaman tidak ditemukan</div></body></html>");
        assert!(r.is_sparse());
        assert_eq!(r.teu.as_deref(), Some("Indonesia, Pemerintah Pusat"));
    }
}
