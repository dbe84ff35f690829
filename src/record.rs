use serde::{Deserialize, Serialize};

/// Enacting body every record from the site belongs to.
pub const DEFAULT_TEU: &str = "Indonesia, Pemerintah Pusat";
/// Jurisdiction every record from the site belongs to.
pub const DEFAULT_LOKASI: &str = "Pemerintah Pusat";

/// A link to a related regulation, always absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationLink {
    pub text: String,
    pub link: String,
}

/// The four relationship lists of one detail page, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relations {
    pub dicabut_dengan: Vec<RelationLink>,
    pub mencabut: Vec<RelationLink>,
    pub diubah_dengan: Vec<RelationLink>,
    pub mengubah: Vec<RelationLink>,
}

/// Normalized regulation detail page.
///
/// Field names are the storage and API contract, so every key is always
/// present: scalars serialize as `null` when empty, lists as `[]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegulationRecord {
    pub nama_peraturan: Option<String>,
    /// Detail-page URL; the natural key used for dedup.
    pub link_peraturan: String,
    pub tipe_dokumen: Option<String>,
    pub materi_pokok: Option<String>,
    pub judul: Option<String>,
    pub teu: Option<String>,
    pub nomor: Option<String>,
    pub bentuk: Option<String>,
    pub bentuk_singkat: Option<String>,
    /// Kept as text: the site occasionally shows non-numeric years.
    pub tahun: Option<String>,
    pub tempat_penetapan: Option<String>,
    pub tanggal_penetapan: Option<String>,
    pub tanggal_pengundangan: Option<String>,
    pub tanggal_berlaku: Option<String>,
    pub sumber: Option<String>,
    pub status: Option<String>,
    pub bahasa: Option<String>,
    pub lokasi: Option<String>,
    pub bidang: Option<String>,
    pub subjek: Option<String>,
    pub dicabut_dengan: Vec<RelationLink>,
    pub mencabut: Vec<RelationLink>,
    pub diubah_dengan: Vec<RelationLink>,
    pub mengubah: Vec<RelationLink>,
    pub ujimateri_mk: Vec<RelationLink>,
    pub file_peraturan: Vec<RelationLink>,
    pub file_pdf: Option<String>,
}

impl RegulationRecord {
    /// Empty record for `source_url`, with the site-wide constants filled in.
    pub fn new(source_url: &str) -> Self {
        Self {
            link_peraturan: source_url.to_string(),
            teu: Some(DEFAULT_TEU.to_string()),
            lokasi: Some(DEFAULT_LOKASI.to_string()),
            ..Default::default()
        }
    }

    pub fn set_relations(&mut self, relations: Relations) {
        self.dicabut_dengan = relations.dicabut_dengan;
        self.mencabut = relations.mencabut;
        self.diubah_dengan = relations.diubah_dengan;
        self.mengubah = relations.mengubah;
    }

    /// Number of fields that were actually read from the page.
    ///
    /// The constants and the source URL are excluded.
    pub fn populated_fields(&self) -> usize {
        let scalars = [
            &self.nama_peraturan,
            &self.tipe_dokumen,
            &self.materi_pokok,
            &self.judul,
            &self.nomor,
            &self.bentuk,
            &self.bentuk_singkat,
            &self.tahun,
            &self.tempat_penetapan,
            &self.tanggal_penetapan,
            &self.tanggal_pengundangan,
            &self.tanggal_berlaku,
            &self.sumber,
            &self.status,
            &self.bahasa,
            &self.bidang,
            &self.subjek,
            &self.file_pdf,
        ];
        let lists = [
            &self.dicabut_dengan,
            &self.mencabut,
            &self.diubah_dengan,
            &self.mengubah,
            &self.file_peraturan,
        ];
        scalars
            .iter()
            .filter(|v| v.as_deref().is_some_and(|s| !s.is_empty()))
            .count()
            + lists.iter().filter(|l| !l.is_empty()).count()
    }

    /// True when nothing was extracted, which usually means the page markup
    /// no longer matches the selectors.
    pub fn is_sparse(&self) -> bool {
        self.populated_fields() == 0
    }
}
