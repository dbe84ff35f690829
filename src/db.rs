use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row};

use crate::record::{RegulationRecord, RelationLink};

pub fn connect(path: &str) -> Result<Connection> {
    if let Some(dir) = Path::new(path).parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS regulation (
            id                   INTEGER PRIMARY KEY,
            link_peraturan       TEXT UNIQUE NOT NULL,
            nama_peraturan       TEXT,
            tipe_dokumen         TEXT,
            materi_pokok         TEXT,
            judul                TEXT,
            teu                  TEXT,
            nomor                TEXT,
            bentuk               TEXT,
            bentuk_singkat       TEXT,
            tahun                TEXT,
            tempat_penetapan     TEXT,
            tanggal_penetapan    TEXT,
            tanggal_pengundangan TEXT,
            tanggal_berlaku      TEXT,
            sumber               TEXT,
            status               TEXT,
            bahasa               TEXT,
            lokasi               TEXT,
            bidang               TEXT,
            subjek               TEXT,
            dicabut_dengan       TEXT NOT NULL DEFAULT '[]',
            mencabut             TEXT NOT NULL DEFAULT '[]',
            diubah_dengan        TEXT NOT NULL DEFAULT '[]',
            mengubah             TEXT NOT NULL DEFAULT '[]',
            ujimateri_mk         TEXT NOT NULL DEFAULT '[]',
            file_peraturan       TEXT NOT NULL DEFAULT '[]',
            file_pdf             TEXT,
            scraped_at           TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_regulation_status ON regulation(status);
        CREATE INDEX IF NOT EXISTS idx_regulation_tahun ON regulation(tahun);
        ",
    )?;
    Ok(())
}

pub fn contains(conn: &Connection, link: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM regulation WHERE link_peraturan = ?1",
            [link],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Store a record unless one with the same `link_peraturan` exists.
/// Returns whether a row was written.
pub fn insert_regulation(conn: &Connection, r: &RegulationRecord) -> Result<bool> {
    let n = conn.execute(
        "INSERT OR IGNORE INTO regulation
         (link_peraturan, nama_peraturan, tipe_dokumen, materi_pokok, judul, teu, nomor,
          bentuk, bentuk_singkat, tahun, tempat_penetapan, tanggal_penetapan,
          tanggal_pengundangan, tanggal_berlaku, sumber, status, bahasa, lokasi, bidang,
          subjek, dicabut_dengan, mencabut, diubah_dengan, mengubah, ujimateri_mk,
          file_peraturan, file_pdf, scraped_at)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,?20,
                 ?21,?22,?23,?24,?25,?26,?27,?28)",
        rusqlite::params![
            r.link_peraturan, r.nama_peraturan, r.tipe_dokumen, r.materi_pokok, r.judul,
            r.teu, r.nomor, r.bentuk, r.bentuk_singkat, r.tahun, r.tempat_penetapan,
            r.tanggal_penetapan, r.tanggal_pengundangan, r.tanggal_berlaku, r.sumber,
            r.status, r.bahasa, r.lokasi, r.bidang, r.subjek,
            serde_json::to_string(&r.dicabut_dengan)?,
            serde_json::to_string(&r.mencabut)?,
            serde_json::to_string(&r.diubah_dengan)?,
            serde_json::to_string(&r.mengubah)?,
            serde_json::to_string(&r.ujimateri_mk)?,
            serde_json::to_string(&r.file_peraturan)?,
            r.file_pdf,
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(n > 0)
}

pub fn fetch_by_link(conn: &Connection, link: &str) -> Result<Option<RegulationRecord>> {
    let row = conn
        .query_row(
            "SELECT link_peraturan, nama_peraturan, tipe_dokumen, materi_pokok, judul, teu,
                    nomor, bentuk, bentuk_singkat, tahun, tempat_penetapan, tanggal_penetapan,
                    tanggal_pengundangan, tanggal_berlaku, sumber, status, bahasa, lokasi,
                    bidang, subjek, dicabut_dengan, mencabut, diubah_dengan, mengubah,
                    ujimateri_mk, file_peraturan, file_pdf
             FROM regulation WHERE link_peraturan = ?1",
            [link],
            read_row,
        )
        .optional()?;
    row.transpose()
}

type RawRow = (RegulationRecord, [String; 6]);

fn read_row(row: &Row<'_>) -> rusqlite::Result<Result<RegulationRecord>> {
    let raw: RawRow = (
        RegulationRecord {
            link_peraturan: row.get(0)?,
            nama_peraturan: row.get(1)?,
            tipe_dokumen: row.get(2)?,
            materi_pokok: row.get(3)?,
            judul: row.get(4)?,
            teu: row.get(5)?,
            nomor: row.get(6)?,
            bentuk: row.get(7)?,
            bentuk_singkat: row.get(8)?,
            tahun: row.get(9)?,
            tempat_penetapan: row.get(10)?,
            tanggal_penetapan: row.get(11)?,
            tanggal_pengundangan: row.get(12)?,
            tanggal_berlaku: row.get(13)?,
            sumber: row.get(14)?,
            status: row.get(15)?,
            bahasa: row.get(16)?,
            lokasi: row.get(17)?,
            bidang: row.get(18)?,
            subjek: row.get(19)?,
            file_pdf: row.get(26)?,
            ..Default::default()
        },
        [
            row.get(20)?,
            row.get(21)?,
            row.get(22)?,
            row.get(23)?,
            row.get(24)?,
            row.get(25)?,
        ],
    );
    Ok(decode_lists(raw))
}

fn decode_lists((mut r, lists): RawRow) -> Result<RegulationRecord> {
    let decode = |s: &str| -> Result<Vec<RelationLink>> {
        serde_json::from_str(s).context("Malformed relation column")
    };
    r.dicabut_dengan = decode(&lists[0])?;
    r.mencabut = decode(&lists[1])?;
    r.diubah_dengan = decode(&lists[2])?;
    r.mengubah = decode(&lists[3])?;
    r.ujimateri_mk = decode(&lists[4])?;
    r.file_peraturan = decode(&lists[5])?;
    Ok(r)
}

// ── PDF downloads ──

pub struct PdfTarget {
    pub id: i64,
    pub link_peraturan: String,
    pub file_pdf: String,
}

/// Stored regulations that carry a PDF link, oldest first.
pub fn fetch_pdf_targets(conn: &Connection, limit: Option<usize>) -> Result<Vec<PdfTarget>> {
    let sql = format!(
        "SELECT id, link_peraturan, file_pdf FROM regulation
         WHERE file_pdf IS NOT NULL AND file_pdf != ''
         ORDER BY id{}",
        match limit {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(PdfTarget {
                id: row.get(0)?,
                link_peraturan: row.get(1)?,
                file_pdf: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub total: usize,
    pub with_pdf: usize,
    pub with_relations: usize,
    pub by_status: Vec<(String, usize)>,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let total: usize = conn.query_row("SELECT COUNT(*) FROM regulation", [], |r| r.get(0))?;
    let with_pdf: usize = conn.query_row(
        "SELECT COUNT(*) FROM regulation WHERE file_pdf IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let with_relations: usize = conn.query_row(
        "SELECT COUNT(*) FROM regulation
         WHERE dicabut_dengan != '[]' OR mencabut != '[]'
            OR diubah_dengan != '[]' OR mengubah != '[]'",
        [],
        |r| r.get(0),
    )?;
    let mut stmt = conn.prepare(
        "SELECT COALESCE(NULLIF(status, ''), '(none)'), COUNT(*)
         FROM regulation GROUP BY 1 ORDER BY 2 DESC, 1",
    )?;
    let by_status = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Stats {
        total,
        with_pdf,
        with_relations,
        by_status,
    })
}
