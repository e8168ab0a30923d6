//! Score container loading
//!
//! A MuseScore score arrives either as a plain `.mscx` XML document or as a
//! `.mscz` zip archive holding one. The container kind is sniffed from the
//! leading bytes rather than trusted from the file extension.

use std::io::{Cursor, Read};
use std::path::Path;
use thiserror::Error;
use zip::ZipArchive;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const ZIP_LOCAL_HEADER: &[u8] = b"PK\x03\x04";
const ZIP_EMPTY_ARCHIVE: &[u8] = b"PK\x05\x06";

/// Native extension of uncompressed score members
pub const SCORE_MEMBER_EXTENSION: &str = ".mscx";

/// Failures while acquiring the score text
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {what}: {source}")]
    Io {
        what: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid score archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("archive contains no score member")]
    NoScoreMember,

    #[error("'{0}' is not valid UTF-8")]
    Encoding(String),
}

/// Score text plus where it came from
#[derive(Debug, Clone)]
pub struct ScoreSource {
    /// Archive member the text was read from, `None` for plain documents
    pub member: Option<String>,
    pub xml: String,
}

/// Read a score container from disk
pub fn load_path(path: &Path) -> Result<ScoreSource, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        what: path.display().to_string(),
        source,
    })?;
    log::debug!("Loaded {} ({} bytes)", path.display(), bytes.len());
    load_bytes(&bytes)
}

/// Decode an in-memory score container
pub fn load_bytes(bytes: &[u8]) -> Result<ScoreSource, LoadError> {
    if is_archive(bytes) {
        read_archive(bytes)
    } else {
        Ok(ScoreSource {
            member: None,
            xml: decode_text(bytes, "score document")?,
        })
    }
}

/// True when the bytes start with a zip signature
pub fn is_archive(bytes: &[u8]) -> bool {
    bytes.starts_with(ZIP_LOCAL_HEADER) || bytes.starts_with(ZIP_EMPTY_ARCHIVE)
}

/// Pick the score member from archive member names (archive order)
///
/// Preference: first `.mscx` member, then the first extensionless
/// non-directory member, then simply the first member.
pub fn select_score_member<S: AsRef<str>>(names: &[S]) -> Option<usize> {
    names
        .iter()
        .position(|n| n.as_ref().ends_with(SCORE_MEMBER_EXTENSION))
        .or_else(|| {
            names.iter().position(|n| {
                let n = n.as_ref();
                !n.contains('.') && !n.ends_with('/')
            })
        })
        .or(if names.is_empty() { None } else { Some(0) })
}

fn read_archive(bytes: &[u8]) -> Result<ScoreSource, LoadError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let mut names = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        names.push(archive.by_index_raw(i)?.name().to_string());
    }

    let index = select_score_member(&names).ok_or(LoadError::NoScoreMember)?;
    let member = names[index].clone();
    log::debug!("Reading {} from archive ({} members)", member, names.len());

    let mut file = archive.by_index(index)?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents).map_err(|source| LoadError::Io {
        what: format!("archive member {}", member),
        source,
    })?;

    let xml = decode_text(&contents, &member)?;
    Ok(ScoreSource {
        member: Some(member),
        xml,
    })
}

fn decode_text(bytes: &[u8], what: &str) -> Result<String, LoadError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    String::from_utf8(bytes.to_vec()).map_err(|_| LoadError::Encoding(what.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_prefers_mscx_member() {
        let names = ["META-INF/container.xml", "Thumbnails/", "score", "score.mscx"];
        assert_eq!(select_score_member(&names), Some(3));
    }

    #[test]
    fn test_select_extensionless_member() {
        let names = ["META-INF/", "META-INF/container.xml", "score"];
        assert_eq!(select_score_member(&names), Some(2));
    }

    #[test]
    fn test_select_skips_directories() {
        let names = ["Thumbnails/", "thumbnail.png"];
        assert_eq!(select_score_member(&names), Some(0));

        let names = ["Thumbnails/", "notes", "thumbnail.png"];
        assert_eq!(select_score_member(&names), Some(1));
    }

    #[test]
    fn test_select_empty_archive() {
        let names: [&str; 0] = [];
        assert_eq!(select_score_member(&names), None);
    }

    #[test]
    fn test_plain_document_strips_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"<museScore/>");

        let source = load_bytes(&bytes).expect("plain document should load");
        assert_eq!(source.member, None);
        assert_eq!(source.xml, "<museScore/>");
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let result = load_bytes(b"<museScore>\xff\xfe</museScore>");
        assert!(matches!(result, Err(LoadError::Encoding(_))));
    }

    #[test]
    fn test_archive_sniffing() {
        assert!(is_archive(b"PK\x03\x04rest"));
        assert!(is_archive(b"PK\x05\x06"));
        assert!(!is_archive(b"<?xml version=\"1.0\"?>"));
    }
}
