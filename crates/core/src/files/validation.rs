//! File validation: type detection, magic bytes, size caps, filename safety.

use regex::Regex;
use std::sync::OnceLock;

use super::files_model::FileError;
use crate::errors::Result;

const MIB: u64 = 1024 * 1024;

/// Extension → canonical type tag.
pub fn detect_file_type(filename: &str) -> Result<&'static str> {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => Ok("pdf"),
        "step" | "stp" => Ok("step"),
        "nc" | "gcode" => Ok("nc"),
        "xlsx" => Ok("xlsx"),
        other => Err(FileError::UnsupportedType(other.to_string()).into()),
    }
}

pub fn mime_type_for(file_type: &str) -> &'static str {
    match file_type {
        "pdf" => "application/pdf",
        "step" => "application/step",
        "nc" => "text/plain",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}

/// Magic-byte prefixes. Required for pdf and step; other types are not
/// magic-checked.
fn magic_bytes_for(file_type: &str) -> Option<&'static [u8]> {
    match file_type {
        "pdf" => Some(b"%PDF"),
        "step" => Some(b"ISO-10303"),
        _ => None,
    }
}

pub fn validate_magic_bytes(content: &[u8], file_type: &str) -> Result<()> {
    if let Some(magic) = magic_bytes_for(file_type) {
        if !content.starts_with(magic) {
            return Err(FileError::MagicBytesMismatch(file_type.to_uppercase()).into());
        }
    }
    Ok(())
}

pub fn max_size_for(file_type: &str) -> u64 {
    match file_type {
        "pdf" => 10 * MIB,
        "step" => 100 * MIB,
        _ => 50 * MIB,
    }
}

pub fn validate_size(size: u64, file_type: &str) -> Result<()> {
    if size == 0 {
        return Err(FileError::EmptyFile.into());
    }
    let max = max_size_for(file_type);
    if size > max {
        return Err(FileError::FileTooLarge {
            file_type: file_type.to_string(),
            max_mb: max / MIB,
        }
        .into());
    }
    Ok(())
}

fn safe_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.\- ]+$").unwrap())
}

/// Rejects empty names, path traversal (`..`, `/`, `\`) and anything outside
/// the safe character set.
pub fn sanitize_filename(filename: &str) -> Result<String> {
    if filename.is_empty() {
        return Err(FileError::InvalidFilename("filename is required".to_string()).into());
    }

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        return Err(
            FileError::InvalidFilename("path traversal blocked".to_string()).into(),
        );
    }

    if !safe_name_pattern().is_match(filename) {
        return Err(
            FileError::InvalidFilename("contains unsafe characters".to_string()).into(),
        );
    }

    Ok(filename.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;

    #[test]
    fn test_detect_file_type() {
        assert_eq!(detect_file_type("drawing.PDF").unwrap(), "pdf");
        assert_eq!(detect_file_type("model.stp").unwrap(), "step");
        assert_eq!(detect_file_type("prog.gcode").unwrap(), "nc");
        assert!(matches!(
            detect_file_type("virus.exe"),
            Err(Error::File(FileError::UnsupportedType(_)))
        ));
        assert!(detect_file_type("no_extension").is_err());
    }

    #[test]
    fn test_magic_bytes() {
        assert!(validate_magic_bytes(b"%PDF-1.7 rest", "pdf").is_ok());
        assert!(matches!(
            validate_magic_bytes(b"<html>not a pdf</html>", "pdf"),
            Err(Error::File(FileError::MagicBytesMismatch(_)))
        ));
        assert!(validate_magic_bytes(b"ISO-10303-21;", "step").is_ok());
        assert!(validate_magic_bytes(b"whatever", "nc").is_ok());
    }

    #[test]
    fn test_size_caps() {
        assert!(matches!(
            validate_size(0, "pdf"),
            Err(Error::File(FileError::EmptyFile))
        ));
        assert!(validate_size(5 * MIB, "pdf").is_ok());
        assert!(matches!(
            validate_size(11 * MIB, "pdf"),
            Err(Error::File(FileError::FileTooLarge { .. }))
        ));
        // step allows much larger blobs
        assert!(validate_size(60 * MIB, "step").is_ok());
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("rev_A.pdf").unwrap(), "rev_A.pdf");
        assert_eq!(
            sanitize_filename("part drawing-2.pdf").unwrap(),
            "part drawing-2.pdf"
        );
        assert!(sanitize_filename("").is_err());
        assert!(sanitize_filename("../etc/passwd").is_err());
        assert!(sanitize_filename("a/b.pdf").is_err());
        assert!(sanitize_filename("a\\b.pdf").is_err());
        assert!(sanitize_filename("příliš.pdf").is_err());
    }
}
