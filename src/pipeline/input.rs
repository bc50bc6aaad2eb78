//! Input validation: make sure the staged file is a readable PDF.
//!
//! pdfium reports a bare "format error" for anything it cannot parse. Checking
//! existence, read permission and the `%PDF` magic bytes first gives callers a
//! specific document-open error instead.

use crate::error::SplitError;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Readers tolerate junk before the header as long as `%PDF-` shows up
/// within the first kilobyte.
const HEADER_WINDOW: usize = 1024;

/// Validate that `path` exists, is readable and carries a `%PDF-` header
/// within its first [`HEADER_WINDOW`] bytes.
pub fn validate_pdf(path: &Path) -> Result<(), SplitError> {
    if !path.exists() {
        return Err(SplitError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut head = Vec::with_capacity(HEADER_WINDOW);
    match std::fs::File::open(path) {
        Ok(f) => {
            if let Err(e) = f.take(HEADER_WINDOW as u64).read_to_end(&mut head) {
                return Err(SplitError::CorruptPdf {
                    path: path.to_path_buf(),
                    detail: format!("cannot read header: {e}"),
                });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(SplitError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(SplitError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    if head.len() < 4 {
        return Err(SplitError::CorruptPdf {
            path: path.to_path_buf(),
            detail: "file is shorter than a PDF header".into(),
        });
    }
    if !has_pdf_header(&head) {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&head[..4]);
        return Err(SplitError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }

    debug!("Validated input PDF: {}", path.display());
    Ok(())
}

/// Reject uploads over `max_bytes`.
pub fn check_size(size: u64, max_bytes: u64) -> Result<(), SplitError> {
    if size > max_bytes {
        return Err(SplitError::InputTooLarge {
            size,
            max: max_bytes,
        });
    }
    Ok(())
}

/// True for a `.pdf` file name, case-insensitively.
pub fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

fn has_pdf_header(head: &[u8]) -> bool {
    head.windows(5).any(|w| w == b"%PDF-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_pdf(&dir.path().join("missing.pdf")).unwrap_err();
        assert!(matches!(err, SplitError::FileNotFound { .. }));
        assert!(err.is_document_open_error());
    }

    #[test]
    fn test_not_a_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, b"PK\x03\x04zip").unwrap();
        match validate_pdf(&path).unwrap_err() {
            SplitError::NotAPdf { magic, .. } => assert_eq!(&magic, b"PK\x03\x04"),
            other => panic!("expected NotAPdf, got {other:?}"),
        }
    }

    #[test]
    fn test_too_short() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.pdf");
        std::fs::write(&path, b"%P").unwrap();
        assert!(matches!(
            validate_pdf(&path).unwrap_err(),
            SplitError::CorruptPdf { .. }
        ));
    }

    #[test]
    fn test_pdf_magic_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.pdf");
        std::fs::write(&path, b"%PDF-1.7\n").unwrap();
        assert!(validate_pdf(&path).is_ok());
    }

    #[test]
    fn test_header_after_leading_junk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefixed.pdf");
        let mut bytes = vec![b'\n'; 300];
        bytes.extend_from_slice(b"%PDF-1.4\n");
        std::fs::write(&path, &bytes).unwrap();
        assert!(validate_pdf(&path).is_ok());
    }

    #[test]
    fn test_header_past_first_kilobyte() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.pdf");
        let mut bytes = vec![b'x'; HEADER_WINDOW];
        bytes.extend_from_slice(b"%PDF-1.4\n");
        std::fs::write(&path, &bytes).unwrap();
        match validate_pdf(&path).unwrap_err() {
            SplitError::NotAPdf { magic, .. } => assert_eq!(&magic, b"xxxx"),
            other => panic!("expected NotAPdf, got {other:?}"),
        }
    }

    #[test]
    fn test_check_size() {
        assert!(check_size(20, 20).is_ok());
        assert!(matches!(
            check_size(21, 20).unwrap_err(),
            SplitError::InputTooLarge { size: 21, max: 20 }
        ));
    }

    #[test]
    fn test_has_pdf_extension() {
        assert!(has_pdf_extension(Path::new("a/b/Scan.PDF")));
        assert!(has_pdf_extension(Path::new("x.pdf")));
        assert!(!has_pdf_extension(Path::new("x.pdf.zip")));
        assert!(!has_pdf_extension(Path::new("noext")));
    }
}
