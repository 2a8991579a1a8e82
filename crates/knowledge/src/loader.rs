//! Document loading and text extraction.
//!
//! Plain text files load as a single document. PDFs load as one document per
//! page, with a zero-based `page` number in the metadata.

use crate::types::{Document, FileType, Metadata};
use ragbot_core::{AppError, AppResult};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Load a document from disk using the loader for its file type.
pub async fn load_document(path: &Path, file_type: FileType) -> AppResult<Vec<Document>> {
    tracing::debug!("Loading {:?} as {}", path, file_type.as_str());

    let documents = match file_type {
        FileType::Txt => load_text(path).await?,
        FileType::Pdf => load_pdf(path).await?,
    };

    tracing::debug!("Loaded {} document(s) from {:?}", documents.len(), path);
    Ok(documents)
}

/// Whether any loaded document carries non-whitespace text.
pub fn has_text(documents: &[Document]) -> bool {
    documents
        .iter()
        .any(|doc| !doc.page_content.trim().is_empty())
}

async fn load_text(path: &Path) -> AppResult<Vec<Document>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::Loader(format!("Failed to read {}: {}", path.display(), e)))?;

    Ok(vec![Document::new(text, source_metadata(path))])
}

async fn load_pdf(path: &Path) -> AppResult<Vec<Document>> {
    let owned: PathBuf = path.to_path_buf();

    // Extraction is CPU-bound and the parser can panic on malformed input
    let pages = tokio::task::spawn_blocking(move || pdf_extract::extract_text_by_pages(&owned))
        .await
        .map_err(|e| {
            AppError::Loader(format!("PDF extraction aborted for {}: {}", path.display(), e))
        })?
        .map_err(|e| {
            AppError::Loader(format!("Failed to extract text from {}: {}", path.display(), e))
        })?;

    let documents = pages
        .into_iter()
        .enumerate()
        .map(|(page, text)| {
            let mut metadata = source_metadata(path);
            metadata.insert("page".to_string(), Value::from(page));
            Document::new(text, metadata)
        })
        .collect();

    Ok(documents)
}

fn source_metadata(path: &Path) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert(
        "source".to_string(),
        Value::from(path.to_string_lossy().into_owned()),
    );
    metadata
}

/// Minimal PDF with one Helvetica text line per page.
#[cfg(test)]
pub(crate) fn pdf_bytes(pages: &[&str]) -> Vec<u8> {
    let page_count = pages.len();
    let mut objects: Vec<String> = Vec::new();

    let kids = (0..page_count)
        .map(|i| format!("{} 0 R", 4 + 2 * i))
        .collect::<Vec<_>>()
        .join(" ");
    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids, page_count
    ));
    objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string());

    for (i, text) in pages.iter().enumerate() {
        let content = format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", text);
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
            5 + 2 * i
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ));
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
    }

    let xref_offset = out.len();
    out.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for offset in offsets {
        out.push_str(&format!("{:010} 00000 n \n", offset));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    ));
    out.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_text_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.txt");
        std::fs::write(&path, "Rust has ownership.\nBorrowing is checked.").unwrap();

        let docs = load_document(&path, FileType::Txt).await.unwrap();

        assert_eq!(docs.len(), 1);
        assert!(docs[0].page_content.contains("Borrowing"));
        assert_eq!(
            docs[0].metadata["source"],
            Value::from(path.to_string_lossy().into_owned())
        );
        assert!(docs[0].metadata.get("page").is_none());
    }

    #[tokio::test]
    async fn test_missing_file_is_loader_error() {
        let temp = TempDir::new().unwrap();
        let err = load_document(&temp.path().join("absent.txt"), FileType::Txt)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Loader(_)));
    }

    #[tokio::test]
    async fn test_invalid_utf8_text_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("binary.txt");
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0xc3]).unwrap();

        assert!(load_document(&path, FileType::Txt).await.is_err());
    }

    #[tokio::test]
    async fn test_load_pdf_one_document_per_page() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("guide.pdf");
        std::fs::write(&path, pdf_bytes(&["Ownership rules", "Lifetimes explained"])).unwrap();

        let docs = load_document(&path, FileType::Pdf).await.unwrap();

        assert_eq!(docs.len(), 2);
        assert!(docs[0].page_content.contains("Ownership"));
        assert!(docs[1].page_content.contains("Lifetimes"));
        let source = Value::from(path.to_string_lossy().into_owned());
        for (i, doc) in docs.iter().enumerate() {
            assert_eq!(doc.metadata["page"], Value::from(i));
            assert_eq!(doc.metadata["source"], source);
        }
    }

    #[tokio::test]
    async fn test_malformed_pdf_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.pdf");
        std::fs::write(&path, "this is not a pdf").unwrap();

        assert!(load_document(&path, FileType::Pdf).await.is_err());
    }

    #[test]
    fn test_has_text() {
        let empty = vec![Document::new("  \n\t", Metadata::new())];
        assert!(!has_text(&empty));
        assert!(!has_text(&[]));

        let full = vec![Document::new("content", Metadata::new())];
        assert!(has_text(&full));
    }
}
