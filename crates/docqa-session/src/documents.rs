//! Loading documents from disk.

use std::path::Path;

use docqa_core::{Document, Error, ErrorKind, Result};

use crate::TRACING_TARGET;

/// Reads the file at `path` into a [`Document`] named after its file name.
pub async fn read_document(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            Error::validation()
                .with_message("Document path has no file name")
                .with_context(path.display().to_string())
        })?;

    let bytes = tokio::fs::read(path).await.map_err(|e| {
        Error::from_source(ErrorKind::Validation, e)
            .with_message("Could not read document")
            .with_context(path.display().to_string())
    })?;

    tracing::debug!(
        target: TRACING_TARGET,
        path = %path.display(),
        size = bytes.len(),
        "Document read"
    );

    Ok(Document::new(file_name, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.pdf");
        tokio::fs::write(&path, b"%PDF-1.7 body").await.unwrap();

        let document = read_document(&path).await.unwrap();
        assert_eq!(document.file_name, "paper.pdf");
        assert_eq!(document.len(), 13);
    }

    #[tokio::test]
    async fn test_missing_file_is_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let error = read_document(dir.path().join("missing.pdf"))
            .await
            .unwrap_err();
        assert_eq!(error.kind, ErrorKind::Validation);
        assert!(error.context.as_deref().unwrap().ends_with("missing.pdf"));
    }

    #[tokio::test]
    async fn test_path_without_file_name() {
        let error = read_document("/").await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Validation);
    }
}
