//! The reply being written: free text plus local files waiting for upload.

use super::ClientError;
use crate::connectors::storage;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct LocalFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub async fn read(path: &Path) -> Result<Self, ClientError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| ClientError::Validation(format!("{}: {}", path.display(), err)))?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        let content_type = mime_for(&name).to_string();
        Ok(Self::new(name, content_type, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// MIME type by file extension, `application/octet-stream` when unknown.
pub fn mime_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "txt" => "text/plain",
        "csv" => "text/csv",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    pub text: String,
    pub files: Vec<LocalFile>,
}

impl Draft {
    /// Nothing to send: blank text and no files.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty() && self.files.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct Composer {
    draft: Draft,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.draft.text = text.into();
    }

    /// Attach a file if the bucket would accept it.
    pub fn add_file(&mut self, file: LocalFile) -> Result<(), ClientError> {
        storage::validate_file(file.size(), &file.content_type)?;
        self.draft.files.push(file);
        Ok(())
    }

    /// Drop file `index`; the others keep their order.
    pub fn remove_file(&mut self, index: usize) -> Option<LocalFile> {
        (index < self.draft.files.len()).then(|| self.draft.files.remove(index))
    }

    pub fn can_send(&self) -> bool {
        !self.draft.is_blank()
    }

    /// Hand the draft over for sending and start a fresh one.
    pub fn take(&mut self) -> Draft {
        std::mem::take(&mut self.draft)
    }

    /// Put a draft back after a failed send.
    pub fn restore(&mut self, draft: Draft) {
        self.draft = draft;
    }
}
