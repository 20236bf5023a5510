//! Validation of files handed over by the file picker.
//!
//! The picker itself (and how the `url` is produced) lives outside this
//! crate; it only has to describe each file as a [`PickedFile`].

use uuid::Uuid;

use crate::error::AttachmentError;
use crate::model::{Attachment, AttachmentKind};

const DEFAULT_MAX_SIZE_MB: u64 = 10;

/// A file chosen by the user, as described by the picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedFile {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub url: String,
}

/// Size and type limits for outgoing attachments.
///
/// Allowed type patterns are either MIME types (`application/pdf`), MIME
/// wildcards (`image/*`) or file extensions (`.docx`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPolicy {
    pub max_size_mb: u64,
    pub allowed_types: Vec<String>,
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        Self {
            max_size_mb: DEFAULT_MAX_SIZE_MB,
            allowed_types: default_allowed_types(),
        }
    }
}

pub fn default_allowed_types() -> Vec<String> {
    ["image/*", "application/pdf", ".doc", ".docx"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl AttachmentPolicy {
    fn max_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn check(&self, file: &PickedFile) -> Result<(), AttachmentError> {
        if file.size_bytes > self.max_bytes() {
            return Err(AttachmentError::TooLarge {
                name: file.name.clone(),
                max_mb: self.max_size_mb,
            });
        }
        if !self
            .allowed_types
            .iter()
            .any(|pattern| type_matches(pattern, file))
        {
            return Err(AttachmentError::UnsupportedType {
                name: file.name.clone(),
            });
        }
        Ok(())
    }

    /// Validate a whole batch. One bad file rejects the batch.
    pub fn accept(&self, files: Vec<PickedFile>) -> Result<Vec<Attachment>, AttachmentError> {
        for file in &files {
            self.check(file)?;
        }
        Ok(files.into_iter().map(Attachment::from).collect())
    }
}

fn type_matches(pattern: &str, file: &PickedFile) -> bool {
    if pattern.starts_with('.') {
        return file
            .name
            .to_ascii_lowercase()
            .ends_with(&pattern.to_ascii_lowercase());
    }
    let mime = file.mime_type.to_ascii_lowercase();
    let pattern = pattern.to_ascii_lowercase();
    match pattern.strip_suffix('*') {
        Some(prefix) => mime.starts_with(prefix),
        None => mime == pattern,
    }
}

impl From<PickedFile> for Attachment {
    fn from(file: PickedFile) -> Self {
        let kind = if file.mime_type.starts_with("image/") {
            AttachmentKind::Image
        } else {
            AttachmentKind::Document
        };
        Attachment {
            id: Uuid::new_v4().to_string(),
            kind,
            url: file.url,
            name: file.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, mime: &str, size_bytes: u64) -> PickedFile {
        PickedFile {
            name: name.into(),
            mime_type: mime.into(),
            size_bytes,
            url: format!("file:///tmp/{name}"),
        }
    }

    #[test]
    fn images_and_pdfs_pass() {
        let policy = AttachmentPolicy::default();
        assert!(policy.check(&file("nap.jpg", "image/jpeg", 2048)).is_ok());
        assert!(policy.check(&file("menu.pdf", "application/pdf", 2048)).is_ok());
    }

    #[test]
    fn extension_patterns_ignore_case_and_mime() {
        let policy = AttachmentPolicy::default();
        assert!(policy.check(&file("Form.DOCX", "", 10)).is_ok());
        assert!(policy.check(&file("notes.doc", "application/msword", 10)).is_ok());
    }

    #[test]
    fn rejects_other_types() {
        let policy = AttachmentPolicy::default();
        let err = policy
            .check(&file("run.sh", "application/x-sh", 10))
            .unwrap_err();
        assert_eq!(
            err,
            AttachmentError::UnsupportedType {
                name: "run.sh".into()
            }
        );
    }

    #[test]
    fn rejects_oversized_files() {
        let policy = AttachmentPolicy::default();
        let big = file("video.png", "image/png", 10 * 1024 * 1024 + 1);
        assert!(matches!(
            policy.check(&big),
            Err(AttachmentError::TooLarge { max_mb: 10, .. })
        ));
        let exact = file("edge.png", "image/png", 10 * 1024 * 1024);
        assert!(policy.check(&exact).is_ok());
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let policy = AttachmentPolicy::default();
        let files = vec![
            file("a.png", "image/png", 1),
            file("b.exe", "application/octet-stream", 1),
        ];
        assert!(policy.accept(files).is_err());
    }

    #[test]
    fn kinds_follow_mime_type() {
        let policy = AttachmentPolicy::default();
        let atts = policy
            .accept(vec![
                file("a.png", "image/png", 1),
                file("b.pdf", "application/pdf", 1),
            ])
            .unwrap();
        assert_eq!(atts[0].kind, AttachmentKind::Image);
        assert_eq!(atts[1].kind, AttachmentKind::Document);
        assert_ne!(atts[0].id, atts[1].id);
        assert_eq!(atts[1].url, "file:///tmp/b.pdf");
    }
}
