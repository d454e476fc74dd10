//! Conversion of uploaded files into provider-ready binary parts.

use std::path::Path;

use bytes::Bytes;
use tracing::debug;

use crate::error::ChatError;
use crate::mime::resolve_mime;

/// Binary payload plus its content type, as sent inline to the provider.
///
/// The buffer is reference counted, so cloning a part into every outbound
/// request does not copy the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPart {
    data: Bytes,
    mime_type: String,
}

impl AttachmentPart {
    pub fn new(data: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        Self { data: data.into(), mime_type: mime_type.into() }
    }

    /// Build a part from in-memory bytes, resolving the type from `name`.
    pub fn from_bytes(name: &str, data: impl Into<Bytes>) -> Self {
        Self::new(data, resolve_mime(name))
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Read the whole file at `path` and wrap it as an [`AttachmentPart`].
pub async fn file_to_part(path: impl AsRef<Path>) -> Result<AttachmentPart, ChatError> {
    let path = path.as_ref();
    let data = tokio::fs::read(path).await?;
    let mime_type = resolve_mime(path);
    debug!(path = %path.display(), mime = %mime_type, size_bytes = data.len(), "file converted to part");
    Ok(AttachmentPart::new(data, mime_type))
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn reads_bytes_and_resolves_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        tokio::fs::write(&path, b"# title").await.unwrap();

        let part = file_to_part(&path).await.expect("part");
        assert_eq!(part.mime_type(), "text/markdown");
        assert_eq!(part.data().as_ref(), b"# title");
        assert_eq!(part.len(), 7);
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = file_to_part(dir.path().join("absent.pdf")).await.unwrap_err();
        assert!(matches!(err, ChatError::Io(_)));
    }

    #[test]
    fn clone_shares_buffer() {
        let part = AttachmentPart::from_bytes("a.png", vec![1u8, 2, 3]);
        let copy = part.clone();
        assert_eq!(part.data().as_ptr(), copy.data().as_ptr());
        assert_eq!(copy.mime_type(), "image/png");
    }
}
