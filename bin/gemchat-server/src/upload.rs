//! Upload persistence.
//!
//! Files land in `{root}/{session}_{sanitized name}` so a session's uploads
//! can be found again and removed when the conversation is cleared.

use std::io;
use std::path::{Path, PathBuf};

use gemchat_core::SessionId;
use tracing::{debug, warn};

const FALLBACK_NAME: &str = "upload";

/// Reduce a client-supplied file name to a safe, flat name.
///
/// Common Latin accents are folded to their ASCII base letter. Each run of
/// path separators and whitespace becomes a single `_`, anything else outside
/// ASCII alphanumerics and `._-` is dropped, and dots or underscores are
/// trimmed from both ends so the result can never escape the upload
/// directory or be hidden.
pub fn sanitize_filename(name: &str) -> String {
    let mut mapped = String::with_capacity(name.len());
    let mut in_gap = false;
    for c in name.chars() {
        if c == '/' || c == '\\' || c.is_whitespace() {
            if !in_gap {
                mapped.push('_');
                in_gap = true;
            }
            continue;
        }
        in_gap = false;
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            mapped.push(c);
        } else if let Some(folded) = fold_accent(c) {
            mapped.push_str(folded);
        }
    }

    let trimmed = mapped.trim_matches(['.', '_']);
    if trimmed.is_empty() {
        FALLBACK_NAME.to_owned()
    } else {
        trimmed.to_owned()
    }
}

/// ASCII spelling of an accented Latin letter.
fn fold_accent(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => "A",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'È' | 'É' | 'Ê' | 'Ë' => "E",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'Ì' | 'Í' | 'Î' | 'Ï' => "I",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => "o",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => "O",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'Ù' | 'Ú' | 'Û' | 'Ü' => "U",
        'ý' | 'ÿ' => "y",
        'Ý' => "Y",
        'ñ' => "n",
        'Ñ' => "N",
        'ç' => "c",
        'Ç' => "C",
        'ß' => "ss",
        'æ' => "ae",
        'Æ' => "AE",
        _ => return None,
    };
    Some(folded)
}

/// The directory uploaded files are written to.
#[derive(Debug, Clone)]
pub struct UploadDir {
    root: PathBuf,
}

impl UploadDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the directory (and parents) if it does not exist yet.
    pub async fn ensure(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    fn session_prefix(session: &SessionId) -> String {
        format!("{session}_")
    }

    pub fn path_for(&self, session: &SessionId, sanitized: &str) -> PathBuf {
        self.root.join(format!("{}{sanitized}", Self::session_prefix(session)))
    }

    /// Write `data` for `session` under the already sanitized `name`.
    ///
    /// A second upload with the same name in the same session overwrites the
    /// file on disk.
    pub async fn save(&self, session: &SessionId, name: &str, data: &[u8]) -> io::Result<PathBuf> {
        let path = self.path_for(session, name);
        tokio::fs::write(&path, data).await?;
        debug!(session = %session, file = %name, bytes = data.len(), "upload saved");
        Ok(path)
    }

    /// Delete every file belonging to `session`. Returns how many were removed.
    pub async fn purge_session(&self, session: &SessionId) -> io::Result<usize> {
        let prefix = Self::session_prefix(session);
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let matches = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(&prefix));
            if !matches {
                continue;
            }
            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = %entry.path().display(), error = %e, "failed to remove upload"),
            }
        }
        Ok(removed)
    }
}
