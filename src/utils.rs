use crate::config::DecodePolicy;
use std::path::{Component, Path, PathBuf};
use tokio::fs as async_fs;
use tokio::io::AsyncReadExt;

/// Joins `path` onto `base` when relative and lexically drops `.` and `..`
/// segments. Symlinks are not resolved.
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() && !normalized.has_root() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Absolute, lexically normalized form of a configured directory. Relative
/// paths are taken against the current directory.
pub fn absolute_dir(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    absolutize(&absolute, Path::new(""))
}

pub async fn read_file_bytes(path: &Path) -> std::io::Result<Vec<u8>> {
    async_fs::read(path).await
}

/// Reads at most `limit` bytes. The flag tells whether the file has more.
pub async fn read_file_prefix(path: &Path, limit: usize) -> std::io::Result<(Vec<u8>, bool)> {
    let file = async_fs::File::open(path).await?;
    let mut bytes = Vec::new();
    file.take((limit as u64).saturating_add(1)).read_to_end(&mut bytes).await?;
    let more = bytes.len() > limit;
    bytes.truncate(limit);
    Ok((bytes, more))
}

/// Decodes UTF-8, never failing: invalid sequences are dropped or replaced.
pub fn decode_text(bytes: &[u8], policy: DecodePolicy) -> String {
    match policy {
        DecodePolicy::Replace => String::from_utf8_lossy(bytes).into_owned(),
        DecodePolicy::Ignore => {
            let mut out = String::with_capacity(bytes.len());
            let mut rest = bytes;
            loop {
                match std::str::from_utf8(rest) {
                    Ok(valid) => {
                        out.push_str(valid);
                        break;
                    }
                    Err(e) => {
                        let (valid, after) = rest.split_at(e.valid_up_to());
                        // valid_up_to guarantees this prefix is UTF-8.
                        out.push_str(&String::from_utf8_lossy(valid));
                        match e.error_len() {
                            Some(len) => rest = &after[len..],
                            // Truncated sequence at the end of input.
                            None => break,
                        }
                    }
                }
            }
            out
        }
    }
}

/// Truncates to at most `max_chars` characters.
pub fn truncate_chars(text: &mut String, max_chars: usize) {
    if let Some((idx, _)) = text.char_indices().nth(max_chars) {
        text.truncate(idx);
    }
}

pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    for unit in UNITS {
        if size < 1024.0 {
            return format!("{:.0} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1} PB", size)
}
