use sha2::{Digest, Sha256};
use crate::file::FileDescriptor;

/// Object key for `file` under `directory`:
/// `[directory/][path/]name-hash.ext`.
///
/// `directory` is expected to be normalized already (see
/// [`normalize_directory`](crate::config::normalize_directory)). Upload and the
/// public URL lookup both call this with the same file state.
pub fn object_key(directory: &str, file: &FileDescriptor) -> String {
    let prefix = match file.sub_path() {
        Some(path) => format!("{}/", path),
        None => String::new(),
    };
    let filename = format!("{}{}-{}{}", prefix, file.name, file.hash, file.ext);

    if directory.is_empty() {
        return filename;
    }

    let key = format!("{}/{}", directory, filename);
    match key.strip_prefix('/') {
        Some(stripped) => stripped.to_string(),
        None => key,
    }
}

/// Hex SHA-256 of `data`.
pub fn content_hash(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Next version token for a file: hex SHA-256 of its current hash.
pub fn digest_hash(previous: &str) -> String {
    content_hash(previous.as_bytes())
}
