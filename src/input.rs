use crate::error::InputError;
use std::io::ErrorKind;
use std::path::Path;

/// Reads one address per line, trimmed, skipping blank lines. Order and
/// duplicates are preserved.
pub async fn read_addresses(path: impl AsRef<Path>) -> Result<Vec<String>, InputError> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| match source.kind() {
            ErrorKind::NotFound => InputError::NotFound(path.to_path_buf()),
            _ => InputError::Read {
                path: path.to_path_buf(),
                source,
            },
        })?;
    Ok(parse_addresses(&contents))
}

pub fn parse_addresses(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
