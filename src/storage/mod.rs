//! Output file persistence.
//!
//! Every segment worker streams its chapters into its own part file next to
//! the final output. Once all workers are done the parts are concatenated in
//! segment order, so worker completion order never affects the result.
//!
//! ## Directory Structure
//!
//! ```text
//! novels/
//! ├── 亏成首富_陈词懒调.txt                  # Final output
//! ├── 亏成首富_陈词懒调.txt.part-000000      # Segment starting at chapter 1
//! └── 亏成首富_陈词懒调.txt.part-000010      # Segment starting at chapter 11
//! ```

pub mod part;

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};

pub use part::PartWriter;

/// Part file path for the segment that starts at `start`.
pub fn part_path(output: &Path, start: usize) -> PathBuf {
    let mut name = output.as_os_str().to_os_string();
    name.push(format!(".part-{start:06}"));
    PathBuf::from(name)
}

/// Remove a file, ignoring one that does not exist.
pub async fn remove_if_exists(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AppError::Io(e)),
    }
}

/// Concatenate `parts` in the given order into `output`, then remove them.
///
/// The output is written to a temporary file and renamed into place.
pub async fn merge_parts(output: &Path, parts: &[PathBuf]) -> Result<u64> {
    let tmp = output.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp).await?;
    let mut total = 0;

    for part in parts {
        let mut reader = tokio::fs::File::open(part).await?;
        total += tokio::io::copy(&mut reader, &mut file).await?;
    }
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp, output).await?;
    for part in parts {
        remove_if_exists(part).await?;
    }

    log::debug!(
        "Merged {} part file(s) into {} ({} bytes)",
        parts.len(),
        output.display(),
        total
    );
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_path_sorts_by_start() {
        let output = Path::new("/tmp/novels/book.txt");
        assert_eq!(
            part_path(output, 10),
            PathBuf::from("/tmp/novels/book.txt.part-000010")
        );
        assert!(part_path(output, 9) < part_path(output, 10));
    }

    #[tokio::test]
    async fn merge_keeps_given_order() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("book.txt");
        let first = part_path(&output, 0);
        let second = part_path(&output, 5);
        tokio::fs::write(&first, "one\n").await.unwrap();
        tokio::fs::write(&second, "two\n").await.unwrap();

        let bytes = merge_parts(&output, &[first.clone(), second.clone()])
            .await
            .unwrap();

        assert_eq!(bytes, 8);
        assert_eq!(tokio::fs::read_to_string(&output).await.unwrap(), "one\ntwo\n");
        assert!(!first.exists());
        assert!(!second.exists());
    }

    #[tokio::test]
    async fn remove_missing_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        assert!(remove_if_exists(&dir.path().join("nope")).await.is_ok());
    }
}
