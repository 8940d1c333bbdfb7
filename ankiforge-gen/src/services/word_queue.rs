//! Work queue file: one pending word per line

use crate::utils::write_atomic;
use ankiforge_common::{Error, Result};
use std::path::Path;

/// Words to process, in file order
///
/// Lines are trimmed and blank lines skipped.
pub fn load_words(path: &Path) -> Result<Vec<String>> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::NotFound(format!(
                "Word list not found: {}",
                path.display()
            )))
        }
        Err(e) => return Err(e.into()),
    };

    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Remove every line matching `word` (trimmed, case-insensitive)
///
/// Other lines are kept exactly as written, including blank lines and the
/// presence or absence of a final newline. Returns the number of lines
/// removed; the file is not rewritten when that is zero.
pub fn remove_word(path: &Path, word: &str) -> Result<usize> {
    let target = word.trim().to_lowercase();
    if target.is_empty() {
        return Ok(0);
    }

    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut kept = String::with_capacity(text.len());
    let mut removed = 0;

    for line in text.split_inclusive('\n') {
        let bare = line.trim_end_matches('\n').trim_end_matches('\r');
        if bare.trim().to_lowercase() == target {
            removed += 1;
        } else {
            kept.push_str(line);
        }
    }

    if removed == 0 {
        return Ok(0);
    }

    // Removing the final line must not leave its predecessor's newline
    // dangling when the original had none.
    if !text.ends_with('\n') && kept.ends_with('\n') {
        kept.pop();
        if kept.ends_with('\r') {
            kept.pop();
        }
    }

    write_atomic(path, kept.as_bytes())?;
    tracing::debug!(word = %word, removed, path = %path.display(), "Removed word from queue");

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn queue(dir: &TempDir, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join("words.txt");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_words_trims_and_skips_blanks() {
        let dir = TempDir::new().unwrap();
        let path = queue(&dir, "  nimble \n\n to deem\n\t\nwary");
        assert_eq!(load_words(&path).unwrap(), vec!["nimble", "to deem", "wary"]);
    }

    #[test]
    fn test_load_words_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_words(&dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_remove_word_keeps_other_lines_verbatim() {
        let dir = TempDir::new().unwrap();
        let path = queue(&dir, "alpha\n\n  Nimble  \n  beta \nNIMBLE\ngamma\n");

        assert_eq!(remove_word(&path, "nimble").unwrap(), 2);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "alpha\n\n  beta \ngamma\n"
        );
    }

    #[test]
    fn test_remove_last_line_without_trailing_newline() {
        let dir = TempDir::new().unwrap();
        let path = queue(&dir, "alpha\nbeta");

        assert_eq!(remove_word(&path, "beta").unwrap(), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "alpha");
    }

    #[test]
    fn test_remove_word_no_match_leaves_file() {
        let dir = TempDir::new().unwrap();
        let path = queue(&dir, "alpha\r\nbeta");

        assert_eq!(remove_word(&path, "gamma").unwrap(), 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "alpha\r\nbeta");
    }

    #[test]
    fn test_remove_word_crlf() {
        let dir = TempDir::new().unwrap();
        let path = queue(&dir, "alpha\r\nbeta\r\ngamma\r\n");

        assert_eq!(remove_word(&path, "beta").unwrap(), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "alpha\r\ngamma\r\n");
    }

    #[test]
    fn test_remove_word_missing_file_or_blank_word() {
        let dir = TempDir::new().unwrap();
        assert_eq!(remove_word(&dir.path().join("none.txt"), "x").unwrap(), 0);

        let path = queue(&dir, "alpha\n\n");
        assert_eq!(remove_word(&path, "  ").unwrap(), 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "alpha\n\n");
    }
}
