//! Word-frequency output files.
//!
//! One file per station, `output_client_<id>.txt`, one `word, count` line
//! per distinct word in ascending byte order of the word.

use crate::StationError;
use contend_types::StationId;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Where station `id` writes its frequencies.
pub fn output_path(dir: &Path, station: StationId) -> PathBuf {
    dir.join(format!("output_client_{}.txt", station.index()))
}

/// Render frequencies in file format.
pub fn render(frequencies: &BTreeMap<String, u64>) -> String {
    let mut out = String::new();
    for (word, count) in frequencies {
        let _ = writeln!(out, "{word}, {count}");
    }
    out
}

/// Write the frequency file, creating `dir` if needed. Returns the path written.
pub async fn write_frequencies(
    dir: &Path,
    station: StationId,
    frequencies: &BTreeMap<String, u64>,
) -> Result<PathBuf, StationError> {
    let path = output_path(dir, station);
    let io_err = |source| StationError::Output {
        path: path.clone(),
        source,
    };

    tokio::fs::create_dir_all(dir).await.map_err(io_err)?;
    tokio::fs::write(&path, render(frequencies))
        .await
        .map_err(io_err)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frequencies(pairs: &[(&str, u64)]) -> BTreeMap<String, u64> {
        pairs.iter().map(|(w, c)| (w.to_string(), *c)).collect()
    }

    #[test]
    fn test_render_sorted_lines() {
        let rendered = render(&frequencies(&[("dog", 1), ("cat", 2)]));
        assert_eq!(rendered, "cat, 2\ndog, 1\n");
    }

    #[test]
    fn test_render_byte_order() {
        // Uppercase sorts before lowercase
        let rendered = render(&frequencies(&[("apple", 1), ("Zebra", 1)]));
        assert_eq!(rendered, "Zebra, 1\napple, 1\n");
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&BTreeMap::new()), "");
    }

    #[test]
    fn test_output_path() {
        let path = output_path(Path::new("/tmp/run"), StationId(4));
        assert_eq!(path, PathBuf::from("/tmp/run/output_client_4.txt"));
    }

    #[tokio::test]
    async fn test_write_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("out");

        let path = write_frequencies(&dir, StationId(0), &frequencies(&[("a", 3)]))
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "a, 3\n");
    }

    #[tokio::test]
    async fn test_write_overwrites_previous_run() {
        let tmp = tempfile::tempdir().unwrap();
        write_frequencies(tmp.path(), StationId(1), &frequencies(&[("old", 9)]))
            .await
            .unwrap();
        let path = write_frequencies(tmp.path(), StationId(1), &BTreeMap::new())
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "");
    }
}
