use std::collections::HashSet;
use std::path::Path;

use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use crate::log::ResultLogError;
use crate::record::JsonlRecord;

/// Scans an existing result log and returns the set of `artist_id`s already
/// recorded, so a `--resume` run can skip work it already did.
///
/// A missing file yields an empty set rather than an error — resuming
/// against a log that doesn't exist yet is just a fresh run. Lines that
/// fail to parse (a truncated trailing line from a crash mid-write, for
/// instance) are logged and skipped instead of aborting the scan, since the
/// whole point of this function is to recover from exactly that kind of
/// partial write.
pub async fn get_processed_ids(path: impl AsRef<Path>) -> Result<HashSet<Uuid>, ResultLogError> {
    let path = path.as_ref();

    let file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(HashSet::new()),
        Err(source) => return Err(ResultLogError::Io { path: path.display().to_string(), source }),
    };

    let mut lines = BufReader::new(file).lines();
    let mut ids = HashSet::new();

    loop {
        let line = lines
            .next_line()
            .await
            .map_err(|source| ResultLogError::Io { path: path.display().to_string(), source })?;
        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<JsonlRecord>(&line) {
            Ok(record) => {
                ids.insert(record.artist_id);
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping unparsable result log line");
            }
        }
    }

    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use batchgen_core::PersistenceStatus;

    #[tokio::test]
    async fn missing_file_yields_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.jsonl");
        let ids = get_processed_ids(&path).await.unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn collects_ids_and_skips_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");

        let id_a = Uuid::new_v4();
        let id_b = Uuid::new_v4();
        let record_a = JsonlRecord::new(id_a, "A", None, "pmpt_1", None, "bio", "resp_1", 0, PersistenceStatus::None, None);
        let record_b = JsonlRecord::new(id_b, "B", None, "pmpt_1", None, "bio", "resp_2", 0, PersistenceStatus::None, None);

        let mut contents = serde_json::to_string(&record_a).unwrap();
        contents.push('\n');
        contents.push_str("{truncated garbage");
        contents.push('\n');
        contents.push_str(&serde_json::to_string(&record_b).unwrap());
        contents.push('\n');

        tokio::fs::write(&path, contents).await.unwrap();

        let ids = get_processed_ids(&path).await.unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&id_a));
        assert!(ids.contains(&id_b));
    }

    #[tokio::test]
    async fn blank_lines_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        let id = Uuid::new_v4();
        let record = JsonlRecord::new(id, "A", None, "pmpt_1", None, "bio", "resp_1", 0, PersistenceStatus::None, None);
        let contents = format!("\n{}\n\n", serde_json::to_string(&record).unwrap());
        tokio::fs::write(&path, contents).await.unwrap();

        let ids = get_processed_ids(&path).await.unwrap();
        assert_eq!(ids, HashSet::from([id]));
    }
}
