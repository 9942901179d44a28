use diesel::sql_types::{Text, Uuid as SqlUuid};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

/// Outcome of one [`update_bio`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbWriteOutcome {
    /// A row was updated.
    Updated,
    /// No row matched — either the id doesn't exist, or `skip_existing`
    /// was set and the row already had a bio.
    Skipped,
}

fn table_name(test_mode: bool) -> &'static str {
    if test_mode {
        "test_artists"
    } else {
        "artists"
    }
}

/// Writes `bio` for `artist_id`.
///
/// When `skip_existing` is set, the update only applies if the existing
/// `bio` column is `NULL`, so a re-run over already-processed rows leaves
/// them untouched. `test_mode` redirects the write to a `test_artists`
/// table so integration tests never touch production data.
pub async fn update_bio(
    conn: &mut AsyncPgConnection,
    artist_id: Uuid,
    bio: &str,
    skip_existing: bool,
    test_mode: bool,
) -> Result<DbWriteOutcome, diesel::result::Error> {
    let table = table_name(test_mode);
    let sql = if skip_existing {
        format!("UPDATE {table} SET bio = $1 WHERE id = $2 AND bio IS NULL")
    } else {
        format!("UPDATE {table} SET bio = $1 WHERE id = $2")
    };

    let rows_affected = diesel::sql_query(sql)
        .bind::<Text, _>(bio)
        .bind::<SqlUuid, _>(artist_id)
        .execute(conn)
        .await?;

    Ok(if rows_affected > 0 { DbWriteOutcome::Updated } else { DbWriteOutcome::Skipped })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_uses_test_table() {
        assert_eq!(table_name(true), "test_artists");
        assert_eq!(table_name(false), "artists");
    }
}
