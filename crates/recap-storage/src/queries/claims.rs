// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Job claim ledger over `summary_queue_jobs`.
//!
//! Ownership of a job is the `(lease_until, updated_at)` pair written when it
//! was claimed. Every transition after the claim is a single conditional
//! statement gated on that pair, so two workers racing on the same job id
//! cannot both win, whether they share this process or not.

use recap_core::{ClaimOutcome, ClaimToken, DoneOutcome, RecapError};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::models::ClaimRecord;

pub(crate) const STATUS_PROCESSING: &str = "processing";
pub(crate) const STATUS_DONE: &str = "done";

/// Claims `job_id` for `lease_seconds` (minimum one second).
///
/// Inserts a fresh `processing` row; if one exists, reports `AlreadyDone`
/// or `InFlight`, or takes over an expired lease with a conditional update.
pub async fn claim(
    db: &Database,
    job_id: &str,
    now: i64,
    lease_seconds: i64,
) -> Result<ClaimOutcome, RecapError> {
    let job_id = job_id.to_string();
    let lease_until = now.saturating_add(lease_seconds.max(1));
    let acquired = ClaimOutcome::Acquired(ClaimToken {
        lease_until,
        updated_at: now,
    });

    db.connection()
        .call(move |conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO summary_queue_jobs
                     (job_id, status, lease_until, updated_at, done_at)
                 VALUES (?1, ?2, ?3, ?4, NULL)",
                params![job_id, STATUS_PROCESSING, lease_until, now],
            )?;
            if inserted > 0 {
                return Ok(acquired);
            }

            match read_claim(conn, &job_id)? {
                // Released between our insert and this read; let the next delivery retry.
                None => return Ok(ClaimOutcome::InFlight { lease_until }),
                Some(row) if row.is_done() => return Ok(ClaimOutcome::AlreadyDone),
                Some(row) if row.lease_until > now => {
                    return Ok(ClaimOutcome::InFlight {
                        lease_until: row.lease_until,
                    });
                }
                Some(_) => {}
            }

            let taken = conn.execute(
                "UPDATE summary_queue_jobs
                 SET status = ?1, lease_until = ?2, updated_at = ?3, done_at = NULL
                 WHERE job_id = ?4 AND status = ?1 AND lease_until <= ?3",
                params![STATUS_PROCESSING, lease_until, now, job_id],
            )?;
            if taken > 0 {
                return Ok(acquired);
            }

            Ok(match read_claim(conn, &job_id)? {
                Some(row) if row.is_done() => ClaimOutcome::AlreadyDone,
                Some(row) => ClaimOutcome::InFlight {
                    lease_until: row.lease_until,
                },
                None => ClaimOutcome::InFlight { lease_until },
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Marks the job done if the stored lease pair still equals `claim`.
pub async fn mark_done(
    db: &Database,
    job_id: &str,
    claim: ClaimToken,
    now: i64,
) -> Result<DoneOutcome, RecapError> {
    let job_id = job_id.to_string();
    db.connection()
        .call(move |conn| {
            let updated = conn.execute(
                "UPDATE summary_queue_jobs
                 SET status = ?1, lease_until = ?2, updated_at = ?2, done_at = ?2
                 WHERE job_id = ?3 AND status = ?4 AND lease_until = ?5 AND updated_at = ?6",
                params![
                    STATUS_DONE,
                    now,
                    job_id,
                    STATUS_PROCESSING,
                    claim.lease_until,
                    claim.updated_at
                ],
            )?;
            if updated > 0 {
                return Ok(DoneOutcome::Marked);
            }
            Ok(match read_claim(conn, &job_id)? {
                Some(row) if row.is_done() => DoneOutcome::AlreadyDone,
                _ => DoneOutcome::LostClaim,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Deletes the claim if the stored lease pair still equals `claim`.
///
/// Returns `false` when the pair no longer matches, which is not an error.
pub async fn release(db: &Database, job_id: &str, claim: ClaimToken) -> Result<bool, RecapError> {
    let job_id = job_id.to_string();
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM summary_queue_jobs
                 WHERE job_id = ?1 AND status = ?2 AND lease_until = ?3 AND updated_at = ?4",
                params![job_id, STATUS_PROCESSING, claim.lease_until, claim.updated_at],
            )?;
            Ok(deleted > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Reads the ledger row for `job_id`.
pub async fn get_claim(db: &Database, job_id: &str) -> Result<Option<ClaimRecord>, RecapError> {
    let job_id = job_id.to_string();
    db.connection()
        .call(move |conn| read_claim(conn, &job_id))
        .await
        .map_err(map_tr_err)
}

fn read_claim(conn: &rusqlite::Connection, job_id: &str) -> rusqlite::Result<Option<ClaimRecord>> {
    conn.query_row(
        "SELECT job_id, status, lease_until, updated_at, done_at
         FROM summary_queue_jobs WHERE job_id = ?1",
        params![job_id],
        |row| {
            Ok(ClaimRecord {
                job_id: row.get(0)?,
                status: row.get(1)?,
                lease_until: row.get(2)?,
                updated_at: row.get(3)?,
                done_at: row.get(4)?,
            })
        },
    )
    .optional()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const JOB: &str = "daily:-1001:100:200";

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("claims.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn token(outcome: ClaimOutcome) -> ClaimToken {
        match outcome {
            ClaimOutcome::Acquired(token) => token,
            other => panic!("expected Acquired, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn first_claim_acquires_lease() {
        let (db, _dir) = setup_db().await;
        let t = token(claim(&db, JOB, 1_000, 60).await.unwrap());
        assert_eq!(
            t,
            ClaimToken {
                lease_until: 1_060,
                updated_at: 1_000
            }
        );

        let row = get_claim(&db, JOB).await.unwrap().unwrap();
        assert_eq!(row.status, "processing");
        assert_eq!(row.done_at, None);
    }

    #[tokio::test]
    async fn lease_is_at_least_one_second() {
        let (db, _dir) = setup_db().await;
        let t = token(claim(&db, JOB, 1_000, 0).await.unwrap());
        assert_eq!(t.lease_until, 1_001);
    }

    #[tokio::test]
    async fn second_claim_during_lease_is_in_flight() {
        let (db, _dir) = setup_db().await;
        claim(&db, JOB, 1_000, 60).await.unwrap();
        let outcome = claim(&db, JOB, 1_030, 60).await.unwrap();
        assert_eq!(outcome, ClaimOutcome::InFlight { lease_until: 1_060 });
    }

    #[tokio::test]
    async fn expired_lease_is_taken_over() {
        let (db, _dir) = setup_db().await;
        let first = token(claim(&db, JOB, 1_000, 60).await.unwrap());
        let second = token(claim(&db, JOB, 1_060, 60).await.unwrap());
        assert_eq!(second.lease_until, 1_120);
        assert_ne!(first, second);

        // The original owner can no longer complete or release.
        assert_eq!(
            mark_done(&db, JOB, first, 1_070).await.unwrap(),
            DoneOutcome::LostClaim
        );
        assert!(!release(&db, JOB, first).await.unwrap());
        assert_eq!(
            mark_done(&db, JOB, second, 1_070).await.unwrap(),
            DoneOutcome::Marked
        );
    }

    #[tokio::test]
    async fn done_job_is_never_reclaimed() {
        let (db, _dir) = setup_db().await;
        let t = token(claim(&db, JOB, 1_000, 60).await.unwrap());
        assert_eq!(mark_done(&db, JOB, t, 1_010).await.unwrap(), DoneOutcome::Marked);

        for now in [1_011, 1_060, 5_000, 1_000_000] {
            assert_eq!(
                claim(&db, JOB, now, 60).await.unwrap(),
                ClaimOutcome::AlreadyDone
            );
        }

        let row = get_claim(&db, JOB).await.unwrap().unwrap();
        assert_eq!(row.status, "done");
        assert_eq!(row.done_at, Some(1_010));
    }

    #[tokio::test]
    async fn duplicate_mark_done_reports_already_done() {
        let (db, _dir) = setup_db().await;
        let t = token(claim(&db, JOB, 1_000, 60).await.unwrap());
        mark_done(&db, JOB, t, 1_010).await.unwrap();
        assert_eq!(
            mark_done(&db, JOB, t, 1_020).await.unwrap(),
            DoneOutcome::AlreadyDone
        );
    }

    #[tokio::test]
    async fn release_then_claim_gets_fresh_lease() {
        let (db, _dir) = setup_db().await;
        let t = token(claim(&db, JOB, 1_000, 60).await.unwrap());
        assert!(release(&db, JOB, t).await.unwrap());
        assert!(get_claim(&db, JOB).await.unwrap().is_none());

        let fresh = token(claim(&db, JOB, 1_005, 60).await.unwrap());
        assert_eq!(fresh.lease_until, 1_065);
        assert_eq!(fresh.updated_at, 1_005);
    }

    #[tokio::test]
    async fn stale_release_leaves_current_owner_alone() {
        let (db, _dir) = setup_db().await;
        let stale = token(claim(&db, JOB, 1_000, 60).await.unwrap());
        let current = token(claim(&db, JOB, 1_100, 60).await.unwrap());

        assert!(!release(&db, JOB, stale).await.unwrap());
        let row = get_claim(&db, JOB).await.unwrap().unwrap();
        assert_eq!(row.lease_until, current.lease_until);
        assert_eq!(row.updated_at, current.updated_at);
    }

    #[tokio::test]
    async fn release_after_done_is_noop() {
        let (db, _dir) = setup_db().await;
        let t = token(claim(&db, JOB, 1_000, 60).await.unwrap());
        mark_done(&db, JOB, t, 1_010).await.unwrap();
        assert!(!release(&db, JOB, t).await.unwrap());
        assert!(get_claim(&db, JOB).await.unwrap().unwrap().is_done());
    }

    #[tokio::test]
    async fn mark_done_without_row_is_lost_claim() {
        let (db, _dir) = setup_db().await;
        let phantom = ClaimToken {
            lease_until: 10,
            updated_at: 1,
        };
        assert_eq!(
            mark_done(&db, "on_demand:1:1", phantom, 5).await.unwrap(),
            DoneOutcome::LostClaim
        );
    }

    #[tokio::test]
    async fn concurrent_claims_elect_one_owner() {
        let (db, _dir) = setup_db().await;
        let db = std::sync::Arc::new(db);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                claim(&db, JOB, 2_000, 60).await.unwrap()
            }));
        }
        let mut acquired = 0;
        for handle in handles {
            if matches!(handle.await.unwrap(), ClaimOutcome::Acquired(_)) {
                acquired += 1;
            }
        }
        assert_eq!(acquired, 1);
    }

    #[tokio::test]
    async fn concurrent_takeover_of_expired_lease_elects_one_owner() {
        let (db, dir) = setup_db().await;
        let stale = token(claim(&db, JOB, 1_000, 60).await.unwrap());
        let now = 2_000;

        // Separate connections so the read and the conditional update interleave.
        let path = dir.path().join("claims.db");
        let mut handles = Vec::new();
        for _ in 0..6 {
            let db = Database::open(path.to_str().unwrap()).await.unwrap();
            handles.push(tokio::spawn(async move {
                claim(&db, JOB, now, 60).await.unwrap()
            }));
        }

        let mut winners = Vec::new();
        let mut in_flight = 0;
        for handle in handles {
            match handle.await.unwrap() {
                ClaimOutcome::Acquired(t) => winners.push(t),
                ClaimOutcome::InFlight { lease_until } => {
                    assert_eq!(lease_until, now + 60);
                    in_flight += 1;
                }
                ClaimOutcome::AlreadyDone => panic!("job was never completed"),
            }
        }
        assert_eq!(winners.len(), 1);
        assert_eq!(in_flight, 5);

        let winner = winners[0];
        let row = get_claim(&db, JOB).await.unwrap().unwrap();
        assert_eq!(row.status, "processing");
        assert_eq!(
            ClaimToken {
                lease_until: row.lease_until,
                updated_at: row.updated_at
            },
            winner
        );
        assert_eq!(
            mark_done(&db, JOB, stale, now).await.unwrap(),
            DoneOutcome::LostClaim
        );
    }
}
