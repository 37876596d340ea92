// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Producer side of the summary job queue.

use async_trait::async_trait;

use crate::error::RecapError;
use crate::jobs::SummaryJob;

/// At-least-once job transport. Duplicates are tolerated downstream by the claim ledger.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: &SummaryJob) -> Result<(), RecapError>;

    async fn enqueue_batch(&self, jobs: &[SummaryJob]) -> Result<(), RecapError> {
        for job in jobs {
            self.enqueue(job).await?;
        }
        Ok(())
    }
}
