// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use recap_core::{JobQueue, RecapError, SummaryJob};

/// A job queue that keeps enqueued jobs in memory.
#[derive(Default)]
pub struct RecordingQueue {
    jobs: Mutex<Vec<SummaryJob>>,
    failing: AtomicBool,
}

impl RecordingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn jobs(&self) -> Vec<SummaryJob> {
        self.jobs.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl JobQueue for RecordingQueue {
    async fn enqueue(&self, job: &SummaryJob) -> Result<(), RecapError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RecapError::Queue("mock queue unavailable".to_string()));
        }
        self.jobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(job.clone());
        Ok(())
    }
}
