// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Execution of writes nobody waits on (summary persistence, telemetry).

use std::future::Future;

use tokio_util::task::TaskTracker;

/// Runs side writes either inline or on tracked background tasks.
///
/// Tracked tasks keep running after the caller returns; [`BackgroundWrites::drain`]
/// waits for all of them, which the service does once at shutdown.
#[derive(Clone, Debug)]
pub enum BackgroundWrites {
    Inline,
    Tracked(TaskTracker),
}

impl BackgroundWrites {
    pub fn tracked() -> Self {
        BackgroundWrites::Tracked(TaskTracker::new())
    }

    pub fn from_config(background: bool) -> Self {
        if background {
            Self::tracked()
        } else {
            BackgroundWrites::Inline
        }
    }

    /// Runs `write` to completion now, or hands it to the tracker.
    pub async fn submit<F>(&self, write: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match self {
            BackgroundWrites::Inline => write.await,
            BackgroundWrites::Tracked(tracker) => {
                tracker.spawn(write);
            }
        }
    }

    /// Stops accepting new tasks and waits for submitted ones.
    pub async fn drain(&self) {
        if let BackgroundWrites::Tracked(tracker) = self {
            tracker.close();
            tracker.wait().await;
        }
    }
}
