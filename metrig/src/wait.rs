/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("condition not met within {} seconds", .budget.as_secs())]
pub struct WaitTimeout {
    pub budget: Duration,
}

/// Poll `probe` every `poll_interval` until it yields a value or the
/// time budget runs out. The probe is checked once right away, so a
/// condition that already holds never waits.
pub async fn wait_for<T, F>(
    budget: Duration,
    poll_interval: Duration,
    mut probe: F,
) -> Result<T, WaitTimeout>
where
    F: FnMut() -> Option<T>,
{
    let deadline = tokio::time::Instant::now() + budget;
    loop {
        if let Some(value) = probe() {
            return Ok(value);
        }

        let now = tokio::time::Instant::now();
        if now >= deadline {
            return Err(WaitTimeout { budget });
        }
        let step = poll_interval.min(deadline - now);
        tokio::time::sleep(step).await;
    }
}
