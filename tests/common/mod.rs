//! Shared test doubles for pipeline and dispatcher tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use reqsmith::engine::{EngineError, InferenceEngine};

/// Scripted [`InferenceEngine`] that echoes its input, with optional
/// per-input delays and failures, and records call/concurrency counters.
#[derive(Default)]
pub struct MockEngine {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    fail_markers: Vec<String>,
    delays: Vec<(String, Duration)>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any call whose input contains `marker`.
    pub fn with_failure(mut self, marker: impl Into<String>) -> Self {
        self.fail_markers.push(marker.into());
        self
    }

    /// Delay any call whose input contains `marker`.
    pub fn with_delay(mut self, marker: impl Into<String>, delay: Duration) -> Self {
        self.delays.push((marker.into(), delay));
        self
    }

    /// Total calls observed, reduction calls included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously in-flight calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InferenceEngine for MockEngine {
    async fn invoke(&self, _instruction: &str, input: &str) -> Result<String, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self
            .delays
            .iter()
            .find(|(marker, _)| input.contains(marker))
            .map(|(_, delay)| *delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self
            .fail_markers
            .iter()
            .any(|marker| input.contains(marker))
        {
            return Err(EngineError::EmptyResponse);
        }

        Ok(format!("ok:{input}"))
    }
}
