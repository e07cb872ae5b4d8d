//! Retrying analysis queries.
//!
//! [`QueryClient`] wraps an [`AnalysisService`] with exponential backoff for
//! answers that are only temporarily unavailable (the video is not queryable
//! yet, or the connection dropped). Any other failure is returned at once.

use std::sync::Arc;
use std::time::Duration;

use vf_core::{Angle, AngleTimestamps, Error, Result, VideoId};

use crate::envelope::extract_payload;
use crate::prompts::{angle_prompt, DESCRIPTION_PROMPT, EMPTY_DESCRIPTION, QUERY_TEMPERATURE};
use crate::retry::{retry, Attempt, RetryError, RetryPolicy, Sleeper};
use crate::services::AnalysisService;

/// Default pause between consecutive angle queries.
pub const DEFAULT_ANGLE_PACING: Duration = Duration::from_millis(500);

/// Analysis client with a per-query retry budget.
pub struct QueryClient {
    analysis: Arc<dyn AnalysisService>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
    pacing: Duration,
}

impl QueryClient {
    pub fn new(analysis: Arc<dyn AnalysisService>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            analysis,
            sleeper,
            policy: RetryPolicy::default(),
            pacing: DEFAULT_ANGLE_PACING,
        }
    }

    /// Builder: replace the retry policy.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Builder: pause between angle queries (`Duration::ZERO` disables it).
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Ask `prompt` about the video, retrying retryable failures.
    ///
    /// # Errors
    ///
    /// - [`Error::QueryExhausted`] when every attempt was retryable.
    /// - The first non-retryable error otherwise.
    pub async fn query(&self, video_id: &VideoId, prompt: &str, temperature: f32) -> Result<String> {
        retry(&self.policy, self.sleeper.as_ref(), |attempt| {
            self.attempt(video_id, prompt, temperature, attempt)
        })
        .await
        .map_err(|e| match e {
            RetryError::Fatal(e) => e,
            RetryError::Exhausted {
                attempts,
                last_reason,
            } => Error::QueryExhausted {
                attempts,
                message: last_reason,
            },
        })
    }

    async fn attempt(
        &self,
        video_id: &VideoId,
        prompt: &str,
        temperature: f32,
        attempt: u32,
    ) -> Result<Attempt<String>> {
        match self.analysis.analyze(video_id, prompt, temperature).await {
            Ok(text) => Ok(Attempt::Done(text)),
            Err(e) if e.is_retryable() => {
                tracing::info!(
                    video_id = %video_id,
                    attempt,
                    max_attempts = self.policy.max_attempts,
                    "analysis unavailable: {e}"
                );
                Ok(Attempt::Retry(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Free-text description of the main object.
    pub async fn describe(&self, video_id: &VideoId) -> Result<String> {
        let raw = self.query(video_id, DESCRIPTION_PROMPT, QUERY_TEMPERATURE).await?;
        Ok(extract_payload(&raw).unwrap_or_else(|| EMPTY_DESCRIPTION.to_string()))
    }

    /// Best timestamp for one angle; any failure yields `None`.
    pub async fn angle_timestamp(&self, video_id: &VideoId, angle: Angle) -> Option<String> {
        match self
            .query(video_id, &angle_prompt(angle), QUERY_TEMPERATURE)
            .await
        {
            Ok(raw) => {
                let ts = extract_payload(&raw);
                tracing::info!(video_id = %video_id, %angle, timestamp = ?ts, "angle timestamp");
                ts
            }
            Err(e) => {
                tracing::warn!(video_id = %video_id, %angle, "angle query failed: {e}");
                None
            }
        }
    }

    /// Timestamps for all four angles, queried one after another.
    pub async fn angle_timestamps(&self, video_id: &VideoId) -> AngleTimestamps {
        let mut timestamps = AngleTimestamps::new();

        for (i, angle) in Angle::ALL.into_iter().enumerate() {
            if i > 0 && !self.pacing.is_zero() {
                self.sleeper.sleep(self.pacing).await;
            }
            let ts = self.angle_timestamp(video_id, angle).await;
            timestamps.insert(angle, ts);
        }

        timestamps
    }
}
