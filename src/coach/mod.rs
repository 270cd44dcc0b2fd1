// ABOUTME: Coaching analysis client abstraction and the Gemini implementation
// ABOUTME: Defines the async trait seam plus retry/backoff and prompt helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Coaching Analysis Client
//!
//! One request per activity: a structured prompt embedding the target
//! activity, two historical windows, and the athlete's goal, answered by the
//! model as JSON conforming exactly to the [`AnalysisResult`] schema.
//! Transient failures retry with capped exponential backoff; a hard
//! quota-exceeded condition raises [`crate::errors::SyncError::QuotaExhausted`]
//! immediately so the orchestrator can trip its circuit breaker.

use async_trait::async_trait;

use crate::errors::SyncResult;
use crate::models::{Activity, AnalysisResult, GoalSettings};

/// Exponential backoff configuration for transient failures
pub mod backoff;
/// Gemini analysis client
pub mod gemini;
/// Prompt construction and history windowing
pub mod prompt;

pub use backoff::RetryBackoffConfig;
pub use gemini::{GeminiCoach, GeminiConfig};

/// Contract for producing a coaching analysis of one activity
#[async_trait]
pub trait CoachClient: Send + Sync {
    /// Analyze `activity` against its history and the athlete's goals.
    ///
    /// `history` is the surrounding context and must not include the target
    /// activity; implementations additionally filter it out by id.
    ///
    /// # Errors
    ///
    /// - [`crate::errors::SyncError::QuotaExhausted`] on a hard quota condition, with zero retries
    /// - [`crate::errors::SyncError::RetriesExhausted`] when transient failures persist
    /// - [`crate::errors::SyncError::MalformedResponse`] when the response violates the schema
    /// - transport/upstream errors otherwise
    async fn analyze(
        &self,
        activity: &Activity,
        history: &[Activity],
        goals: &GoalSettings,
    ) -> SyncResult<AnalysisResult>;
}
