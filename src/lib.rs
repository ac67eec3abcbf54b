//! # gemini-describe
//!
//! Ask a Gemini model about a local image with a single `generateContent` call.
//!
//! The [`runner`] module holds the end-to-end flow; [`Gemini`] is the thin REST
//! client it talks through.

mod client;
pub mod generation;
mod models;
pub mod runner;


pub use client::{Error as ClientError, Gemini, Model, API_KEY_ENV_VARS, BASE_URL_ENV_VAR};
pub use generation::{
    Candidate, ContentBuilder, FinishReason, GenerateContentRequest, GenerationResponse,
    PromptFeedback, UsageMetadata,
};
pub use models::{Blob, Content, Part, Role};
pub use runner::{ContentGenerator, Error as RunnerError, MediaPayload, RunnerConfig};
