pub mod builder;
pub mod model;

pub use builder::ContentBuilder;
pub use model::{
    Candidate, FinishReason, GenerateContentRequest, GenerationResponse, PromptFeedback,
    UsageMetadata,
};
