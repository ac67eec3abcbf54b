use std::sync::Arc;
use tracing::{debug, instrument};

use crate::{
    client::{Error as ClientError, GeminiClient, Model},
    generation::{GenerateContentRequest, GenerationResponse},
    Content, Role,
};

/// Builder for content generation requests
#[derive(Clone)]
pub struct ContentBuilder {
    client: Arc<GeminiClient>,
    model: Model,
    pub contents: Vec<Content>,
}

impl ContentBuilder {
    /// Creates a new `ContentBuilder` targeting the default model.
    pub(crate) fn new(client: Arc<GeminiClient>) -> Self {
        Self {
            client,
            model: Model::default(),
            contents: Vec::new(),
        }
    }

    /// Sets the model that will serve the request.
    pub fn with_model(mut self, model: impl Into<Model>) -> Self {
        self.model = model.into();
        self
    }

    /// Adds a user message to the conversation.
    pub fn with_user_message(mut self, text: impl Into<String>) -> Self {
        self.contents.push(Content::text(text).with_role(Role::User));
        self
    }

    /// Adds inline data (e.g., an image) as its own user turn.
    ///
    /// The data should be base64-encoded.
    pub fn with_inline_data(
        mut self,
        data: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        let content = Content::inline_data(mime_type, data).with_role(Role::User);
        self.contents.push(content);
        self
    }

    /// Adds a prepared content unit, keeping its parts and role untouched.
    pub fn with_content(mut self, content: Content) -> Self {
        self.contents.push(content);
        self
    }

    /// Adds several prepared content units in order.
    pub fn with_contents(mut self, contents: impl IntoIterator<Item = Content>) -> Self {
        self.contents.extend(contents);
        self
    }

    /// Builds the request body without sending it.
    pub fn build(self) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: self.contents,
        }
    }

    /// Executes the request and waits for the full response.
    #[instrument(skip_all, fields(model = %self.model, contents = self.contents.len()))]
    pub async fn execute(self) -> Result<GenerationResponse, ClientError> {
        let client = self.client.clone();
        let model = self.model.clone();
        let response = client.generate_content_raw(&model, self.build()).await?;

        if let Some(usage) = &response.usage_metadata {
            debug!(
                prompt_tokens = usage.prompt_token_count,
                candidates_tokens = usage.candidates_token_count,
                total_tokens = usage.total_token_count,
                "usage metadata"
            );
        }

        Ok(response)
    }
}
