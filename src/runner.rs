//! The request runner: read one media file, ask the model about it, print the answer.
//!
//! [`run`] performs the whole flow and returns a typed [`Error`] instead of
//! terminating, so the binary entry point alone decides how the process exits.
//! The remote service is reached through the [`ContentGenerator`] trait, which
//! [`Gemini`] implements and tests replace with an in-memory fake.

use async_trait::async_trait;
use mime::Mime;
use snafu::{ResultExt, Snafu};
use std::{
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

use crate::{
    client::{Error as ClientError, Gemini, Model},
    generation::GenerationResponse,
    models::{Content, Part, Role},
};

/// Media file read when nothing else is configured.
pub const DEFAULT_MEDIA_PATH: &str = "image.png";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to initialize the API client"))]
    Connect { source: ClientError },

    #[snafu(display("failed to read media file '{}'", path.display()))]
    ReadMedia {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("content generation with {model} failed"))]
    Generate { source: ClientError, model: Model },

    #[snafu(display("failed to write the response text"))]
    WriteOutput { source: std::io::Error },
}

/// Settings for a single run.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// File whose bytes are sent as the inline data part. Defaults to `image.png`.
    pub media_path: PathBuf,
    /// Model that serves the request. Defaults to `gemini-2.5-flash`.
    pub model: Model,
    /// Declared media type of the file.
    ///
    /// `None` (the default) guesses it from the file extension. A declared type
    /// is sent as-is even when the extension suggests something else.
    pub media_type: Option<Mime>,
    /// Text part sent after the media. Defaults to the empty string and is
    /// always sent, empty or not.
    pub prompt: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            media_path: PathBuf::from(DEFAULT_MEDIA_PATH),
            model: Model::default(),
            media_type: None,
            prompt: String::new(),
        }
    }
}

/// Something that can answer a `generateContent` call.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(
        &self,
        model: &Model,
        contents: Vec<Content>,
    ) -> Result<GenerationResponse, ClientError>;
}

#[async_trait]
impl ContentGenerator for Gemini {
    async fn generate(
        &self,
        model: &Model,
        contents: Vec<Content>,
    ) -> Result<GenerationResponse, ClientError> {
        self.generate_content()
            .with_model(model.clone())
            .with_contents(contents)
            .execute()
            .await
    }
}

/// Raw file bytes tagged with the media type they are declared as.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaPayload {
    pub bytes: Vec<u8>,
    pub mime_type: Mime,
}

impl MediaPayload {
    /// Reads the whole file at `path` into memory.
    pub async fn load(path: &Path, declared: Option<&Mime>) -> Result<Self, Error> {
        let bytes = tokio::fs::read(path)
            .await
            .context(ReadMediaSnafu { path })?;
        let mime_type = resolve_media_type(path, declared);
        debug!(
            path = %path.display(),
            size = bytes.len(),
            mime_type = %mime_type,
            "media loaded"
        );
        Ok(Self { bytes, mime_type })
    }
}

/// Picks the media type to declare for `path`.
///
/// A declared type wins; a mismatch with the extension is only logged, the
/// file content itself is never inspected. Without a declared type the
/// extension decides, falling back to `application/octet-stream`.
pub fn resolve_media_type(path: &Path, declared: Option<&Mime>) -> Mime {
    let guessed = mime_guess::from_path(path).first();

    match (declared, guessed) {
        (Some(declared), Some(guessed)) => {
            if declared.essence_str() != guessed.essence_str() {
                warn!(
                    path = %path.display(),
                    declared = %declared,
                    guessed = %guessed,
                    "declared media type does not match the file extension"
                );
            }
            declared.clone()
        }
        (Some(declared), None) => declared.clone(),
        (None, Some(guessed)) => guessed,
        (None, None) => {
            warn!(
                path = %path.display(),
                "cannot guess media type from the file extension, sending as octet-stream"
            );
            mime::APPLICATION_OCTET_STREAM
        }
    }
}

/// Builds the single user turn: the media part first, then the prompt text.
pub fn build_user_content(media: &MediaPayload, prompt: impl Into<String>) -> Content {
    Content::from_parts(
        vec![
            Part::inline_bytes(&media.mime_type, &media.bytes),
            Part::text(prompt),
        ],
        Role::User,
    )
}

/// Runs the whole flow once and writes the response text to `out`.
///
/// `connect` is called first; when it fails the media file is never read.
/// Nothing is written to `out` unless the remote call succeeds.
pub async fn run<G, F, W>(config: &RunnerConfig, connect: F, out: &mut W) -> Result<(), Error>
where
    G: ContentGenerator,
    F: FnOnce() -> Result<G, ClientError>,
    W: Write,
{
    let generator = connect().context(ConnectSnafu)?;

    let media = MediaPayload::load(&config.media_path, config.media_type.as_ref()).await?;
    let content = build_user_content(&media, config.prompt.as_str());
    drop(media);

    info!(model = %config.model, "requesting content generation");
    let response = generator
        .generate(&config.model, vec![content])
        .await
        .context(GenerateSnafu {
            model: config.model.clone(),
        })?;

    if let Some(reason) = response.block_reason() {
        warn!(reason, "prompt was blocked");
    }

    writeln!(out, "{}", response.text()).context(WriteOutputSnafu)?;
    out.flush().context(WriteOutputSnafu)
}
