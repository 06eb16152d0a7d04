//! OpenAI-backed speech-to-text and chat summarization.

use std::path::{Path, PathBuf};

use reqwest::{multipart, Client, Response};
use serde::{Deserialize, Serialize};

use crate::{
    yt::ytdlp::AudioProcessor, AudioInput, Summarizer, SummaryResponse, TranscribeResponse,
    Transcriber,
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Characters of the previous chunk's transcript handed to the next chunk as context
const CHUNK_CONTEXT_CHARS: usize = 200;

#[derive(Debug, Clone)]
pub struct OpenAIClient<F: AudioProcessor> {
    http: Client,
    api_key: String,
    base_url: String,
    audio: F,
}

#[derive(Debug, thiserror::Error)]
pub enum OpenAIError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Audio split failed: {0}")]
    Split(String),
    #[error("Model returned no content")]
    EmptyResponse,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatReply,
}

#[derive(Debug, Deserialize)]
pub struct ChatReply {
    pub content: Option<String>,
}

impl ChatResponse {
    /// Text of the first choice, if it has any
    pub fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
    }
}

impl<F: AudioProcessor> OpenAIClient<F> {
    const SYSTEM_PROMPT: &str = include_str!("./prompts/system.txt");

    pub fn new(api_key: impl Into<String>, audio: F) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            audio,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }

    /// Transcribes a single audio file in one request
    pub async fn transcribe_file(
        &self,
        path: &Path,
        model: &str,
        prompt: &str,
    ) -> Result<TranscribeResponse, OpenAIError> {
        let form = transcription_form(path, model, prompt).await?;

        let response = self
            .http
            .post(self.endpoint("audio/transcriptions"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Transcription request failed"))?;

        Ok(ensure_success(response).await?.json().await?)
    }

    pub async fn chat(&self, model: &str, user_content: &str) -> Result<ChatResponse, OpenAIError> {
        let request = ChatRequest {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: Self::SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: user_content,
                },
            ],
        };

        let response = self
            .http
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Chat request failed"))?;

        Ok(ensure_success(response).await?.json().await?)
    }

    /// Cuts `file_path` into `chunks_dir` on first use; later calls reuse the chunks
    /// already there. Returned in playback order.
    async fn chunks(
        &self,
        file_path: &Path,
        chunks_dir: &Path,
        chunk_duration_seconds: u16,
    ) -> Result<Vec<PathBuf>, OpenAIError> {
        let existing = sorted_entries(chunks_dir).await;
        if !existing.is_empty() {
            tracing::debug!(chunks = existing.len(), "Reusing audio chunks");
            return Ok(existing);
        }

        let stem = file_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| OpenAIError::Split(format!("bad audio path {}", file_path.display())))?;

        tokio::fs::create_dir_all(chunks_dir).await?;
        self.audio
            .split_audio_to_chunks(
                file_path,
                chunk_duration_seconds,
                chunks_dir.join(format!("{stem}_%03d.mp3")),
            )
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Audio split failed"))
            .map_err(|e| OpenAIError::Split(e.to_string()))?;

        Ok(sorted_entries(chunks_dir).await)
    }
}

async fn transcription_form(
    path: &Path,
    model: &str,
    prompt: &str,
) -> Result<multipart::Form, OpenAIError> {
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("audio.mp3")
        .to_string();
    let audio = multipart::Part::bytes(tokio::fs::read(path).await?)
        .file_name(file_name)
        .mime_str("audio/mpeg")?;

    Ok(multipart::Form::new()
        .text("model", model.to_string())
        .text("prompt", prompt.to_string())
        .text("response_format", "json")
        .part("file", audio))
}

async fn ensure_success(response: Response) -> Result<Response, OpenAIError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(OpenAIError::Api {
        status: status.as_u16(),
        message: response.text().await.unwrap_or_default(),
    })
}

async fn sorted_entries(dir: &Path) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(mut entries) = tokio::fs::read_dir(dir).await {
        while let Ok(Some(entry)) = entries.next_entry().await {
            paths.push(entry.path());
        }
    }
    paths.sort();
    paths
}

fn chunk_prompt(instruction: &str, previous: Option<&str>) -> String {
    match previous {
        Some(previous) => format!("{instruction}\n\nPreceding audio: {previous}"),
        None => instruction.to_string(),
    }
}

/// Last `max_chars` characters of `text`
fn tail(text: &str, max_chars: usize) -> &str {
    let skip = text.chars().count().saturating_sub(max_chars);
    match text.char_indices().nth(skip) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

impl<F: AudioProcessor + Send + Sync> Transcriber for OpenAIClient<F> {
    const TRANSCRIBER_MODEL: &'static str = "gpt-4o-transcribe";
    type Error = OpenAIError;

    #[tracing::instrument(skip_all, fields(file = %audio_input.file_path().display()))]
    async fn transcribe(
        &self,
        audio_input: AudioInput,
        instruction: &str,
    ) -> Result<TranscribeResponse, Self::Error> {
        let chunks = match &audio_input {
            AudioInput::File(path) => {
                return self
                    .transcribe_file(path, Self::TRANSCRIBER_MODEL, instruction)
                    .await;
            }
            AudioInput::Chunked {
                chunk_duration_seconds,
                chunks_dir_path,
                file_path,
            } => {
                self.chunks(file_path, chunks_dir_path, *chunk_duration_seconds)
                    .await?
            }
        };

        let mut pieces: Vec<String> = Vec::with_capacity(chunks.len());
        let mut duration = None::<f64>;

        for (i, chunk) in chunks.iter().enumerate() {
            let previous = pieces.last().map(|text| tail(text, CHUNK_CONTEXT_CHARS));
            let prompt = chunk_prompt(instruction, previous);

            let response = self
                .transcribe_file(chunk, Self::TRANSCRIBER_MODEL, &prompt)
                .await
                .inspect_err(|e| tracing::error!(error = %e, chunk = i, "Chunk transcription failed"))?;

            if let Some(d) = response.duration {
                *duration.get_or_insert(0.0) += d;
            }
            pieces.push(response.text.trim().to_string());
        }

        Ok(TranscribeResponse {
            text: pieces.join(" "),
            duration,
        })
    }
}

impl<F: AudioProcessor + Send + Sync> Summarizer for OpenAIClient<F> {
    const SUMMARIZER_MODEL: &'static str = "gpt-4o";
    type Error = OpenAIError;

    #[tracing::instrument(skip_all)]
    async fn summarize(&self, prompt: &str) -> Result<SummaryResponse, Self::Error> {
        let summary = self
            .chat(Self::SUMMARIZER_MODEL, prompt)
            .await?
            .into_text()
            .ok_or(OpenAIError::EmptyResponse)?;

        Ok(SummaryResponse { summary })
    }
}
