use std::{
    fmt::{Debug, Display},
    future::Future,
    path::PathBuf,
};

use serde::Deserialize;

pub trait Transcriber {
    const TRANSCRIBER_MODEL: &'static str;

    type Error: Debug + Display + Send;

    /// Turns speech into text. `instruction` is passed through to the model verbatim.
    fn transcribe(
        &self,
        audio_input: AudioInput,
        instruction: &str,
    ) -> impl Future<Output = Result<TranscribeResponse, Self::Error>> + Send;
}

#[derive(Debug, Clone)]
pub enum AudioInput {
    /// Split with ffmpeg into `chunks_dir_path` before transcribing chunk by chunk
    Chunked {
        chunk_duration_seconds: u16,
        chunks_dir_path: PathBuf,
        file_path: PathBuf,
    },
    File(PathBuf),
}

impl AudioInput {
    pub fn file_path(&self) -> &PathBuf {
        match self {
            AudioInput::Chunked { file_path, .. } | AudioInput::File(file_path) => file_path,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscribeResponse {
    pub text: String,
    #[serde(default)]
    pub duration: Option<f64>,
}
