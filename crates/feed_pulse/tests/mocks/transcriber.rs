use std::sync::{Arc, Mutex};

use feed_pulse::{AudioInput, TranscribeResponse, Transcriber};

#[derive(Clone)]
pub struct MockTranscriber {
    text: String,
    fail_with: Option<String>,
    /// Input and instruction of every call
    pub calls: Arc<Mutex<Vec<(AudioInput, String)>>>,
    /// Whether the audio file existed when transcription was requested
    pub file_existed: Arc<Mutex<Vec<bool>>>,
}

impl MockTranscriber {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            fail_with: None,
            calls: Arc::new(Mutex::new(Vec::new())),
            file_existed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::new("")
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Transcriber for MockTranscriber {
    const TRANSCRIBER_MODEL: &'static str = "mock-transcriber";
    type Error = anyhow::Error;

    async fn transcribe(
        &self,
        audio_input: AudioInput,
        instruction: &str,
    ) -> Result<TranscribeResponse, Self::Error> {
        self.file_existed
            .lock()
            .unwrap()
            .push(audio_input.file_path().exists());
        self.calls
            .lock()
            .unwrap()
            .push((audio_input, instruction.to_string()));

        if let Some(message) = &self.fail_with {
            anyhow::bail!("{message}");
        }
        Ok(TranscribeResponse {
            text: self.text.clone(),
            duration: Some(61.0),
        })
    }
}
