//! Whisper transcription and TTS synthesis over the OpenAI REST API.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use rozmova_core::service::{AudioBlob, Transcript, VoiceCodec};
use rozmova_core::{Result, RozmovaError};
use serde::Deserialize;

const TRANSCRIPTION_URL: &str = "https://api.openai.com/v1/audio/transcriptions";
const SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";
const TRANSCRIPTION_MODEL: &str = "whisper-1";
const SPEECH_MODEL: &str = "tts-1";
const SPEECH_VOICE: &str = "alloy";

/// Speech converter over the OpenAI audio endpoints.
#[derive(Clone)]
pub struct OpenAiVoiceClient {
    client: Client,
    api_key: String,
}

impl OpenAiVoiceClient {
    /// Creates a client with the provided API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl VoiceCodec for OpenAiVoiceClient {
    async fn transcribe(&self, audio: &AudioBlob, language_hint: &str) -> Result<Transcript> {
        let file = Part::bytes(audio.0.clone())
            .file_name("voice.ogg")
            .mime_str("audio/ogg")
            .map_err(|err| RozmovaError::voice(format!("invalid audio part: {err}")))?;
        let form = Form::new()
            .part("file", file)
            .text("model", TRANSCRIPTION_MODEL)
            .text("language", language_hint.to_string());

        let response = self
            .client
            .post(TRANSCRIPTION_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|err| RozmovaError::voice(format!("transcription request failed: {err}")))?;

        if !response.status().is_success() {
            return Err(voice_http_error("transcription", response.status(), response).await);
        }

        let parsed: TranscriptionResponse = response.json().await.map_err(|err| {
            RozmovaError::voice(format!("failed to parse transcription response: {err}"))
        })?;

        let text = parsed.text.trim().to_string();
        if text.is_empty() {
            Ok(Transcript::NoSpeech)
        } else {
            Ok(Transcript::Text(text))
        }
    }

    async fn synthesize(&self, text: &str, _language_hint: &str) -> Result<AudioBlob> {
        let body = serde_json::json!({
            "model": SPEECH_MODEL,
            "voice": SPEECH_VOICE,
            "input": text,
            "response_format": "opus",
        });

        let response = self
            .client
            .post(SPEECH_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|err| RozmovaError::voice(format!("synthesis request failed: {err}")))?;

        if !response.status().is_success() {
            return Err(voice_http_error("synthesis", response.status(), response).await);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| RozmovaError::voice(format!("failed to read synthesis body: {err}")))?;
        Ok(AudioBlob(bytes.to_vec()))
    }
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

async fn voice_http_error(
    operation: &str,
    status: StatusCode,
    response: reqwest::Response,
) -> RozmovaError {
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "failed to read error body".to_string());
    RozmovaError::voice(format!("{operation} returned HTTP {status}: {body}"))
}
