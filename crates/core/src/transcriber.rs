use crate::backend::{SpeechInput, SpeechToText};
use crate::error::TranscriptionError;
use crate::settings::Settings;
use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioFormat {
    Wav,
    Mp3,
    M4a,
    Flac,
    Ogg,
}

impl AudioFormat {
    pub const ALL: [AudioFormat; 5] = [
        AudioFormat::Wav,
        AudioFormat::Mp3,
        AudioFormat::M4a,
        AudioFormat::Flac,
        AudioFormat::Ogg,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::M4a => "m4a",
            AudioFormat::Flac => "flac",
            AudioFormat::Ogg => "ogg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::M4a => "audio/mp4",
            AudioFormat::Flac => "audio/flac",
            AudioFormat::Ogg => "audio/ogg",
        }
    }

    /// Guesses the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, TranscriptionError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| TranscriptionError::UnsupportedFormat(path.display().to_string()))?;
        ext.parse()
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for AudioFormat {
    type Err = TranscriptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().trim_start_matches('.').to_lowercase();
        AudioFormat::ALL
            .into_iter()
            .find(|format| format.extension() == tag)
            .ok_or_else(|| TranscriptionError::UnsupportedFormat(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub text: String,
    /// Known only for WAV input.
    pub duration_seconds: Option<f32>,
}

/// Validates recorded audio and turns it into text through a speech backend.
pub struct Transcriber {
    backend: Arc<dyn SpeechToText>,
    max_audio_bytes: usize,
}

impl Transcriber {
    pub fn new(backend: Arc<dyn SpeechToText>, settings: &Settings) -> Self {
        Self {
            backend,
            max_audio_bytes: settings.transcription.max_audio_bytes,
        }
    }

    /// Transcribes `audio` encoded as `format` (a tag such as `"wav"` or `".MP3"`).
    pub async fn transcribe(&self, audio: Vec<u8>, format: &str) -> Result<Transcript, TranscriptionError> {
        let format = format.parse::<AudioFormat>()?;
        self.transcribe_audio(audio, format).await
    }

    pub async fn transcribe_audio(
        &self,
        audio: Vec<u8>,
        format: AudioFormat,
    ) -> Result<Transcript, TranscriptionError> {
        if audio.is_empty() {
            return Err(TranscriptionError::Empty);
        }
        if audio.len() > self.max_audio_bytes {
            return Err(TranscriptionError::TooLarge {
                size: audio.len(),
                max: self.max_audio_bytes,
            });
        }

        let duration_seconds = match format {
            AudioFormat::Wav => Some(probe_wav(&audio)?),
            _ => None,
        };

        let size = audio.len();
        let text = self
            .backend
            .transcribe(SpeechInput { bytes: audio, format })
            .await
            .map_err(|e| {
                tracing::warn!("transcription backend failed: {:#}", e);
                TranscriptionError::Backend(format!("{e:#}"))
            })?;

        let text = text.trim();
        if text.is_empty() {
            return Err(TranscriptionError::EmptyTranscript);
        }

        tracing::info!(
            "transcribed {} bytes of {} audio into {} characters",
            size,
            format,
            text.len()
        );
        Ok(Transcript {
            text: text.to_string(),
            duration_seconds,
        })
    }
}

/// Reads the WAV header and returns the clip length in seconds.
fn probe_wav(audio: &[u8]) -> Result<f32, TranscriptionError> {
    let reader = hound::WavReader::new(Cursor::new(audio))
        .map_err(|e| TranscriptionError::InvalidAudio(e.to_string()))?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(TranscriptionError::InvalidAudio("sample rate is zero".to_string()));
    }
    Ok(reader.duration() as f32 / spec.sample_rate as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockSpeechToText;

    fn wav_bytes(seconds: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for _ in 0..(16_000 * seconds) {
                writer.write_sample(0i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    fn transcriber(mock: MockSpeechToText, max_audio_bytes: usize) -> Transcriber {
        let mut settings = Settings::default();
        settings.transcription.max_audio_bytes = max_audio_bytes;
        Transcriber::new(Arc::new(mock), &settings)
    }

    #[test]
    fn format_parsing() {
        assert_eq!(".WAV".parse::<AudioFormat>().unwrap(), AudioFormat::Wav);
        assert_eq!("m4a".parse::<AudioFormat>().unwrap(), AudioFormat::M4a);
        assert_eq!(
            AudioFormat::from_path(Path::new("/tmp/answer.Ogg")).unwrap(),
            AudioFormat::Ogg
        );
        assert!(matches!(
            "aiff".parse::<AudioFormat>(),
            Err(TranscriptionError::UnsupportedFormat(_))
        ));
        assert!(AudioFormat::from_path(Path::new("recording")).is_err());
    }

    #[tokio::test]
    async fn wav_is_probed_and_transcribed() {
        let mut mock = MockSpeechToText::new();
        mock.expect_transcribe()
            .withf(|input| input.format == AudioFormat::Wav && !input.bytes.is_empty())
            .times(1)
            .returning(|_| Ok("  I led a team of five engineers.\n".to_string()));

        let transcript = transcriber(mock, 1 << 20)
            .transcribe(wav_bytes(2), "wav")
            .await
            .unwrap();

        assert_eq!(transcript.text, "I led a team of five engineers.");
        assert_eq!(transcript.duration_seconds, Some(2.0));
    }

    #[tokio::test]
    async fn rejects_before_calling_backend() {
        let mut mock = MockSpeechToText::new();
        mock.expect_transcribe().never();
        let t = transcriber(mock, 64);

        assert!(matches!(t.transcribe(vec![], "wav").await, Err(TranscriptionError::Empty)));
        assert!(matches!(
            t.transcribe(vec![0; 65], "mp3").await,
            Err(TranscriptionError::TooLarge { size: 65, max: 64 })
        ));
        assert!(matches!(
            t.transcribe(vec![1, 2, 3], "wma").await,
            Err(TranscriptionError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            t.transcribe(b"not a riff header".to_vec(), "wav").await,
            Err(TranscriptionError::InvalidAudio(_))
        ));
    }

    #[tokio::test]
    async fn backend_failure_and_silence() {
        let mut failing = MockSpeechToText::new();
        failing
            .expect_transcribe()
            .returning(|_| Err(anyhow::anyhow!("OpenAI API error (500): boom")));
        let err = transcriber(failing, 1024)
            .transcribe(vec![7; 10], "mp3")
            .await
            .unwrap_err();
        assert!(matches!(err, TranscriptionError::Backend(ref m) if m.contains("boom")));

        let mut silent = MockSpeechToText::new();
        silent.expect_transcribe().returning(|_| Ok("   ".to_string()));
        let err = transcriber(silent, 1024)
            .transcribe(vec![7; 10], "flac")
            .await
            .unwrap_err();
        assert!(matches!(err, TranscriptionError::EmptyTranscript));
    }

    #[tokio::test]
    async fn compressed_formats_have_no_duration() {
        let mut mock = MockSpeechToText::new();
        mock.expect_transcribe().returning(|_| Ok("hello".to_string()));

        let transcript = transcriber(mock, 1024)
            .transcribe_audio(vec![1; 100], AudioFormat::Mp3)
            .await
            .unwrap();

        assert_eq!(transcript.duration_seconds, None);
    }
}
