//! Digit recognition for rendered keypad button faces.
//!
//! The Tesseract-backed recognizer is only built with the `ocr` feature so
//! the library and its mock-driven tests compile without the system
//! Tesseract/Leptonica libraries.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecognitionError {
    /// The engine produced a candidate that is not a single digit 0-9. This
    /// is distinct from the engine finding nothing at all.
    #[error("recognizer returned an unparseable candidate: {candidate:?}")]
    UnparseableCandidate { candidate: String },

    /// The recognition engine rejected or failed on the image.
    #[error("recognition engine failed: {0}")]
    Engine(String),

    /// The blocking recognition task could not be joined.
    #[error("recognition task failed: {0}")]
    Join(String),
}

/// Reads a single digit off a keypad button image.
#[async_trait]
pub trait DigitRecognizer: Send + Sync {
    /// Returns the recognized digit, or `None` when the engine produced no
    /// usable candidate at all.
    async fn recognize(&self, image: &[u8]) -> Result<Option<u8>, RecognitionError>;
}

/// Interpret an engine's raw text output as a digit.
///
/// Only the first output line is consulted. An empty candidate means the
/// engine found nothing; any candidate that is not exactly one ASCII digit is
/// a format error rather than a miss.
pub fn digit_from_candidate(raw: &str) -> Result<Option<u8>, RecognitionError> {
    let candidate = raw.lines().next().unwrap_or("").trim();
    if candidate.is_empty() {
        return Ok(None);
    }

    let mut chars = candidate.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) if ch.is_ascii_digit() => Ok(Some(ch as u8 - b'0')),
        _ => Err(RecognitionError::UnparseableCandidate {
            candidate: candidate.to_string(),
        }),
    }
}

/// Tesseract-backed recognizer, restricted to the digit alphabet.
#[cfg(feature = "ocr")]
pub struct TesseractRecognizer {
    tessdata_path: Option<std::path::PathBuf>,
}

#[cfg(feature = "ocr")]
impl TesseractRecognizer {
    /// `tessdata_path` overrides the engine's trained-data directory; `None`
    /// uses the system default.
    pub fn new(tessdata_path: Option<std::path::PathBuf>) -> Self {
        Self { tessdata_path }
    }

    fn extract_text(tessdata: Option<&str>, image: &[u8]) -> Result<String, RecognitionError> {
        let mut engine = leptess::LepTess::new(tessdata, "eng")
            .map_err(|err| RecognitionError::Engine(err.to_string()))?;

        // Single-character page segmentation, digits only: the engine must
        // not be allowed to guess letters or punctuation.
        engine
            .set_variable(leptess::Variable::TesseditPagesegMode, "10")
            .map_err(|err| RecognitionError::Engine(err.to_string()))?;
        engine
            .set_variable(leptess::Variable::TesseditCharWhitelist, "0123456789")
            .map_err(|err| RecognitionError::Engine(err.to_string()))?;

        engine
            .set_image_from_mem(image)
            .map_err(|err| RecognitionError::Engine(err.to_string()))?;

        engine
            .get_utf8_text()
            .map_err(|err| RecognitionError::Engine(err.to_string()))
    }
}

#[cfg(feature = "ocr")]
#[async_trait]
impl DigitRecognizer for TesseractRecognizer {
    async fn recognize(&self, image: &[u8]) -> Result<Option<u8>, RecognitionError> {
        let tessdata = self
            .tessdata_path
            .as_ref()
            .map(|path| path.to_string_lossy().to_string());
        let image = image.to_vec();

        // Tesseract is synchronous; keep it off the runtime threads.
        let raw = tokio::task::spawn_blocking(move || {
            Self::extract_text(tessdata.as_deref(), &image)
        })
        .await
        .map_err(|err| RecognitionError::Join(err.to_string()))??;

        digit_from_candidate(&raw)
    }
}
