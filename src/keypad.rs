//! Resolution of the randomized image keypad.
//!
//! The portal shuffles ten buttons on every login attempt and renders each
//! button's digit as a PNG embedded in its `background-image` style. Sorting
//! the buttons by their recognized digit yields a digit-indexed mapping that
//! is independent of screen order, which is what defeats the shuffle.

use std::sync::LazyLock;

use base64::Engine;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::ocr::{DigitRecognizer, RecognitionError};

/// Twelve-byte IEND chunk that terminates a well-formed PNG stream.
const PNG_IEND: [u8; 12] = [
    0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

static DATA_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\("data:image/png;base64,([^"]+)"\)"#).expect("pattern is valid")
});

#[derive(Debug, Error)]
pub enum KeypadError {
    /// The button's style value did not embed a base64 PNG payload.
    #[error("could not extract image data from style value: {style}")]
    ImageExtraction { style: String },

    /// The decoded payload never terminates its PNG stream.
    #[error("keypad image is missing the PNG end-of-image marker")]
    MalformedImage,

    /// Recognition produced nothing for one button face.
    #[error("could not recognize a digit for the button styled: {style}")]
    Recognition { style: String },

    /// The recognized digits do not cover 0-9 exactly once.
    #[error("recognized digits are not a 0-9 bijection: {digits:?}")]
    IncompleteDigitSet { digits: Vec<u8> },

    #[error(transparent)]
    Format(#[from] RecognitionError),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("password contains a character that is not a digit")]
pub struct PasswordError;

/// One on-screen button together with its rendered face's style value.
#[derive(Debug, Clone)]
pub struct KeypadButton<E> {
    element: E,
    style: String,
}

impl<E> KeypadButton<E> {
    pub fn new(element: E, style: impl Into<String>) -> Self {
        Self {
            element,
            style: style.into(),
        }
    }
}

/// Extract and decode the base64 PNG payload embedded in a
/// `background-image` style value.
pub fn extract_image(style: &str) -> Result<Vec<u8>, KeypadError> {
    let payload = DATA_URI
        .captures(style)
        .and_then(|captures| captures.get(1))
        .ok_or_else(|| KeypadError::ImageExtraction {
            style: style.to_string(),
        })?;

    base64::engine::general_purpose::STANDARD
        .decode(payload.as_str())
        .map_err(|_| KeypadError::ImageExtraction {
            style: style.to_string(),
        })
}

/// Drop everything after the first PNG end-of-image marker.
///
/// The portal appends trailing bytes after the logical end of the stream,
/// which some decoders reject. Truncation keeps the marker itself, so the
/// operation is idempotent.
pub fn normalize_image(bytes: &[u8]) -> Result<Vec<u8>, KeypadError> {
    let end = bytes
        .windows(PNG_IEND.len())
        .position(|window| window == PNG_IEND)
        .ok_or(KeypadError::MalformedImage)?;

    Ok(bytes[..end + PNG_IEND.len()].to_vec())
}

/// Builds the digit-indexed button mapping for one rendered keypad.
pub struct KeypadResolver<R> {
    recognizer: R,
}

impl<R: DigitRecognizer> KeypadResolver<R> {
    pub fn new(recognizer: R) -> Self {
        Self { recognizer }
    }

    /// Recognize every button face and assemble the keypad, sorted by digit.
    ///
    /// Publishing is atomic: any unrecognized button, and any digit set that
    /// is not exactly 0-9, fails the whole resolution rather than producing
    /// a partial or corrupted mapping.
    pub async fn resolve<E>(
        &self,
        buttons: Vec<KeypadButton<E>>,
    ) -> Result<RecognizedKeypad<E>, KeypadError> {
        let mut recognized = Vec::with_capacity(buttons.len());

        for button in buttons {
            let image = normalize_image(&extract_image(&button.style)?)?;
            let digit = self
                .recognizer
                .recognize(&image)
                .await?
                .ok_or_else(|| KeypadError::Recognition {
                    style: button.style.clone(),
                })?;
            recognized.push((digit, button.element));
        }

        recognized.sort_by_key(|(digit, _)| *digit);

        let digits: Vec<u8> = recognized.iter().map(|(digit, _)| *digit).collect();
        if digits != (0..10u8).collect::<Vec<_>>() {
            return Err(KeypadError::IncompleteDigitSet { digits });
        }

        debug!("keypad resolved to a clean digit ordering");
        Ok(RecognizedKeypad {
            buttons: recognized.into_iter().map(|(_, element)| element).collect(),
        })
    }
}

/// Digit-indexed view of one login attempt's keypad.
///
/// Only [`KeypadResolver::resolve`] constructs this, and only after the
/// recognized digits passed the bijection check, so an existing value always
/// holds exactly one button per digit.
#[derive(Debug)]
pub struct RecognizedKeypad<E> {
    buttons: Vec<E>,
}

impl<E> RecognizedKeypad<E> {
    pub fn button_for(&self, digit: u8) -> Option<&E> {
        self.buttons.get(digit as usize)
    }

    /// Translate a numeric password into the buttons to click, in entry
    /// order. An empty password yields an empty sequence.
    pub fn click_sequence(&self, password: &str) -> Result<Vec<&E>, PasswordError> {
        password
            .chars()
            .map(|ch| {
                let digit = ch.to_digit(10).ok_or(PasswordError)?;
                self.buttons.get(digit as usize).ok_or(PasswordError)
            })
            .collect()
    }
}
