//! Turning user input into a `/recommend` request body.

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::clients::{
    entities::{MoodInput, RecommendRequest},
    errors::{Error, Result},
};

pub const EMPTY_MOOD: &str = "Please enter a mood";
pub const INVALID_MOOD: &str = "Mood can contain letters and spaces only";
pub const EMPTY_IMAGE: &str = "Image file is empty";

/// Trim `raw` and check it against `^[A-Za-z ]+$`.
pub fn validate_mood(raw: &str) -> Result<&str> {
    let mood = raw.trim();
    if mood.is_empty() {
        return Err(Error::InvalidMood(EMPTY_MOOD.into()));
    }
    if !mood.chars().all(|c| c.is_ascii_alphabetic() || c == ' ') {
        return Err(Error::InvalidMood(INVALID_MOOD.into()));
    }
    Ok(mood)
}

pub fn encode_image(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Build the request body, or fail without touching the network.
pub fn to_request(input: &MoodInput) -> Result<RecommendRequest> {
    match input {
        MoodInput::Text(raw) => Ok(RecommendRequest::Mood(validate_mood(raw)?.to_owned())),
        MoodInput::Image(bytes) if bytes.is_empty() => {
            Err(Error::InvalidMood(EMPTY_IMAGE.into()))
        }
        MoodInput::Image(bytes) => Ok(RecommendRequest::Image(encode_image(bytes))),
    }
}
