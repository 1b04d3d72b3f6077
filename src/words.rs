use std::fs;
use std::path::Path;

use thiserror::Error;

/// Shortest custom text accepted for a reading run
pub const MIN_CUSTOM_WORDS: usize = 20;

#[derive(Debug, Error)]
pub enum TextError {
    #[error("text has {found} words, at least {min} are needed", min = MIN_CUSTOM_WORDS)]
    TooFewWords { found: usize },
    #[error("no passage with id {0:?}")]
    UnknownPassage(String),
    #[error("no bundled passages are available")]
    NoPassages,
    #[error("unable to read text: {0}")]
    Io(#[from] std::io::Error),
}

/// Split text on whitespace into the word sequence the engine displays
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Tokenize user supplied text, rejecting texts too short to train on
pub fn custom_words(text: &str) -> Result<Vec<String>, TextError> {
    let words = tokenize(text);
    if words.len() < MIN_CUSTOM_WORDS {
        return Err(TextError::TooFewWords { found: words.len() });
    }
    Ok(words)
}

pub fn words_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<String>, TextError> {
    let text = fs::read_to_string(path)?;
    custom_words(&text)
}
