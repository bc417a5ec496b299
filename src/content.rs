//! Chirp body checks applied before a chirp reaches the repository.

use crate::error::{Result, StoreError};

/// Maximum body length in characters.
pub const MAX_CHIRP_LEN: usize = 140;

/// Words replaced by [`MASK`], matched case-insensitively.
pub const PROFANE_WORDS: &[&str] = &["kerfuffle", "sharbert", "fornax"];

pub const MASK: &str = "****";

/// Validate length, then mask profane words.
pub fn prepare_body(body: &str) -> Result<String> {
    validate_length(body)?;
    Ok(clean_body(body))
}

pub fn validate_length(body: &str) -> Result<()> {
    if body.chars().count() > MAX_CHIRP_LEN {
        return Err(StoreError::Validation("chirp is too long".into()));
    }
    Ok(())
}

/// Replace whole profane words. Whitespace runs collapse to single spaces.
pub fn clean_body(body: &str) -> String {
    body.split_whitespace()
        .map(|word| {
            let lowered = word.to_lowercase();
            if PROFANE_WORDS.contains(&lowered.as_str()) {
                MASK
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
