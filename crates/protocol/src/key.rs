use crate::candidate::CandidateContent;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Texts at or below this normalized length keep the text itself as the key,
/// which keeps keys readable in logs and test fixtures. Longer texts are
/// hashed over their full normalized form so that distinct documents sharing
/// a prefix cannot collide.
const INLINE_KEY_MAX_CHARS: usize = 80;

/// Deterministic identity of a candidate, used as the deduplication unit.
///
/// Two candidates with equal keys are folded into one fused result. Keys are
/// totally ordered so that score ties can be broken deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    pub fn from_content(content: &CandidateContent) -> Self {
        match content {
            CandidateContent::Text { body } => Self::from_text(body),
            CandidateContent::Entity { name, .. } => Self::from_entity(name),
        }
    }

    pub fn from_text(text: &str) -> Self {
        let normalized = normalize(text);
        if normalized.chars().count() <= INLINE_KEY_MAX_CHARS {
            return CanonicalKey(normalized);
        }
        let digest = Sha256::digest(normalized.as_bytes());
        let mut hex = String::with_capacity(7 + 32);
        hex.push_str("sha256:");
        for byte in &digest[..16] {
            hex.push_str(&format!("{byte:02x}"));
        }
        CanonicalKey(hex)
    }

    pub fn from_entity(name: &str) -> Self {
        CanonicalKey(normalize(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
