//! Prompt helpers for fingerprinting system prompts.

use sha2::{Digest, Sha256};

/// Compute a stable SHA-256 fingerprint for a prompt string.
pub fn hash_prompt(prompt: &str) -> String {
    let digest = Sha256::digest(prompt.as_bytes());
    digest.iter().map(|byte| format!("{:02x}", byte)).collect()
}

#[cfg(test)]
mod tests {
    use super::hash_prompt;

    #[test]
    fn test_hash_prompt_stable() {
        let first = hash_prompt("You are a marketing strategist.");
        let second = hash_prompt("You are a marketing strategist.");
        let different = hash_prompt("You are a support agent.");

        assert_eq!(first, second);
        assert_ne!(first, different);
        assert_eq!(first.len(), 64);
    }
}
