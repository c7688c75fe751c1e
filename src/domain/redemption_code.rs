//! Redemption codes: value type, generation, and the bounded candidate
//! sequence used while minting.
//!
//! A code is [`CODE_LENGTH`] characters drawn uniformly, with replacement,
//! from [`CODE_ALPHABET`]. The space holds 36^5 ≈ 60M values, so
//! collisions are rare; [`CodeMinter`] still caps retries at
//! [`MAX_CODE_ATTEMPTS`] so a broken uniqueness check cannot loop forever.

use std::fmt;
use std::sync::Arc;

use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Characters a redemption code may contain.
pub const CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Fixed length of every redemption code.
pub const CODE_LENGTH: usize = 5;

/// Candidates tried before minting gives up.
pub const MAX_CODE_ATTEMPTS: u32 = 100;

/// A syntactically valid redemption code (upper-case, 5 chars, `[A-Z0-9]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RedemptionCode(String);

impl RedemptionCode {
    /// Normalizes user input (trim + upper-case) and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidInput`] unless the normalized value is
    /// exactly [`CODE_LENGTH`] characters from [`CODE_ALPHABET`].
    pub fn parse(raw: &str) -> Result<Self, LedgerError> {
        let code = raw.trim().to_ascii_uppercase();
        if code.chars().count() != CODE_LENGTH {
            return Err(LedgerError::InvalidInput(format!(
                "redemption code must have {CODE_LENGTH} characters"
            )));
        }
        if !code.bytes().all(|b| CODE_ALPHABET.contains(&b)) {
            return Err(LedgerError::InvalidInput(
                "redemption code may only contain A-Z and 0-9".to_string(),
            ));
        }
        Ok(Self(code))
    }

    /// Returns the code text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RedemptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of candidate codes.
pub trait CodeGenerator: Send + Sync + fmt::Debug {
    /// Produces one candidate. Uniqueness is checked by the caller.
    fn generate(&self) -> RedemptionCode;
}

/// Uniform random generator backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> RedemptionCode {
        let mut rng = rand::rng();
        let code = (0..CODE_LENGTH)
            .map(|_| CODE_ALPHABET.choose(&mut rng).map_or('0', |b| char::from(*b)))
            .collect();
        RedemptionCode(code)
    }
}

/// Hands out at most `max_attempts` candidate codes per mint.
///
/// The store walks [`CodeMinter::candidates`] and keeps the first one the
/// registry accepts; running off the end is [`LedgerError::CodeSpaceExhausted`].
#[derive(Debug, Clone)]
pub struct CodeMinter {
    generator: Arc<dyn CodeGenerator>,
    max_attempts: u32,
}

impl CodeMinter {
    /// Creates a minter over the given generator and attempt budget.
    #[must_use]
    pub fn new(generator: Arc<dyn CodeGenerator>, max_attempts: u32) -> Self {
        Self {
            generator,
            max_attempts,
        }
    }

    /// Random generator with the default budget of [`MAX_CODE_ATTEMPTS`].
    #[must_use]
    pub fn random() -> Self {
        Self::new(Arc::new(RandomCodeGenerator), MAX_CODE_ATTEMPTS)
    }

    /// Returns the attempt budget.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Lazily yields up to `max_attempts` candidates.
    pub fn candidates(&self) -> impl Iterator<Item = RedemptionCode> + Send + '_ {
        (0..self.max_attempts).map(move |_| self.generator.generate())
    }

    /// Error returned when every candidate collided.
    #[must_use]
    pub const fn exhausted(&self) -> LedgerError {
        LedgerError::CodeSpaceExhausted {
            attempts: self.max_attempts,
        }
    }
}

impl Default for CodeMinter {
    fn default() -> Self {
        Self::random()
    }
}

/// Replays a fixed list of codes in order, cycling when it runs out.
///
/// Used to force collisions in tests and in deterministic local setups.
#[derive(Debug)]
pub struct SequenceCodeGenerator {
    codes: Vec<RedemptionCode>,
    cursor: std::sync::atomic::AtomicUsize,
}

impl SequenceCodeGenerator {
    /// Builds a generator from raw code strings.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidInput`] if the list is empty or any
    /// entry is not a valid code.
    pub fn new<I, S>(codes: I) -> Result<Self, LedgerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let codes = codes
            .into_iter()
            .map(|c| RedemptionCode::parse(c.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        if codes.is_empty() {
            return Err(LedgerError::InvalidInput(
                "code sequence must not be empty".to_string(),
            ));
        }
        Ok(Self {
            codes,
            cursor: std::sync::atomic::AtomicUsize::new(0),
        })
    }
}

impl CodeGenerator for SequenceCodeGenerator {
    fn generate(&self) -> RedemptionCode {
        let n = self
            .cursor
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let idx = n % self.codes.len();
        self.codes
            .get(idx)
            .cloned()
            .unwrap_or_else(|| RedemptionCode(String::from("00000")))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn random_codes_have_fixed_length_and_alphabet() {
        let generator = RandomCodeGenerator;
        for _ in 0..500 {
            let code = generator.generate();
            assert_eq!(code.as_str().len(), CODE_LENGTH);
            assert!(code.as_str().bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn random_codes_vary() {
        let generator = RandomCodeGenerator;
        let distinct: std::collections::HashSet<_> =
            (0..200).map(|_| generator.generate()).collect();
        assert!(distinct.len() > 190);
    }

    #[test]
    fn parse_normalizes_input() {
        let Ok(code) = RedemptionCode::parse("  ab1c9 ") else {
            panic!("valid code");
        };
        assert_eq!(code.as_str(), "AB1C9");
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert!(matches!(
            RedemptionCode::parse("ABCD"),
            Err(LedgerError::InvalidInput(_))
        ));
        assert!(matches!(
            RedemptionCode::parse("ABCDEF"),
            Err(LedgerError::InvalidInput(_))
        ));
    }

    #[test]
    fn parse_rejects_symbols() {
        assert!(RedemptionCode::parse("AB-12").is_err());
        assert!(RedemptionCode::parse("ÁBC12").is_err());
    }

    #[test]
    fn minter_yields_exactly_budget_candidates() {
        let minter = CodeMinter::new(Arc::new(RandomCodeGenerator), 7);
        assert_eq!(minter.candidates().count(), 7);
        assert!(matches!(
            minter.exhausted(),
            LedgerError::CodeSpaceExhausted { attempts: 7 }
        ));
    }

    #[test]
    fn sequence_generator_cycles() {
        let Ok(generator) = SequenceCodeGenerator::new(["AAAAA", "BBBBB"]) else {
            panic!("valid sequence");
        };
        let drawn: Vec<String> = (0..3).map(|_| generator.generate().to_string()).collect();
        assert_eq!(drawn, ["AAAAA", "BBBBB", "AAAAA"]);
    }

    #[test]
    fn sequence_generator_rejects_bad_input() {
        assert!(SequenceCodeGenerator::new(Vec::<String>::new()).is_err());
        assert!(SequenceCodeGenerator::new(["nope"]).is_err());
    }
}
