//! Word supply: providers, the refill queue and difficulty mutation.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;
use thiserror::Error;
use tracing::warn;
use tycoon_core::Difficulty;

const EMBEDDED_WORDS: &str = include_str!("../assets/words.txt");

/// Words are drawn within this many characters of the requested average.
const LENGTH_WINDOW: usize = 2;

const SYMBOLS: &[char] = &['!', '@', '#', '$', '%', '&', '*', '?'];

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    #[error("word list is empty")]
    Empty,
    #[error("invalid average length {0}")]
    InvalidLength(f64),
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// Source of random words near a requested average length.
pub trait WordProvider {
    fn random_words(&mut self, count: usize, average_length: f64)
        -> Result<Vec<String>, ProviderError>;
}

/// Provider backed by an in-memory word list.
#[derive(Clone, Debug)]
pub struct LocalWordProvider {
    words: Vec<String>,
    rng: ChaCha8Rng,
}

impl LocalWordProvider {
    /// Provider over the built-in list.
    pub fn new(seed: u64) -> Self {
        let words = EMBEDDED_WORDS
            .lines()
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        Self::with_words(words, seed)
    }

    pub fn with_words(words: Vec<String>, seed: u64) -> Self {
        Self {
            words,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Words within the length window, or the closest lengths when none are.
    fn candidates(&self, target: usize) -> Vec<&str> {
        let distance = |w: &String| w.chars().count().abs_diff(target);
        let near: Vec<&str> = self
            .words
            .iter()
            .filter(|w| distance(w) <= LENGTH_WINDOW)
            .map(String::as_str)
            .collect();
        if !near.is_empty() {
            return near;
        }
        let Some(closest) = self.words.iter().map(distance).min() else {
            return Vec::new();
        };
        self.words
            .iter()
            .filter(|w| distance(w) == closest)
            .map(String::as_str)
            .collect()
    }
}

impl WordProvider for LocalWordProvider {
    fn random_words(
        &mut self,
        count: usize,
        average_length: f64,
    ) -> Result<Vec<String>, ProviderError> {
        if !average_length.is_finite() || average_length < 0.0 {
            return Err(ProviderError::InvalidLength(average_length));
        }
        let target = average_length.round() as usize;
        let pool: Vec<String> = self
            .candidates(target)
            .into_iter()
            .map(str::to_string)
            .collect();
        if pool.is_empty() {
            return Err(ProviderError::Empty);
        }
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            if let Some(w) = pool.choose(&mut self.rng) {
                out.push(w.clone());
            }
        }
        Ok(out)
    }
}

/// Apply the enabled difficulty options to a word.
///
/// Upper case hits the first letter and roughly one letter in five; numbers
/// and symbols append one character each.
pub fn mutate_word<R: Rng + ?Sized>(word: &str, difficulty: &Difficulty, rng: &mut R) -> String {
    let mut out: String = if difficulty.upper {
        word.chars()
            .enumerate()
            .map(|(i, c)| {
                if i == 0 || rng.gen_bool(0.2) {
                    c.to_ascii_uppercase()
                } else {
                    c
                }
            })
            .collect()
    } else {
        word.to_string()
    };
    if difficulty.numbers {
        out.push(char::from(b'0' + rng.gen_range(0..10u8)));
    }
    if difficulty.symbols {
        if let Some(s) = SYMBOLS.choose(rng) {
            out.push(*s);
        }
    }
    out
}

/// Buffered words from a provider; failures keep the current word.
#[derive(Debug)]
pub struct WordQueue<P> {
    provider: P,
    pending: VecDeque<String>,
    current: Option<String>,
    batch: usize,
}

impl<P: WordProvider> WordQueue<P> {
    pub fn new(provider: P, batch: usize) -> Self {
        Self {
            provider,
            pending: VecDeque::new(),
            current: None,
            batch: batch.max(1),
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Move to the next word, refilling from the provider when empty.
    pub fn advance(&mut self, average_length: f64) -> Option<&str> {
        if self.pending.is_empty() {
            match self.provider.random_words(self.batch, average_length) {
                Ok(words) => self.pending.extend(words),
                Err(e) => {
                    warn!(error = %e, "word fetch failed; keeping current word");
                    return self.current.as_deref();
                }
            }
        }
        if let Some(next) = self.pending.pop_front() {
            self.current = Some(next);
        }
        self.current.as_deref()
    }

    /// Drop buffered words, e.g. after the average length changed.
    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }
}
