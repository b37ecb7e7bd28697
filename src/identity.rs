//! Adapter-side identifiers.
//!
//! The backend has no auto-increment columns, so synthetic row keys are
//! generated here as 36-character UUID-shaped strings.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use uuid::Uuid;

/// Field layout filled by the pseudo-random strategy.
const ID_PATTERN: &str = "xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx";

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// How identifiers are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentityStrategy {
    /// Random (version 4) UUIDs from the operating system's entropy source.
    #[default]
    Native,
    /// Hex digits from a fast non-cryptographic generator, laid out as a UUID.
    PseudoRandom,
}

impl IdentityStrategy {
    /// Parses a strategy name. Unknown names fall back to [`Self::Native`].
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pseudo_random" | "pseudo-random" | "pseudorandom" => Self::PseudoRandom,
            _ => Self::Native,
        }
    }
}

/// Generates synthetic row keys.
///
/// Identifiers are structurally well-formed and practically collision
/// resistant. They are not guaranteed to be unpredictable.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityGenerator {
    strategy: IdentityStrategy,
}

impl IdentityGenerator {
    /// Creates a generator using the given strategy.
    #[must_use]
    pub const fn new(strategy: IdentityStrategy) -> Self {
        Self { strategy }
    }

    /// Returns the configured strategy.
    #[must_use]
    pub const fn strategy(&self) -> IdentityStrategy {
        self.strategy
    }

    /// Returns a new identifier such as `1b4e28ba-2fa1-4d2b-883f-0016d3cca427`.
    #[must_use]
    pub fn next_id(&self) -> String {
        match self.strategy {
            IdentityStrategy::Native => Uuid::new_v4().hyphenated().to_string(),
            IdentityStrategy::PseudoRandom => pseudo_random_id(),
        }
    }
}

thread_local! {
    /// Seeded once per thread from the thread-local OS-seeded generator.
    static PSEUDO_RNG: RefCell<SmallRng> = RefCell::new(SmallRng::from_rng(&mut rand::rng()));
}

fn pseudo_random_id() -> String {
    PSEUDO_RNG.with_borrow_mut(|rng| {
        ID_PATTERN
            .chars()
            .map(|c| {
                if c == 'x' {
                    char::from(HEX_DIGITS[rng.random_range(0..HEX_DIGITS.len())])
                } else {
                    c
                }
            })
            .collect()
    })
}

/// Returns true if `id` has the 8-4-4-4-12 hex layout.
#[must_use]
pub fn is_well_formed(id: &str) -> bool {
    id.len() == ID_PATTERN.len()
        && id.chars().zip(ID_PATTERN.chars()).all(|(c, p)| {
            if p == '-' {
                c == '-'
            } else {
                c.is_ascii_hexdigit()
            }
        })
}
