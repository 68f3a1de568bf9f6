use std::fmt;

use serde::{Deserialize, Serialize};

/// 64-bit identity of a token window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint(pub u64);

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Token view a fingerprint was computed over.
///
/// The kind owns the top bit of the fingerprint, so the two kinds can never
/// produce equal values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnippetKind {
    Exact,
    Structure,
}

impl SnippetKind {
    const fn tag_bit(self) -> u64 {
        match self {
            SnippetKind::Exact => 0,
            SnippetKind::Structure => 1 << 63,
        }
    }

    const fn salt(self) -> u64 {
        match self {
            SnippetKind::Exact => 0x45_58_41_43_54,
            SnippetKind::Structure => 0x53_54_52_55_43_54,
        }
    }

    /// Finalize a raw window hash into a fingerprint of this kind.
    pub(crate) fn seal(self, window_hash: u64) -> Fingerprint {
        Fingerprint((splitmix64(window_hash ^ self.salt()) >> 1) | self.tag_bit())
    }

    pub fn of(fingerprint: Fingerprint) -> SnippetKind {
        if fingerprint.0 & (1 << 63) == 0 {
            SnippetKind::Exact
        } else {
            SnippetKind::Structure
        }
    }
}

/// One window of `tokens_count` consecutive tokens inside a code unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Snippet {
    pub fingerprint: Fingerprint,
    pub kind: SnippetKind,
    /// Index of the code unit the window lies in.
    pub unit_index: usize,
    /// Offset of the first token within the submission's analyzed sequence.
    pub token_offset: usize,
    pub tokens_count: usize,
}

impl Snippet {
    /// Exclusive end offset in the analyzed sequence.
    pub fn token_end(&self) -> usize {
        self.token_offset + self.tokens_count
    }
}

pub(crate) fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_occupy_disjoint_halves() {
        for raw in [0u64, 1, 42, u64::MAX, 0xDEAD_BEEF] {
            let exact = SnippetKind::Exact.seal(raw);
            let structure = SnippetKind::Structure.seal(raw);
            assert_ne!(exact, structure);
            assert_eq!(SnippetKind::of(exact), SnippetKind::Exact);
            assert_eq!(SnippetKind::of(structure), SnippetKind::Structure);
        }
    }

    #[test]
    fn display_is_fixed_width_hex() {
        assert_eq!(Fingerprint(0xAB).to_string(), "00000000000000ab");
    }
}
