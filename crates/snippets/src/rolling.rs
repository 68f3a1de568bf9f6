//! Per-token hashing and the O(n) polynomial rolling window hash.

use tokenize::Token;
use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::fingerprint::{splitmix64, SnippetKind};

/// Hash one token under the given view.
///
/// The kind tag is folded into the seed so `Identifier("x")` and
/// `String("x")` never hash alike. In the structure view renamable tokens
/// hash their tag alone.
pub fn token_hash(token: &Token, kind: SnippetKind, seed: u64) -> u64 {
    let tag_seed = seed ^ splitmix64(u64::from(token.kind.tag()));
    match kind {
        SnippetKind::Structure if token.kind.is_renamable() => xxh3_64_with_seed(&[], tag_seed),
        SnippetKind::Exact | SnippetKind::Structure => {
            xxh3_64_with_seed(token.value.as_bytes(), tag_seed)
        }
    }
}

/// Rolling hashes of every `window`-long run of `hashes`, in order.
///
/// Returns `hashes.len() - window + 1` values, or nothing when the input is
/// shorter than the window.
pub fn rolling_hashes(hashes: &[u64], window: usize, seed: u64) -> Vec<u64> {
    let n = hashes.len();
    if window == 0 || n < window {
        return Vec::new();
    }

    const BASE: u64 = 1_000_003;
    let base = BASE ^ splitmix64(seed);

    // base^(window-1), to drop the oldest element in O(1).
    let mut base_top = 1u64;
    for _ in 1..window {
        base_top = base_top.wrapping_mul(base);
    }

    let mut out = Vec::with_capacity(n - window + 1);
    let mut h = 0u64;
    for &val in hashes.iter().take(window) {
        h = h.wrapping_mul(base).wrapping_add(val);
    }
    out.push(h);

    for (&old, &new) in hashes.iter().zip(hashes.iter().skip(window)) {
        h = h.wrapping_sub(old.wrapping_mul(base_top));
        h = h.wrapping_mul(base).wrapping_add(new);
        out.push(h);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenize::TokenKind;

    fn token(kind: TokenKind, value: &str) -> Token {
        Token {
            kind,
            value: value.to_string(),
            position: 0,
            length: value.len(),
            line: 1,
            column: 0,
        }
    }

    #[test]
    fn empty_and_short_inputs() {
        assert!(rolling_hashes(&[], 3, 7).is_empty());
        assert!(rolling_hashes(&[1, 2], 3, 7).is_empty());
        assert!(rolling_hashes(&[1, 2, 3], 0, 7).is_empty());
        assert_eq!(rolling_hashes(&[1, 2, 3], 3, 7).len(), 1);
    }

    #[test]
    fn count_is_n_minus_window_plus_one() {
        let hashes: Vec<u64> = (0..1000).collect();
        assert_eq!(rolling_hashes(&hashes, 100, 0).len(), 901);
    }

    #[test]
    fn rolling_matches_direct_computation() {
        let hashes: Vec<u64> = (0..20u64).map(splitmix64).collect();
        let window = 5;
        let seed = 99;
        let rolled = rolling_hashes(&hashes, window, seed);
        for (start, &value) in rolled.iter().enumerate() {
            let direct = rolling_hashes(&hashes[start..start + window], window, seed);
            assert_eq!(direct, vec![value], "window at {start}");
        }
    }

    #[test]
    fn order_matters() {
        let a = rolling_hashes(&[1, 2, 3], 2, 0);
        let b = rolling_hashes(&[3, 2, 1], 2, 0);
        assert_ne!(a, b);
    }

    #[test]
    fn structure_view_ignores_names_but_not_kinds() {
        let a = token(TokenKind::Identifier, "total");
        let b = token(TokenKind::Identifier, "sum");
        let s = token(TokenKind::String, "total");
        assert_eq!(
            token_hash(&a, SnippetKind::Structure, 0),
            token_hash(&b, SnippetKind::Structure, 0)
        );
        assert_ne!(
            token_hash(&a, SnippetKind::Exact, 0),
            token_hash(&b, SnippetKind::Exact, 0)
        );
        assert_ne!(
            token_hash(&a, SnippetKind::Exact, 0),
            token_hash(&s, SnippetKind::Exact, 0)
        );
        assert_ne!(
            token_hash(&a, SnippetKind::Structure, 0),
            token_hash(&s, SnippetKind::Structure, 0)
        );
    }

    #[test]
    fn keywords_keep_their_value_in_structure_view() {
        let r#for = token(TokenKind::Keyword, "for");
        let r#while = token(TokenKind::Keyword, "while");
        assert_ne!(
            token_hash(&r#for, SnippetKind::Structure, 0),
            token_hash(&r#while, SnippetKind::Structure, 0)
        );
    }
}
