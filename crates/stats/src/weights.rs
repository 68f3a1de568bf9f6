//! Rarity weights and the pairwise accumulation shared by the statistics
//! engine and the detector.

use hashbrown::{HashMap, HashSet};
use index::TaskShard;
use serde::{Deserialize, Serialize};
use snippets::Fingerprint;
use submission::{AuthorId, SubmissionId};

/// `1 / authors`, or zero for a fingerprint nobody has.
pub fn fingerprint_weight(distinct_authors: usize) -> f64 {
    if distinct_authors == 0 {
        0.0
    } else {
        1.0 / distinct_authors as f64
    }
}

/// A fingerprint picked for searching, with its rarity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedFingerprint {
    pub fingerprint: Fingerprint,
    pub authors: usize,
    pub weight: f64,
}

/// Which fingerprints of a submission take part in a search.
///
/// `max_snippet_authors` drops fingerprints shared by more authors than the
/// limit; `coldest_snippets_limit` keeps only the N rarest ones (ties broken
/// by fingerprint value). Both are off by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPolicy {
    #[serde(default)]
    pub max_snippet_authors: Option<usize>,
    #[serde(default)]
    pub coldest_snippets_limit: Option<usize>,
}

impl SearchPolicy {
    /// Distinct fingerprints of `author`'s submission with their weights.
    ///
    /// The author always counts towards a fingerprint's authors, whether or
    /// not the submission itself is indexed yet.
    pub fn select(
        &self,
        shard: &TaskShard,
        author: AuthorId,
        fingerprints: impl IntoIterator<Item = Fingerprint>,
    ) -> Vec<WeightedFingerprint> {
        let mut seen = HashSet::new();
        let mut selected: Vec<WeightedFingerprint> = fingerprints
            .into_iter()
            .filter(|fp| seen.insert(*fp))
            .map(|fingerprint| {
                let mut authors = shard.distinct_authors(fingerprint);
                if !shard.has_author(fingerprint, author) {
                    authors += 1;
                }
                WeightedFingerprint {
                    fingerprint,
                    authors,
                    weight: fingerprint_weight(authors),
                }
            })
            .filter(|wf| self.max_snippet_authors.map_or(true, |max| wf.authors <= max))
            .collect();

        if let Some(limit) = self.coldest_snippets_limit {
            selected.sort_unstable_by_key(|wf| (wf.authors, wf.fingerprint));
            selected.truncate(limit);
        }
        selected
    }
}

/// Adds `weight(f)` once per other-author submission sharing `f`.
///
/// `acc` is left for the caller to clear so one map can serve a whole task.
pub fn accumulate_pair_weights(
    shard: &TaskShard,
    submission: SubmissionId,
    author: AuthorId,
    selected: &[WeightedFingerprint],
    acc: &mut HashMap<SubmissionId, f64>,
) {
    for wf in selected {
        // postings of one submission are contiguous
        let mut last = None;
        for posting in shard.postings(wf.fingerprint) {
            if posting.submission_id == submission || posting.author_id == author {
                continue;
            }
            if last == Some(posting.submission_id) {
                continue;
            }
            last = Some(posting.submission_id);
            *acc.entry(posting.submission_id).or_insert(0.0) += wf.weight;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use index::SnippetIndex;
    use snippets::{Snippet, SnippetKind};
    use submission::TaskId;

    fn snippets(fps: &[u64]) -> Vec<Snippet> {
        fps.iter()
            .enumerate()
            .map(|(i, &fp)| Snippet {
                fingerprint: Fingerprint(fp),
                kind: SnippetKind::Exact,
                unit_index: 0,
                token_offset: i,
                tokens_count: 3,
            })
            .collect()
    }

    #[test]
    fn weight_is_inverse_author_count() {
        assert_eq!(fingerprint_weight(0), 0.0);
        assert_eq!(fingerprint_weight(1), 1.0);
        assert_eq!(fingerprint_weight(4), 0.25);
    }

    #[test]
    fn rarer_fingerprints_weigh_more() {
        let index = SnippetIndex::new();
        let task = TaskId::new_random();
        let authors: Vec<AuthorId> = (0..4).map(|_| AuthorId::new_random()).collect();
        index.insert(task, SubmissionId(1), authors[0], &snippets(&[1, 2])).unwrap();
        index.insert(task, SubmissionId(2), authors[1], &snippets(&[1, 2])).unwrap();
        index.insert(task, SubmissionId(3), authors[2], &snippets(&[1])).unwrap();
        index.insert(task, SubmissionId(4), authors[3], &snippets(&[1])).unwrap();

        let selected = index
            .with_task(task, |shard| {
                SearchPolicy::default().select(shard, authors[0], [Fingerprint(1), Fingerprint(2)])
            })
            .unwrap();
        assert_eq!(selected[0].authors, 4);
        assert_eq!(selected[1].authors, 2);
        assert!(selected[1].weight > selected[0].weight);
    }

    #[test]
    fn weight_never_grows_as_authors_join() {
        let index = SnippetIndex::new();
        let task = TaskId::new_random();
        let owner = AuthorId::new_random();
        index.insert(task, SubmissionId(1), owner, &snippets(&[7])).unwrap();
        let weight = || {
            index
                .with_task(task, |shard| {
                    SearchPolicy::default().select(shard, owner, [Fingerprint(7)])[0].weight
                })
                .unwrap()
        };

        let mut previous = weight();
        assert_eq!(previous, 1.0);
        for id in 2..6 {
            index
                .insert(task, SubmissionId(id), AuthorId::new_random(), &snippets(&[7]))
                .unwrap();
            let current = weight();
            assert!(current <= previous, "{current} > {previous}");
            previous = current;
        }
        assert_eq!(previous, 0.2);

        // another submission by a known author adds no author
        index.insert(task, SubmissionId(9), owner, &snippets(&[7])).unwrap();
        assert_eq!(weight(), previous);
    }

    #[test]
    fn unindexed_author_counts_itself() {
        let index = SnippetIndex::new();
        let task = TaskId::new_random();
        index
            .insert(task, SubmissionId(1), AuthorId::new_random(), &snippets(&[9]))
            .unwrap();
        let selected = index
            .with_task(task, |shard| {
                SearchPolicy::default().select(shard, AuthorId::new_random(), [Fingerprint(9), Fingerprint(10)])
            })
            .unwrap();
        assert_eq!(selected[0].weight, 0.5);
        assert_eq!(selected[1].weight, 1.0);
    }

    #[test]
    fn policy_limits_common_and_keeps_coldest() {
        let index = SnippetIndex::new();
        let task = TaskId::new_random();
        let authors: Vec<AuthorId> = (0..3).map(|_| AuthorId::new_random()).collect();
        index.insert(task, SubmissionId(1), authors[0], &snippets(&[1, 2, 3])).unwrap();
        index.insert(task, SubmissionId(2), authors[1], &snippets(&[1, 2])).unwrap();
        index.insert(task, SubmissionId(3), authors[2], &snippets(&[1])).unwrap();
        let fps = [Fingerprint(1), Fingerprint(2), Fingerprint(3)];

        let capped = SearchPolicy {
            max_snippet_authors: Some(2),
            coldest_snippets_limit: None,
        };
        let picked: Vec<Fingerprint> = index
            .with_task(task, |shard| capped.select(shard, authors[0], fps))
            .unwrap()
            .into_iter()
            .map(|wf| wf.fingerprint)
            .collect();
        assert_eq!(picked, vec![Fingerprint(2), Fingerprint(3)]);

        let coldest = SearchPolicy {
            max_snippet_authors: None,
            coldest_snippets_limit: Some(1),
        };
        let picked = index
            .with_task(task, |shard| coldest.select(shard, authors[0], fps))
            .unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].fingerprint, Fingerprint(3));
    }

    #[test]
    fn pair_weights_skip_self_and_same_author() {
        let index = SnippetIndex::new();
        let task = TaskId::new_random();
        let alice = AuthorId::new_random();
        let bob = AuthorId::new_random();
        index.insert(task, SubmissionId(1), alice, &snippets(&[1, 1, 2])).unwrap();
        index.insert(task, SubmissionId(2), alice, &snippets(&[1, 2])).unwrap();
        index.insert(task, SubmissionId(3), bob, &snippets(&[1, 1, 1])).unwrap();

        let acc = index
            .with_task(task, |shard| {
                let selected =
                    SearchPolicy::default().select(shard, alice, [Fingerprint(1), Fingerprint(2)]);
                let mut acc = HashMap::new();
                accumulate_pair_weights(shard, SubmissionId(1), alice, &selected, &mut acc);
                acc
            })
            .unwrap();
        assert_eq!(acc.len(), 1);
        // fingerprint 1 is shared by two authors and counted once
        assert_eq!(acc[&SubmissionId(3)], 0.5);
    }
}
