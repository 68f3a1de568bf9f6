use std::sync::Arc;
use std::time::Instant;

use hashbrown::HashMap;
use index::{IndexError, SnippetIndex};
use snippets::{extract_snippets, Fingerprint, Snippet, SnippetConfig};
use stats::SuspicionLevels;
use submission::{AuthorId, Submission, SubmissionId};
use tokenize::{extract_code_units, token_positions, CodeUnit, Language, TokenPosition};
use tracing::info;

use crate::metrics::metrics_recorder;
use crate::types::{DetectError, DetectorConfig, PlagiarismMatch, TokenRange};


#[derive(Debug, Default)]
struct Candidate {
    author_id: Option<AuthorId>,
    weight: f64,
    shared: usize,
    own: Vec<(usize, usize)>,
    other: Vec<(usize, usize)>,
}

/// Sort and coalesce overlapping or touching ranges.
pub(crate) fn merge_ranges(mut ranges: Vec<(usize, usize)>) -> Vec<TokenRange> {
    ranges.sort_unstable();
    let mut out: Vec<TokenRange> = Vec::with_capacity(ranges.len());
    for (start, end) in ranges {
        match out.last_mut() {
            Some(last) if start <= last.end => last.end = last.end.max(end),
            _ => out.push(TokenRange { start, end }),
        }
    }
    out
}

/// Code units and snippets of a submission, as indexing extracts them.
#[derive(Debug, Clone)]
pub struct AnalyzedSubmission {
    pub units: Vec<CodeUnit>,
    pub snippets: Vec<Snippet>,
}

/// Read-only plagiarism search over a shared [`SnippetIndex`].
#[derive(Debug, Clone)]
pub struct PlagiarismDetector {
    index: Arc<SnippetIndex>,
    snippets: SnippetConfig,
    config: DetectorConfig,
}

impl PlagiarismDetector {
    pub fn new(
        index: Arc<SnippetIndex>,
        snippets: SnippetConfig,
        config: DetectorConfig,
    ) -> Result<Self, DetectError> {
        snippets.validate()?;
        config.validate()?;
        Ok(Self {
            index,
            snippets,
            config,
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn snippet_config(&self) -> &SnippetConfig {
        &self.snippets
    }

    /// Code units and snippets of `code`, exactly as indexing extracts them.
    pub fn analyze(&self, code: &str, language: Language) -> Result<AnalyzedSubmission, DetectError> {
        let units = extract_code_units(code, language);
        let snippets = extract_snippets(&units, &self.snippets)?;
        Ok(AnalyzedSubmission { units, snippets })
    }

    /// Token boundaries for highlighting; a pure tokenizer call.
    pub fn get_needed_tokens_positions(&self, code: &str, language: Language) -> Vec<TokenPosition> {
        token_positions(code, language)
    }

    /// Other authors' submissions in the task that `submission` resembles,
    /// strongest first.
    ///
    /// Candidates weighing less than `levels.faint` are dropped; at most
    /// `max_results` are returned, ties broken by submission id.
    pub fn get_plagiarisms(
        &self,
        submission: &Submission,
        levels: &SuspicionLevels,
    ) -> Result<Vec<PlagiarismMatch>, DetectError> {
        let analyzed = self.analyze(&submission.code, submission.language)?;
        self.get_plagiarisms_analyzed(submission, &analyzed, levels)
    }

    /// [`Self::get_plagiarisms`] for a submission the caller already analyzed.
    pub fn get_plagiarisms_analyzed(
        &self,
        submission: &Submission,
        analyzed: &AnalyzedSubmission,
        levels: &SuspicionLevels,
    ) -> Result<Vec<PlagiarismMatch>, DetectError> {
        let started = Instant::now();
        let candidates = self.candidates(submission, &analyzed.snippets)?;
        let candidates_count = candidates.len();

        let mut ranked: Vec<(SubmissionId, Candidate)> = candidates
            .into_iter()
            .filter(|(_, c)| c.weight >= levels.faint)
            .collect();
        ranked.sort_unstable_by(|(a_id, a), (b_id, b)| {
            b.weight.total_cmp(&a.weight).then(a_id.cmp(b_id))
        });
        ranked.truncate(self.config.max_results);

        let matches: Vec<PlagiarismMatch> = ranked
            .into_iter()
            .filter_map(|(id, c)| {
                Some(PlagiarismMatch {
                    submission_id: submission.id,
                    matched_submission_id: id,
                    matched_author_id: c.author_id?,
                    weight: c.weight,
                    suspicion: levels.classify(c.weight),
                    shared_fingerprints: c.shared,
                    matched_token_ranges: merge_ranges(c.own),
                    matched_token_ranges_in_other: merge_ranges(c.other),
                })
            })
            .collect();

        let latency = started.elapsed();
        info!(
            submission_id = %submission.id,
            task_id = %submission.task_id,
            snippets = analyzed.snippets.len(),
            candidates = candidates_count,
            matches = matches.len(),
            elapsed_ms = latency.as_millis() as u64,
            "plagiarism_check"
        );
        if let Some(recorder) = metrics_recorder() {
            recorder.record_check(submission.task_id, latency, candidates_count, matches.len());
        }
        Ok(matches)
    }

    fn candidates(
        &self,
        submission: &Submission,
        snippets: &[Snippet],
    ) -> Result<HashMap<SubmissionId, Candidate>, DetectError> {
        let mut own: HashMap<Fingerprint, Vec<(usize, usize)>> = HashMap::new();
        for s in snippets {
            own.entry(s.fingerprint)
                .or_default()
                .push((s.token_offset, s.token_end()));
        }

        let scan = self.index.with_task(submission.task_id, |shard| {
            let selected = self.config.search.select(
                shard,
                submission.author_id,
                snippets.iter().map(|s| s.fingerprint),
            );
            let mut acc: HashMap<SubmissionId, Candidate> = HashMap::new();
            for wf in &selected {
                let mut last = None;
                for posting in shard.postings(wf.fingerprint) {
                    if posting.submission_id == submission.id
                        || posting.author_id == submission.author_id
                    {
                        continue;
                    }
                    let candidate = acc.entry(posting.submission_id).or_default();
                    candidate.author_id = Some(posting.author_id);
                    candidate
                        .other
                        .push((posting.token_offset, posting.token_offset + posting.tokens_count));
                    if last != Some(posting.submission_id) {
                        last = Some(posting.submission_id);
                        candidate.weight += wf.weight;
                        candidate.shared += 1;
                        if let Some(ranges) = own.get(&wf.fingerprint) {
                            candidate.own.extend_from_slice(ranges);
                        }
                    }
                }
            }
            acc
        });

        match scan {
            Ok(acc) => Ok(acc),
            Err(IndexError::TaskNotFound(_)) => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}
