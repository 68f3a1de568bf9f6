//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use antiplag::{
    AntiPlagiarism, AntiplagConfig, AuthorId, NewSubmission, SubmissionId, TaskId,
};
use snippets::FingerprintMode;
use stats::{LevelBounds, SuspicionConfig};

/// The program two authors hand in verbatim.
pub const COPIED_PROGRAM: &str = "\
def solve(values, limit):
    total = 0
    for value in values:
        if value > limit:
            total += value * 2
    return total
";

/// A program no other author writes: every identifier carries `seed`.
pub fn unique_program(seed: usize) -> String {
    format!(
        "def helper_{seed}(arg_{seed}, other_{seed}):\n    return arg_{seed} * {seed} + other_{seed}\n"
    )
}

/// Small windows, exact fingerprints and thresholds low enough for a
/// handful of submissions to produce matches.
pub fn test_config() -> AntiplagConfig {
    let mut config = AntiplagConfig::default();
    config.snippets.window = 5;
    config.snippets.mode = FingerprintMode::Exact;
    config.statistics = SuspicionConfig {
        faint_coefficient: 1.0,
        strong_coefficient: 2.0,
        faint: LevelBounds::new(0.1, 1000.0),
        strong: LevelBounds::new(0.2, 1000.0),
    };
    config
}

pub fn service() -> AntiPlagiarism {
    AntiPlagiarism::open(test_config()).unwrap()
}

pub fn submit(
    service: &AntiPlagiarism,
    task: TaskId,
    author: AuthorId,
    language: &str,
    code: &str,
) -> SubmissionId {
    let added = service
        .add_submission(NewSubmission {
            task_id: task,
            author_id: author,
            language: language.to_string(),
            code: code.to_string(),
            additional_info: None,
        })
        .unwrap();
    service.index_submission(added.submission_id).unwrap();
    added.submission_id
}

/// Two copies by different authors plus `unique` unrelated submissions.
/// Returns the copies' ids and authors.
pub fn seed_task(
    service: &AntiPlagiarism,
    task: TaskId,
    unique: usize,
) -> [(SubmissionId, AuthorId); 2] {
    let a = AuthorId::new_random();
    let b = AuthorId::new_random();
    let first = submit(service, task, a, "python", COPIED_PROGRAM);
    for seed in 0..unique {
        submit(service, task, AuthorId::new_random(), "python", &unique_program(seed));
    }
    let second = submit(service, task, b, "python", COPIED_PROGRAM);
    [(first, a), (second, b)]
}
