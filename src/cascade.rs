//! Ordered fallback over URL variants.
//!
//! The API accepts several spellings of the same request (resource segment,
//! revision, query parameter name). Callers enumerate them as candidates and
//! hand them to [`run_cascade`], which tries each one in turn.

use tracing::{debug, error};

use crate::error::DriverError;

/// Revisions tried after the configured one.
pub const FALLBACK_REVISIONS: [&str; 2] = ["master", "main"];

/// Configured revision first, then the fallbacks, skipping case-insensitive duplicates.
pub fn revision_candidates(configured: &str) -> Vec<String> {
    let mut revisions: Vec<String> = Vec::with_capacity(1 + FALLBACK_REVISIONS.len());
    let configured = configured.trim();
    let all = std::iter::once(configured).chain(FALLBACK_REVISIONS);

    for revision in all {
        if revision.is_empty() {
            continue;
        }
        if revisions
            .iter()
            .any(|seen| seen.eq_ignore_ascii_case(revision))
        {
            continue;
        }
        revisions.push(revision.to_string());
    }

    revisions
}

/// One URL variant to try.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub segment: &'static str,
    pub revision: String,
    /// Name of the path query parameter, for endpoints that have variants.
    pub path_param: Option<&'static str>,
}

/// Every segment × revision combination, segments outermost.
pub fn candidates(segments: &[&'static str], revisions: &[String]) -> Vec<Candidate> {
    candidates_with_params(segments, revisions, &[])
}

/// Every segment × revision × parameter-name combination, in that nesting order.
pub fn candidates_with_params(
    segments: &[&'static str],
    revisions: &[String],
    params: &[&'static str],
) -> Vec<Candidate> {
    let mut out = Vec::new();
    for &segment in segments {
        for revision in revisions {
            if params.is_empty() {
                out.push(Candidate {
                    segment,
                    revision: revision.clone(),
                    path_param: None,
                });
                continue;
            }
            for &param in params {
                out.push(Candidate {
                    segment,
                    revision: revision.clone(),
                    path_param: Some(param),
                });
            }
        }
    }
    out
}

/// Tries `attempt` on each candidate until one succeeds.
///
/// Failures are remembered and the next candidate is tried. A cancellation
/// stops the cascade at once. When nothing succeeds, the last failure is
/// returned, or [`DriverError::Exhausted`] if no candidate ran.
pub fn run_cascade<C, T, F>(
    operation: &'static str,
    candidates: impl IntoIterator<Item = C>,
    mut attempt: F,
) -> Result<T, DriverError>
where
    C: std::fmt::Debug,
    F: FnMut(&C) -> Result<T, DriverError>,
{
    let mut last_error = None;

    for candidate in candidates {
        match attempt(&candidate) {
            Ok(value) => return Ok(value),
            Err(err) if err.is_cancelled() => return Err(err),
            Err(err) => {
                debug!("{operation}: candidate {candidate:?} failed: {err}");
                last_error = Some(err);
            }
        }
    }

    error!("{operation}: all strategies failed");
    Err(last_error.unwrap_or(DriverError::Exhausted { operation }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_revision_comes_first() {
        assert_eq!(revision_candidates("v2"), vec!["v2", "master", "main"]);
    }

    #[test]
    fn duplicate_revisions_are_dropped_case_insensitively() {
        assert_eq!(revision_candidates("master"), vec!["master", "main"]);
        assert_eq!(revision_candidates("MAIN"), vec!["MAIN", "master"]);
        assert_eq!(revision_candidates(""), vec!["master", "main"]);
    }

    #[test]
    fn candidates_nest_segment_then_revision_then_param() {
        let revisions = revision_candidates("master");
        let all = candidates_with_params(&["datasets", "dataset"], &revisions, &["Root", "Path"]);

        assert_eq!(all.len(), 8);
        assert_eq!(
            all[0],
            Candidate {
                segment: "datasets",
                revision: "master".into(),
                path_param: Some("Root"),
            }
        );
        assert_eq!(all[1].path_param, Some("Path"));
        assert_eq!(all[2].revision, "main");
        assert_eq!(all[4].segment, "dataset");
    }

    #[test]
    fn cascade_returns_first_success() {
        let mut tried = Vec::new();
        let result = run_cascade("test", [1, 2, 3], |n| {
            tried.push(*n);
            if *n == 2 {
                Ok("two")
            } else {
                Err(DriverError::HttpStatus {
                    url: "u".into(),
                    status: 500,
                })
            }
        });

        assert_eq!(result.expect("success"), "two");
        assert_eq!(tried, vec![1, 2]);
    }

    #[test]
    fn cascade_reports_last_error() {
        let result: Result<(), _> = run_cascade("test", [400u16, 500], |status| {
            Err(DriverError::HttpStatus {
                url: "u".into(),
                status: *status,
            })
        });
        assert_eq!(result.expect_err("should fail").status(), Some(500));
    }

    #[test]
    fn cascade_stops_on_cancellation() {
        let mut calls = 0;
        let result: Result<(), _> = run_cascade("test", [1, 2, 3], |_| {
            calls += 1;
            Err(DriverError::Cancelled)
        });
        assert!(result.expect_err("should fail").is_cancelled());
        assert_eq!(calls, 1);
    }

    #[test]
    fn empty_cascade_is_exhausted() {
        let result: Result<(), _> = run_cascade("list", Vec::<u8>::new(), |_| Ok(()));
        assert!(matches!(
            result,
            Err(DriverError::Exhausted { operation: "list" })
        ));
    }
}
