//! Property-based tests for the query layer.
//!
//! The single-result assertion must classify exactly on the materialized
//! match count (zero, one, or more-than-one) for any population, and
//! predicate filtering must return precisely the matching subset.

use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use strata_repository::{Context, Repository, RepositoryError};
use strata_store::MemoryStore;
use strata_types::Entity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Sample {
    id: String,
    flagged: bool,
}

impl Entity for Sample {
    fn entity_type() -> &'static str {
        "sample"
    }

    fn id(&self) -> String {
        self.id.clone()
    }
}

fn populated_repo(flagged: usize, noise: usize) -> Repository<Sample> {
    let repo = Repository::new(Context::new(MemoryStore::new()));
    for n in 0..flagged {
        repo.insert(Sample {
            id: format!("f{n}"),
            flagged: true,
        });
    }
    for n in 0..noise {
        repo.insert(Sample {
            id: format!("x{n}"),
            flagged: false,
        });
    }
    repo.save_changes().unwrap();
    repo
}

proptest! {
    /// `find_single` classifies purely on the number of matches.
    #[test]
    fn find_single_classifies_on_match_count(flagged in 0usize..6, noise in 0usize..6) {
        let repo = populated_repo(flagged, noise);
        let result = repo.find_single(|s: &Sample| s.flagged);

        match flagged {
            0 => prop_assert!(matches!(result, Err(RepositoryError::NotFound { .. })), "expected NotFound"),
            1 => {
                let found = result.unwrap();
                prop_assert!(found.flagged);
            }
            n => prop_assert!(
                matches!(result, Err(RepositoryError::MultipleFound { count, .. }) if count == n),
                "expected MultipleFound with count == n"
            ),
        }
    }

    /// `find_by` yields exactly the matching subset, nothing else.
    #[test]
    fn find_by_returns_exactly_the_matching_subset(flagged in 0usize..8, noise in 0usize..8) {
        let repo = populated_repo(flagged, noise);

        let matches: Vec<Sample> = repo.find_by(|s: &Sample| s.flagged).unwrap().collect();
        prop_assert_eq!(matches.len(), flagged);
        prop_assert!(matches.iter().all(|s| s.flagged));

        let everyone = repo.get_all().unwrap().count();
        prop_assert_eq!(everyone, flagged + noise);
    }

    /// Both single-result entry points agree on every population.
    #[test]
    fn sync_and_async_single_results_agree(flagged in 0usize..4) {
        let repo = populated_repo(flagged, 2);
        let sync_result = repo.find_single(|s: &Sample| s.flagged);

        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let async_result = runtime.block_on(repo.find_single_async(|s: &Sample| s.flagged));

        match (sync_result, async_result) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
            (Err(RepositoryError::NotFound { .. }), Err(RepositoryError::NotFound { .. })) => {}
            (Err(RepositoryError::MultipleFound { count: a, .. }),
             Err(RepositoryError::MultipleFound { count: b, .. })) => prop_assert_eq!(a, b),
            (a, b) => prop_assert!(false, "sync {a:?} and async {b:?} disagree"),
        }
    }
}
