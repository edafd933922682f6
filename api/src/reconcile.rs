//! Applies one change notification to a collection cache.

use crate::MatchStatus;
use crate::cache::{CollectionCache, Keyed};
use crate::patch::Patch;
use std::fmt;

/// One coarse-grained change notification for a collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Change<P> {
    Created(P),
    Updated(P),
    Deleted(Option<String>),
    /// An update that may move a match in or out of the live slice.
    ScoreUpdate(P),
}

impl<P> Change<P> {
    pub fn kind(&self) -> &'static str {
        match self {
            Change::Created(_) => "created",
            Change::Updated(_) => "updated",
            Change::Deleted(_) => "deleted",
            Change::ScoreUpdate(_) => "scoreUpdate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    MissingId,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::MissingId => write!(f, "event carries no record id"),
        }
    }
}

/// What a reconciliation step did to the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Inserted,
    /// Existing record merged in place. `transition` is set when the
    /// record's status changed.
    Merged { transition: Option<(MatchStatus, MatchStatus)> },
    Removed,
    /// Delete of an id that was not cached.
    Unchanged,
    /// Whole value replaced (layout updates).
    Replaced,
    /// Event rejected; the cache was not touched.
    Dropped(DropReason),
}

impl Outcome {
    pub fn mutated(&self) -> bool {
        !matches!(self, Outcome::Unchanged | Outcome::Dropped(_))
    }
}

pub fn reconcile<P: Patch>(cache: &mut CollectionCache<P::Record>, change: Change<P>) -> Outcome {
    match change {
        Change::Created(patch) => {
            if usable_id(patch.id()).is_none() {
                return Outcome::Dropped(DropReason::MissingId);
            }
            cache.insert(patch.into_record());
            Outcome::Inserted
        }
        Change::Updated(patch) | Change::ScoreUpdate(patch) => merge_or_insert(cache, patch),
        Change::Deleted(id) => {
            let Some(id) = usable_id(id.as_deref()) else {
                return Outcome::Dropped(DropReason::MissingId);
            };
            if cache.remove(id).is_some() {
                Outcome::Removed
            } else {
                Outcome::Unchanged
            }
        }
    }
}

fn merge_or_insert<P: Patch>(cache: &mut CollectionCache<P::Record>, patch: P) -> Outcome {
    let Some(id) = usable_id(patch.id()).map(str::to_owned) else {
        return Outcome::Dropped(DropReason::MissingId);
    };

    match cache.get_mut(&id) {
        Some(record) => {
            let before = record.status();
            patch.merge_into(record);
            let after = record.status();
            let transition = before.zip(after).filter(|(b, a)| b != a);
            Outcome::Merged { transition }
        }
        None => {
            // Unknown id: treat the update as a creation.
            cache.insert(patch.into_record());
            Outcome::Inserted
        }
    }
}

fn usable_id(id: Option<&str>) -> Option<&str> {
    id.filter(|id| !id.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::{MatchPatch, SchoolPatch};
    use crate::{Match, School};

    fn created(id: &str, status: MatchStatus, a: u32, b: u32) -> Change<MatchPatch> {
        Change::Created(MatchPatch::score(id, a, b, status))
    }

    #[test]
    fn created_inserts_and_overwrites() {
        let mut cache = CollectionCache::<Match>::new();
        assert_eq!(reconcile(&mut cache, created("m1", MatchStatus::Scheduled, 0, 0)), Outcome::Inserted);
        assert_eq!(reconcile(&mut cache, created("m1", MatchStatus::Live, 5, 2)), Outcome::Inserted);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("m1").map(|m| m.points_a), Some(5));
    }

    #[test]
    fn updated_merges_shallowly() {
        let mut cache = CollectionCache::from_snapshot(vec![Match {
            id: "m1".into(),
            venue: "Court A".into(),
            points_a: 2,
            ..Default::default()
        }]);
        let outcome = reconcile(
            &mut cache,
            Change::Updated(MatchPatch { id: Some("m1".into()), points_b: Some(7), ..Default::default() }),
        );
        assert_eq!(outcome, Outcome::Merged { transition: None });
        let m = cache.get("m1").unwrap();
        assert_eq!((m.points_a, m.points_b), (2, 7));
        assert_eq!(m.venue, "Court A");
    }

    #[test]
    fn updated_unknown_id_is_treated_as_creation() {
        let mut cache = CollectionCache::<Match>::new();
        let outcome = reconcile(
            &mut cache,
            Change::Updated(MatchPatch { id: Some("m7".into()), venue: Some("Field".into()), ..Default::default() }),
        );
        assert_eq!(outcome, Outcome::Inserted);
        assert_eq!(cache.get("m7").map(|m| m.venue.as_str()), Some("Field"));
    }

    #[test]
    fn score_update_reports_status_transition() {
        let mut cache = CollectionCache::<Match>::new();
        reconcile(&mut cache, created("m1", MatchStatus::Scheduled, 0, 0));
        let outcome = reconcile(
            &mut cache,
            Change::ScoreUpdate(MatchPatch::score("m1", 1, 0, MatchStatus::Live)),
        );
        assert_eq!(
            outcome,
            Outcome::Merged { transition: Some((MatchStatus::Scheduled, MatchStatus::Live)) }
        );
    }

    #[test]
    fn delete_twice_is_idempotent() {
        let mut cache = CollectionCache::<Match>::new();
        reconcile(&mut cache, created("m1", MatchStatus::Live, 0, 0));
        assert_eq!(reconcile(&mut cache, Change::<MatchPatch>::Deleted(Some("m1".into()))), Outcome::Removed);
        let after_first = cache.clone();
        assert_eq!(reconcile(&mut cache, Change::<MatchPatch>::Deleted(Some("m1".into()))), Outcome::Unchanged);
        assert_eq!(cache, after_first);
    }

    #[test]
    fn malformed_events_leave_cache_untouched() {
        let mut cache = CollectionCache::<Match>::new();
        reconcile(&mut cache, created("m1", MatchStatus::Live, 3, 3));
        let before = cache.clone();

        let dropped = Outcome::Dropped(DropReason::MissingId);
        assert_eq!(reconcile(&mut cache, Change::Updated(MatchPatch::default())), dropped);
        assert_eq!(reconcile(&mut cache, Change::Created(MatchPatch::default())), dropped);
        assert_eq!(
            reconcile(&mut cache, Change::ScoreUpdate(MatchPatch { id: Some(" ".into()), ..Default::default() })),
            dropped
        );
        assert_eq!(reconcile(&mut cache, Change::<MatchPatch>::Deleted(None)), dropped);
        assert_eq!(cache, before);
    }

    #[derive(Clone, Copy)]
    enum Step {
        Create(u32, u32, MatchStatus),
        Update(u32, u32, MatchStatus),
        Score(u32, u32, MatchStatus),
        Delete,
    }

    fn full(id: &str, a: u32, b: u32, status: MatchStatus) -> Match {
        Match { id: id.into(), points_a: a, points_b: b, status, ..Default::default() }
    }

    fn event(id: &str, step: Step) -> Change<MatchPatch> {
        match step {
            Step::Create(a, b, s) => Change::Created(MatchPatch::from(&full(id, a, b, s))),
            Step::Update(a, b, s) => Change::Updated(MatchPatch::from(&full(id, a, b, s))),
            Step::Score(a, b, s) => Change::ScoreUpdate(MatchPatch::score(id, a, b, s)),
            Step::Delete => Change::Deleted(Some(id.into())),
        }
    }

    /// Order in which ids take their next step. Each id keeps its own order.
    fn interleave(lens: &[usize], seed: u64) -> Vec<usize> {
        let mut left = lens.to_vec();
        let mut state = seed;
        let mut order = Vec::new();
        while left.iter().any(|n| *n > 0) {
            let open: Vec<usize> = (0..left.len()).filter(|i| left[*i] > 0).collect();
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let pick = open[(state >> 33) as usize % open.len()];
            left[pick] -= 1;
            order.push(pick);
        }
        order
    }

    #[test]
    fn last_event_per_id_wins() {
        use MatchStatus::{Completed, Live, Scheduled};
        let histories: Vec<(&str, Vec<Step>)> = vec![
            ("a", vec![Step::Create(0, 0, Scheduled), Step::Update(4, 0, Live)]),
            ("b", vec![Step::Create(0, 0, Scheduled), Step::Delete]),
            ("c", vec![Step::Delete, Step::Create(1, 1, Live), Step::Score(2, 1, Completed)]),
            ("d", vec![Step::Score(3, 0, Live), Step::Delete, Step::Update(5, 5, Completed)]),
            ("e", vec![Step::Update(1, 0, Live), Step::Create(0, 0, Scheduled)]),
            ("f", vec![Step::Create(2, 2, Live), Step::Score(2, 3, Live), Step::Delete, Step::Delete]),
        ];
        let lens: Vec<usize> = histories.iter().map(|(_, steps)| steps.len()).collect();

        let mut expected = CollectionCache::<Match>::new();
        for (id, steps) in &histories {
            match steps.last() {
                Some(Step::Create(a, b, s) | Step::Update(a, b, s) | Step::Score(a, b, s)) => {
                    expected.insert(full(id, *a, *b, *s));
                }
                Some(Step::Delete) | None => {}
            }
        }

        for seed in 0..24 {
            let mut cursor = vec![0; histories.len()];
            let mut cache = CollectionCache::<Match>::new();
            for idx in interleave(&lens, seed) {
                let (id, steps) = &histories[idx];
                reconcile(&mut cache, event(id, steps[cursor[idx]]));
                cursor[idx] += 1;
            }
            assert_eq!(cache, expected, "interleaving seed {seed}");
        }
    }

    #[test]
    fn school_patches_reconcile_too() {
        let mut cache = CollectionCache::<School>::new();
        let outcome = reconcile(
            &mut cache,
            Change::Created(SchoolPatch { id: Some("sc1".into()), name: Some("North High".into()), address: None }),
        );
        assert_eq!(outcome, Outcome::Inserted);
        assert_eq!(cache.get("sc1").map(|s| s.name.as_str()), Some("North High"));
    }

    #[test]
    fn only_real_mutations_count() {
        assert!(Outcome::Inserted.mutated());
        assert!(!Outcome::Unchanged.mutated());
        assert!(!Outcome::Dropped(DropReason::MissingId).mutated());
    }
}
