//! Picks who gets a seat.
//!
//! All algorithms are weighted sampling without replacement where the weight
//! of a candidate is `(1 / (visits + 1)) ^ exponent`. First come first served
//! is the only exception and simply takes the head of the list.

use itertools::Itertools as _;
use lesson_lottery_store::models::{Candidate, VisitHistory};
use rand::Rng;
use tracing::debug;

/// Exponent used by "least previously visited". Large enough that anyone with
/// fewer visits practically always wins against someone with more.
pub const LPV_EXPONENT: f64 = 99.0;

pub const DEFAULT_WEIGHT_EXPONENT: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Algorithm {
    FirstComeFirstServed,
    LeastPreviouslyVisited,
    WeightedRandom { exponent: f64 },
    /// Unknown algorithm names end up here.
    Uniform,
}

impl Algorithm {
    #[must_use]
    pub fn from_config(name: &str, weight_exponent: Option<f64>) -> Self {
        match name.trim().to_lowercase().as_str() {
            "fcfs" => Self::FirstComeFirstServed,
            "lpv" => Self::LeastPreviouslyVisited,
            "weighted_random" => Self::WeightedRandom {
                exponent: weight_exponent.unwrap_or(DEFAULT_WEIGHT_EXPONENT),
            },
            _ => Self::Uniform,
        }
    }

    /// `None` for algorithms that don't sample.
    #[must_use]
    pub const fn exponent(self) -> Option<f64> {
        match self {
            Self::FirstComeFirstServed => None,
            Self::LeastPreviouslyVisited => Some(LPV_EXPONENT),
            Self::WeightedRandom { exponent } => Some(exponent),
            Self::Uniform => Some(0.0),
        }
    }
}

#[must_use]
pub fn weight(visits: u64, exponent: f64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let visits = visits as f64;
    (1.0 / (visits + 1.0)).powf(exponent)
}

/// Returns the indices of the chosen candidates in the order they were drawn.
///
/// Exactly `min(capacity, candidates.len())` indices are returned, a capacity
/// of zero or less chooses nobody.
pub fn select<R: Rng + ?Sized>(
    candidates: &[Candidate],
    capacity: i64,
    algorithm: Algorithm,
    history: &VisitHistory,
    rng: &mut R,
) -> Vec<usize> {
    let count = usize::try_from(capacity)
        .unwrap_or_default()
        .min(candidates.len());
    if count == 0 {
        return Vec::new();
    }

    let Some(exponent) = algorithm.exponent() else {
        return (0..count).collect();
    };

    let weights: Vec<f64> = candidates
        .iter()
        .map(|candidate| weight(history.visits(&candidate.email), exponent))
        .collect();
    let drawn = draw_without_replacement(&weights, count, rng);
    debug!("{algorithm:?} drew [{}] out of {}", drawn.iter().join(", "), candidates.len());
    drawn
}

/// Draws `count` distinct indices, one at a time. Before every draw the
/// weights of the indices still in the pool are normalized to sum to one.
///
/// An index with weight zero is never drawn while an index with positive
/// weight remains. If nothing positive is left the draw is uniform.
pub fn draw_without_replacement<R: Rng + ?Sized>(
    weights: &[f64],
    count: usize,
    rng: &mut R,
) -> Vec<usize> {
    let mut pool: Vec<usize> = (0..weights.len()).collect();
    let mut drawn = Vec::with_capacity(count.min(pool.len()));

    while drawn.len() < count && !pool.is_empty() {
        let total: f64 = pool.iter().map(|&index| weights[index]).sum();
        let position = if total > 0.0 && total.is_finite() {
            let target: f64 = rng.gen();
            let mut cumulative = 0.0;
            pool.iter()
                .position(|&index| {
                    cumulative += weights[index] / total;
                    weights[index] > 0.0 && target < cumulative
                })
                // rounding can leave the cumulative sum slightly below one
                .or_else(|| pool.iter().rposition(|&index| weights[index] > 0.0))
                .unwrap_or(pool.len() - 1)
        } else {
            rng.gen_range(0..pool.len())
        };
        drawn.push(pool.remove(position));
    }

    drawn
}

/// Splits `candidates` into `(chosen, waiting)`. Chosen keeps the order of
/// `indices`, waiting keeps the input order.
#[must_use]
pub fn partition(candidates: Vec<Candidate>, indices: &[usize]) -> (Vec<Candidate>, Vec<Candidate>) {
    let mut slots: Vec<Option<Candidate>> = candidates.into_iter().map(Some).collect();
    let chosen = indices
        .iter()
        .filter_map(|&index| slots.get_mut(index).and_then(Option::take))
        .collect();
    let waiting = slots.into_iter().flatten().collect();
    (chosen, waiting)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn candidates(count: usize) -> Vec<Candidate> {
        (0..count)
            .map(|i| Candidate::new(format!("First{i}"), format!("Last{i}"), format!("c{i}@example.org")))
            .collect()
    }

    fn history(entries: &[(&str, u64)]) -> VisitHistory {
        VisitHistory {
            visits: entries
                .iter()
                .map(|(email, visits)| ((*email).to_owned(), *visits))
                .collect(),
        }
    }

    #[test]
    fn algorithm_names() {
        assert_eq!(Algorithm::from_config("FCFS", None), Algorithm::FirstComeFirstServed);
        assert_eq!(Algorithm::from_config("lpv", Some(3.0)), Algorithm::LeastPreviouslyVisited);
        assert_eq!(
            Algorithm::from_config("weighted_random", None),
            Algorithm::WeightedRandom { exponent: 1.0 }
        );
        assert_eq!(
            Algorithm::from_config("weighted_random", Some(2.0)),
            Algorithm::WeightedRandom { exponent: 2.0 }
        );
        assert_eq!(Algorithm::from_config("mystery", Some(2.0)), Algorithm::Uniform);
        assert_eq!(Algorithm::Uniform.exponent(), Some(0.0));
    }

    #[test]
    fn weights_shrink_with_visits() {
        assert!((weight(0, LPV_EXPONENT) - 1.0).abs() < f64::EPSILON);
        assert!((weight(1, 1.0) - 0.5).abs() < f64::EPSILON);
        assert!(weight(5, LPV_EXPONENT) > 0.0);
        assert!((weight(7, 0.0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fcfs_takes_the_head() {
        let mut rng = StdRng::seed_from_u64(1);
        let picked = select(
            &candidates(5),
            3,
            Algorithm::FirstComeFirstServed,
            &VisitHistory::default(),
            &mut rng,
        );
        assert_eq!(picked, vec![0, 1, 2]);
    }

    #[test]
    fn non_positive_capacity_or_no_candidates_choose_nobody() {
        let mut rng = StdRng::seed_from_u64(1);
        let empty = VisitHistory::default();
        assert!(select(&candidates(3), 0, Algorithm::Uniform, &empty, &mut rng).is_empty());
        assert!(select(&candidates(3), -4, Algorithm::LeastPreviouslyVisited, &empty, &mut rng).is_empty());
        assert!(select(&[], 4, Algorithm::FirstComeFirstServed, &empty, &mut rng).is_empty());
    }

    #[test]
    fn lpv_prefers_the_least_visited() {
        let people = vec![
            Candidate::new("X", "X", "x@example.org"),
            Candidate::new("Y", "Y", "y@example.org"),
            Candidate::new("Z", "Z", "z@example.org"),
        ];
        let history = history(&[("x@example.org", 0), ("y@example.org", 0), ("z@example.org", 5)]);
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked: BTreeSet<usize> =
                select(&people, 2, Algorithm::LeastPreviouslyVisited, &history, &mut rng)
                    .into_iter()
                    .collect();
            assert_eq!(picked, BTreeSet::from([0, 1]), "seed {seed}");
        }
    }

    #[test]
    fn history_lookup_ignores_case() {
        let people = vec![
            Candidate {
                first_name: "X".to_owned(),
                last_name: "X".to_owned(),
                email: "X@EXAMPLE.ORG".to_owned(),
            },
            Candidate::new("Y", "Y", "y@example.org"),
        ];
        let mut history = VisitHistory::default();
        history.record_visit("x@Example.org");
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = select(&people, 1, Algorithm::LeastPreviouslyVisited, &history, &mut rng);
            assert_eq!(picked, vec![1]);
        }
    }

    #[test]
    fn zero_weights_come_last() {
        let weights = [0.0, 2.0, 0.0, 1.0];
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let drawn = draw_without_replacement(&weights, 3, &mut rng);
            let first_two: BTreeSet<usize> = drawn[..2].iter().copied().collect();
            assert_eq!(first_two, BTreeSet::from([1, 3]));
            assert!(drawn[2] == 0 || drawn[2] == 2);
        }
    }

    #[test]
    fn all_zero_weights_fall_back_to_uniform() {
        let mut rng = StdRng::seed_from_u64(3);
        let drawn = draw_without_replacement(&[0.0, 0.0, 0.0], 3, &mut rng);
        let unique: BTreeSet<usize> = drawn.iter().copied().collect();
        assert_eq!(unique, BTreeSet::from([0, 1, 2]));
    }

    #[test]
    fn weighted_random_favours_fewer_visits() {
        let people = vec![
            Candidate::new("A", "A", "a@example.org"),
            Candidate::new("B", "B", "b@example.org"),
        ];
        let history = history(&[("b@example.org", 3)]);
        let mut rng = StdRng::seed_from_u64(42);
        let wins_a = (0..2000)
            .filter(|_| {
                select(&people, 1, Algorithm::WeightedRandom { exponent: 1.0 }, &history, &mut rng)
                    == vec![0]
            })
            .count();
        // expected share for a is 1 / (1 + 0.25) = 0.8
        assert!((1500..1700).contains(&wins_a), "a won {wins_a} times");
    }

    #[test]
    fn partition_keeps_orders() {
        let people = candidates(5);
        let (chosen, waiting) = partition(people.clone(), &[3, 0]);
        assert_eq!(chosen, vec![people[3].clone(), people[0].clone()]);
        assert_eq!(waiting, vec![people[1].clone(), people[2].clone(), people[4].clone()]);
    }

    fn arb_algorithm() -> impl Strategy<Value = Algorithm> {
        prop_oneof![
            Just(Algorithm::FirstComeFirstServed),
            Just(Algorithm::LeastPreviouslyVisited),
            (0.0f64..5.0).prop_map(|exponent| Algorithm::WeightedRandom { exponent }),
            Just(Algorithm::Uniform),
        ]
    }

    proptest! {
        #[test]
        fn selection_partitions_the_candidates(
            count in 0usize..20,
            capacity in -3i64..25,
            algorithm in arb_algorithm(),
            visits in proptest::collection::vec(0u64..10, 20),
            seed in any::<u64>(),
        ) {
            let people = candidates(count);
            let history = VisitHistory {
                visits: people
                    .iter()
                    .zip(&visits)
                    .map(|(candidate, visits)| (candidate.email.clone(), *visits))
                    .collect(),
            };
            let mut rng = StdRng::seed_from_u64(seed);
            let indices = select(&people, capacity, algorithm, &history, &mut rng);

            let expected = usize::try_from(capacity).unwrap_or(0).min(count);
            prop_assert_eq!(indices.len(), expected);
            let unique: BTreeSet<usize> = indices.iter().copied().collect();
            prop_assert_eq!(unique.len(), indices.len());
            prop_assert!(indices.iter().all(|&index| index < count));

            let (chosen, waiting) = partition(people.clone(), &indices);
            prop_assert_eq!(chosen.len() + waiting.len(), count);
            let chosen_emails: BTreeSet<String> = chosen.iter().map(Candidate::identity).collect();
            let waiting_emails: BTreeSet<String> = waiting.iter().map(Candidate::identity).collect();
            prop_assert!(chosen_emails.is_disjoint(&waiting_emails));
            let all: BTreeSet<String> = people.iter().map(Candidate::identity).collect();
            prop_assert_eq!(chosen_emails.union(&waiting_emails).cloned().collect::<BTreeSet<_>>(), all);
        }

        #[test]
        fn fcfs_is_deterministic(count in 0usize..20, capacity in 0i64..25, a in any::<u64>(), b in any::<u64>()) {
            let people = candidates(count);
            let empty = VisitHistory::default();
            let first = select(&people, capacity, Algorithm::FirstComeFirstServed, &empty, &mut StdRng::seed_from_u64(a));
            let second = select(&people, capacity, Algorithm::FirstComeFirstServed, &empty, &mut StdRng::seed_from_u64(b));
            prop_assert_eq!(first, second);
        }
    }
}
