//! Exhaustive stop-order optimization
//!
//! Explores every ordering of the intermediate stops (origin and destination
//! stay fixed at the ends) and keeps the best ordering per objective. The
//! search is factorial in the stop count, so the request layer enforces a
//! stop-count ceiling before the search runs.
//! Leg costs come from the shared per-request oracle, so each unique leg is
//! resolved once no matter how many permutations traverse it.

use std::collections::BTreeMap;

use crate::services::evaluator::{self, RouteEvaluation};
use crate::services::legs::LegOracle;
use crate::types::{Location, Objective};

/// Best ordering found for one objective
#[derive(Debug, Clone)]
pub struct RankedRoute {
    /// Full path: origin, permuted stops, destination
    pub path: Vec<Location>,
    pub evaluation: RouteEvaluation,
}

fn metric(objective: Objective, evaluation: &RouteEvaluation) -> f64 {
    match objective {
        Objective::Fastest => evaluation.duration_min,
        Objective::Eco => evaluation.distance_km,
    }
}

/// Index permutations in lexicographic order.
///
/// The order is fixed so that ties resolve deterministically: the first
/// permutation reaching the minimum wins.
fn index_permutations(n: usize) -> Vec<Vec<usize>> {
    fn build(n: usize, used: &mut Vec<bool>, current: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if current.len() == n {
            out.push(current.clone());
            return;
        }
        for i in 0..n {
            if !used[i] {
                used[i] = true;
                current.push(i);
                build(n, used, current, out);
                current.pop();
                used[i] = false;
            }
        }
    }

    let mut out = Vec::new();
    build(n, &mut vec![false; n], &mut Vec::with_capacity(n), &mut out);
    out
}

/// Find the best stop ordering per objective.
///
/// With zero or one stop there is nothing to permute; every objective maps
/// to the single trivial ordering.
pub async fn optimize(
    origin: &Location,
    stops: &[Location],
    destination: &Location,
    objectives: &[Objective],
    oracle: &LegOracle<'_>,
) -> BTreeMap<Objective, RankedRoute> {
    let mut best: BTreeMap<Objective, RankedRoute> = BTreeMap::new();

    for permutation in index_permutations(stops.len()) {
        let mut path = Vec::with_capacity(stops.len() + 2);
        path.push(origin.clone());
        for &i in &permutation {
            path.push(stops[i].clone());
        }
        path.push(destination.clone());

        let evaluation = evaluator::evaluate(&path, oracle).await;

        for &objective in objectives {
            let candidate = metric(objective, &evaluation);
            let improves = best
                .get(&objective)
                .map(|incumbent| candidate < metric(objective, &incumbent.evaluation))
                .unwrap_or(true);
            if improves {
                best.insert(
                    objective,
                    RankedRoute {
                        path: path.clone(),
                        evaluation: evaluation.clone(),
                    },
                );
            }
        }
    }

    best
}
