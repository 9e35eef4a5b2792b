//! Candidate step-ordering enumeration.
//!
//! Steps split into a pre-tax and a post-tax partition. Within each
//! partition, internal steps flagged `before_lightrail` hold a fixed leading
//! position, lightrail steps may draw in any order, and every other step
//! holds a fixed trailing position. A candidate is one pre-tax ordering
//! paired with one post-tax ordering; every candidate owns independent
//! copies of its steps so allocation can mutate them freely.

use super::error::CheckoutError;
use super::permutations::permutations;
use super::plan::PlanStep;

/// One candidate ordering: steps to run before tax, and after.
#[derive(Debug, Clone, Default)]
pub struct CandidateOrdering {
    /// Steps applied before tax is computed.
    pub pre_tax: Vec<PlanStep>,
    /// Steps applied after tax is computed.
    pub post_tax: Vec<PlanStep>,
}

/// Enumerates every candidate ordering for the given steps.
///
/// Always yields at least one candidate (with both lists empty when no
/// steps are supplied).
///
/// # Errors
///
/// Returns [`CheckoutError::TooManySources`] when a partition holds more
/// free-order steps than `max_free_order` (enumeration is factorial in that
/// count).
pub fn candidate_orderings(
    steps: &[PlanStep],
    max_free_order: usize,
) -> Result<Vec<CandidateOrdering>, CheckoutError> {
    let (pre_tax, post_tax): (Vec<&PlanStep>, Vec<&PlanStep>) =
        steps.iter().partition(|step| step.is_pre_tax());

    let pre_orderings = partition_orderings(&pre_tax, max_free_order)?;
    let post_orderings = partition_orderings(&post_tax, max_free_order)?;

    let mut candidates = Vec::with_capacity(pre_orderings.len() * post_orderings.len());
    for pre in &pre_orderings {
        for post in &post_orderings {
            candidates.push(CandidateOrdering {
                pre_tax: pre.clone(),
                post_tax: post.clone(),
            });
        }
    }
    Ok(candidates)
}

/// Orders one tax partition: fixed-before steps, each permutation of the
/// free-order (lightrail) steps, fixed-after steps.
fn partition_orderings(
    group: &[&PlanStep],
    max_free_order: usize,
) -> Result<Vec<Vec<PlanStep>>, CheckoutError> {
    let mut fixed_before = Vec::new();
    let mut free_order = Vec::new();
    let mut fixed_after = Vec::new();

    for step in group {
        match step {
            PlanStep::Internal(internal) if internal.before_lightrail => {
                fixed_before.push((*step).clone());
            }
            PlanStep::Lightrail(_) => free_order.push((*step).clone()),
            PlanStep::Stripe(_) | PlanStep::Internal(_) => fixed_after.push((*step).clone()),
        }
    }

    if free_order.len() > max_free_order {
        return Err(CheckoutError::TooManySources {
            count: free_order.len(),
            limit: max_free_order,
        });
    }

    Ok(permutations(&free_order)
        .into_iter()
        .map(|free| {
            fixed_before
                .iter()
                .cloned()
                .chain(free)
                .chain(fixed_after.iter().cloned())
                .collect()
        })
        .collect())
}
