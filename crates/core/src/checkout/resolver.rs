//! Payment-party resolution.
//!
//! Turns the abstract party descriptors on a checkout request into typed
//! plan steps with zero amounts, querying the ledger store for lightrail
//! Values. Values addressed directly (by id or code) are screened against
//! the resolve policy and either rejected or dropped; contact listings are
//! always filtered silently, since a contact legitimately may have nothing
//! usable.

use chrono::{DateTime, Utc};

use crate::execution::store::LedgerStore;
use crate::values::Value;
use crate::values::eligibility::date_window_contains;

use super::error::CheckoutError;
use super::plan::{InternalStep, LightrailStep, PlanStep, StripeStep};
use super::request::{
    CheckoutRequest, LightrailSource, NonTransactableHandling, PaymentSource, ResolveOptions,
};

/// Resolves every payment party on a checkout request into plan steps.
///
/// Steps come back in source order with `amount` initialized to zero;
/// ordering across steps is the candidate builder's concern.
///
/// # Errors
///
/// [`CheckoutError::InvalidParty`] when a directly addressed party cannot
/// resolve and the options say to error; [`CheckoutError::Store`] on store
/// failure.
pub async fn resolve_checkout_steps<S: LedgerStore + ?Sized>(
    store: &S,
    request: &CheckoutRequest,
    options: ResolveOptions,
    now: DateTime<Utc>,
) -> Result<Vec<PlanStep>, CheckoutError> {
    let mut steps = Vec::with_capacity(request.sources.len());

    for (index, source) in request.sources.iter().enumerate() {
        match source {
            PaymentSource::Lightrail(party) => {
                let resolved =
                    resolve_lightrail(store, party, &request.currency, options, now).await?;
                steps.extend(resolved.into_iter().map(|value| {
                    PlanStep::Lightrail(LightrailStep {
                        value,
                        amount: 0,
                        uses: None,
                    })
                }));
            }
            PaymentSource::Stripe(stripe) => {
                steps.push(PlanStep::Stripe(StripeStep {
                    idempotency_key: format!("{}-src-{index}", request.id),
                    source: stripe.source.clone(),
                    customer: stripe.customer.clone(),
                    max_amount: stripe.max_amount,
                    amount: 0,
                }));
            }
            PaymentSource::Internal(internal) => {
                steps.push(PlanStep::Internal(InternalStep {
                    internal_id: internal.internal_id.clone(),
                    balance: internal.balance,
                    pretax: internal.pretax,
                    before_lightrail: internal.before_lightrail,
                    amount: 0,
                }));
            }
        }
    }

    Ok(steps)
}

/// Resolves a lightrail party that must land on exactly one Value.
///
/// Used for named sources/destinations outside checkout, where both "no
/// rows" and "several rows" mean the caller addressed the wrong thing.
///
/// # Errors
///
/// [`CheckoutError::InvalidParty`] unless exactly one Value passes
/// screening.
pub async fn resolve_single<S: LedgerStore + ?Sized>(
    store: &S,
    party: &LightrailSource,
    currency: &str,
    options: ResolveOptions,
    now: DateTime<Utc>,
) -> Result<PlanStep, CheckoutError> {
    let strict = ResolveOptions {
        non_transactable: NonTransactableHandling::Error,
        ..options
    };
    let mut resolved = resolve_lightrail(store, party, currency, strict, now).await?;

    match resolved.len() {
        1 => Ok(PlanStep::Lightrail(LightrailStep {
            value: resolved.remove(0),
            amount: 0,
            uses: None,
        })),
        0 => Err(CheckoutError::InvalidParty {
            party: party_label(party),
            reason: "it resolved to no Values".to_string(),
        }),
        count => Err(CheckoutError::InvalidParty {
            party: party_label(party),
            reason: format!("it resolved to {count} Values, expected exactly one"),
        }),
    }
}

/// Fetches and screens the Values a lightrail party addresses.
async fn resolve_lightrail<S: LedgerStore + ?Sized>(
    store: &S,
    party: &LightrailSource,
    currency: &str,
    options: ResolveOptions,
    now: DateTime<Utc>,
) -> Result<Vec<Value>, CheckoutError> {
    match party {
        LightrailSource::ValueId { value_id } => {
            let found = store.get_value(value_id).await?;
            screen_addressed(found, party, currency, options, now)
        }
        LightrailSource::Code { code } => {
            let found = store.get_value_by_code(code).await?;
            screen_addressed(found, party, currency, options, now)
        }
        LightrailSource::ContactId { contact_id } => {
            let values = store.list_contact_values(contact_id, currency).await?;
            Ok(values
                .into_iter()
                .filter(|value| screening_failure(value, currency, options, now).is_none())
                .collect())
        }
    }
}

/// Applies the resolve policy to a directly addressed Value.
fn screen_addressed(
    found: Option<Value>,
    party: &LightrailSource,
    currency: &str,
    options: ResolveOptions,
    now: DateTime<Utc>,
) -> Result<Vec<Value>, CheckoutError> {
    let failure = match &found {
        None => Some("it does not exist".to_string()),
        Some(value) => screening_failure(value, currency, options, now),
    };

    match failure {
        None => Ok(found.into_iter().collect()),
        Some(reason) => match options.non_transactable {
            NonTransactableHandling::Error => Err(CheckoutError::InvalidParty {
                party: party_label(party),
                reason,
            }),
            NonTransactableHandling::Exclude => Ok(vec![]),
        },
    }
}

/// Why a Value cannot resolve under the given policy, if it cannot.
fn screening_failure(
    value: &Value,
    currency: &str,
    options: ResolveOptions,
    now: DateTime<Utc>,
) -> Option<String> {
    if value.currency != currency {
        return Some(format!(
            "its currency {} does not match the checkout currency {currency}",
            value.currency
        ));
    }
    if !value.active {
        return Some("it is inactive".to_string());
    }
    if value.frozen {
        return Some("it is frozen".to_string());
    }
    if value.canceled {
        return Some("it is canceled".to_string());
    }
    if !date_window_contains(value, now) {
        return Some("it is outside its redemption window".to_string());
    }
    if !options.include_zero_uses && value.uses_remaining == Some(0) {
        return Some("it has no uses remaining".to_string());
    }
    if !options.include_zero_balance && value.balance == Some(0) {
        return Some("it has a zero balance".to_string());
    }
    None
}

/// Display form of a party for error messages; codes are masked.
fn party_label(party: &LightrailSource) -> String {
    match party {
        LightrailSource::ValueId { value_id } => value_id.clone(),
        LightrailSource::Code { code } => mask_code(code),
        LightrailSource::ContactId { contact_id } => contact_id.clone(),
    }
}

/// Keeps only the last four characters of a redemption code.
fn mask_code(code: &str) -> String {
    let chars: Vec<char> = code.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("…{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_code_keeps_last_four() {
        assert_eq!(mask_code("SPRING-PROMO"), "…ROMO");
        assert_eq!(mask_code("AB"), "…AB");
    }
}
