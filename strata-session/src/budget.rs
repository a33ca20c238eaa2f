//! Budget arithmetic: atomic check-then-consume and fractional delegation.

use strata_core::config::DelegationConfig;
use strata_core::errors::BudgetError;
use strata_core::models::budget::{Budget, BudgetCharge, BudgetState, ResourceKind};

/// Check every dimension of `charge` against the remaining ceilings, then
/// apply it. On any shortfall no counter is mutated.
pub fn check_and_consume(
    budget: &Budget,
    state: &mut BudgetState,
    charge: BudgetCharge,
) -> Result<(), BudgetError> {
    if charge.tokens > state.tokens_remaining(budget) {
        return Err(BudgetError::Exhausted {
            resource: ResourceKind::Tokens,
            requested: charge.tokens as u64,
            remaining: state.tokens_remaining(budget) as u64,
        });
    }
    if charge.retries > state.retries_remaining(budget) {
        return Err(BudgetError::Exhausted {
            resource: ResourceKind::Retries,
            requested: charge.retries as u64,
            remaining: state.retries_remaining(budget) as u64,
        });
    }
    if let Some(remaining) = state.subcalls_remaining(budget) {
        if charge.subcalls > remaining {
            return Err(BudgetError::Exhausted {
                resource: ResourceKind::Subcalls,
                requested: charge.subcalls as u64,
                remaining: remaining as u64,
            });
        }
    }
    if let Some(remaining) = state.tool_calls_remaining(budget) {
        if charge.tool_calls > remaining {
            return Err(BudgetError::Exhausted {
                resource: ResourceKind::ToolCalls,
                requested: charge.tool_calls as u64,
                remaining: remaining as u64,
            });
        }
    }

    state.tokens_used += charge.tokens;
    state.retries_used += charge.retries;
    state.subcalls_used += charge.subcalls;
    state.tool_calls_used += charge.tool_calls;
    Ok(())
}

/// A delegation fraction must lie in (0, 1].
pub fn validate_fraction(fraction: f64) -> Result<(), BudgetError> {
    if fraction > 0.0 && fraction <= 1.0 {
        Ok(())
    } else {
        Err(BudgetError::InvalidFraction { fraction })
    }
}

/// Compute a child ceiling from a parent's remaining budget.
///
/// Tokens, time, sub-sessions, and tool calls are scaled by `fraction`
/// (floored); retries pass through unscaled. Configured floors keep the
/// child from starving, clamped so the child never exceeds the parent's
/// remaining. A `fixed` budget overrides the fraction, clamped the same
/// way.
pub fn delegate_ceiling(
    budget: &Budget,
    state: &BudgetState,
    fraction: f64,
    config: &DelegationConfig,
    fixed: Option<Budget>,
) -> Result<Budget, BudgetError> {
    validate_fraction(fraction)?;

    let tokens_rem = state.tokens_remaining(budget);
    let time_rem = state.time_remaining_ms(budget);
    let retries_rem = state.retries_remaining(budget);
    let subcalls_rem = state.subcalls_remaining(budget);
    let tool_calls_rem = state.tool_calls_remaining(budget);

    if let Some(fixed) = fixed {
        return Ok(Budget {
            max_tokens: fixed.max_tokens.min(tokens_rem),
            max_time_ms: fixed.max_time_ms.min(time_rem),
            max_retries: fixed.max_retries.min(retries_rem),
            max_subcalls: clamp_opt(fixed.max_subcalls, subcalls_rem),
            max_tool_calls: clamp_opt(fixed.max_tool_calls, tool_calls_rem),
        });
    }

    let scaled_tokens = (tokens_rem as f64 * fraction).floor() as usize;
    let scaled_time = (time_rem as f64 * fraction).floor() as u64;

    Ok(Budget {
        max_tokens: scaled_tokens.max(config.min_tokens).min(tokens_rem),
        max_time_ms: scaled_time.max(config.min_time_ms).min(time_rem),
        max_retries: retries_rem,
        max_subcalls: subcalls_rem.map(|r| (r as f64 * fraction).floor() as u32),
        max_tool_calls: tool_calls_rem.map(|r| (r as f64 * fraction).floor() as u32),
    })
}

fn clamp_opt(requested: Option<u32>, remaining: Option<u32>) -> Option<u32> {
    match (requested, remaining) {
        (Some(req), Some(rem)) => Some(req.min(rem)),
        (Some(req), None) => Some(req),
        (None, rem) => rem,
    }
}
