//! Purchase engine for repeatable and one-time upgrades.
//!
//! Both buy functions check funds, apply the catalog effect and record
//! ownership. Deducting the returned cost is the caller's job.

use crate::effects::apply_effect;
use crate::error::Rejection;
use rust_decimal::Decimal;
use tracing::debug;
use tycoon_core::{Feature, GameState, OneTimeUpgrade, RepeatableUpgrade};
use tycoon_econ::{upgrade_cost, BuyAmount, CostQuote, EconError};

/// Result of a successful repeatable purchase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Purchase {
    pub units: u64,
    pub cost: Decimal,
}

/// Result of a successful one-time purchase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OneTimePurchase {
    pub cost: Decimal,
    /// Feature the caller should unlock, if the entry declares one.
    pub feature: Option<Feature>,
}

fn econ_rejection(e: EconError) -> Rejection {
    match e {
        EconError::InvalidInput(what) => Rejection::InvalidAmount(what),
        EconError::Overflow => Rejection::InvalidAmount("upgrade cost"),
    }
}

/// Price of `amount` more units of `upgrade` given the current state.
pub fn quote_upgrade(
    state: &GameState,
    upgrade: &RepeatableUpgrade,
    amount: BuyAmount,
) -> Result<CostQuote, Rejection> {
    upgrade_cost(
        upgrade.base_cost,
        upgrade.cost_multiplier,
        state.owned(&upgrade.id),
        amount,
        Some(state.balance),
    )
    .map_err(econ_rejection)
}

/// Buy `amount` units of `upgrade`.
///
/// On rejection nothing changes. On success ownership grows by the quoted
/// units and the effect is applied once per unit.
pub fn buy_upgrade(
    state: &mut GameState,
    upgrade: &RepeatableUpgrade,
    amount: BuyAmount,
) -> Result<Purchase, Rejection> {
    let quote = quote_upgrade(state, upgrade, amount)?;
    if quote.total > state.balance {
        return Err(Rejection::InsufficientFunds {
            needed: quote.total,
            available: state.balance,
        });
    }
    apply_effect(state, &upgrade.id, &upgrade.effect, quote.units)?;
    *state.ownership.entry(upgrade.id.clone()).or_insert(0) += quote.units;
    debug!(id = %upgrade.id, units = quote.units, cost = %quote.total, "upgrade bought");
    Ok(Purchase {
        units: quote.units,
        cost: quote.total,
    })
}

/// Buy a one-time upgrade and record it as purchased.
pub fn buy_one_time_upgrade(
    state: &mut GameState,
    upgrade: &OneTimeUpgrade,
) -> Result<OneTimePurchase, Rejection> {
    if state.one_time_purchases.contains(&upgrade.id) {
        return Err(Rejection::AlreadyPurchased(upgrade.id.clone()));
    }
    if upgrade.cost > state.balance {
        return Err(Rejection::InsufficientFunds {
            needed: upgrade.cost,
            available: state.balance,
        });
    }
    if let Some(effect) = &upgrade.effect {
        apply_effect(state, &upgrade.id, effect, 1)?;
    }
    state.one_time_purchases.insert(upgrade.id.clone());
    debug!(id = %upgrade.id, cost = %upgrade.cost, "one-time upgrade bought");
    Ok(OneTimePurchase {
        cost: upgrade.cost,
        feature: upgrade.feature,
    })
}
