//! Storage layout and the pixel registry.
//!
//! - `instance()`: Config, Paused, Role holders. Small and fixed-size; all
//!   instance keys share one ledger entry and TTL.
//! - `persistent()`: one entry per sold pixel, TeamCounts, per-account
//!   Pending balances and LedgerTotals. Each entry's TTL is bumped on write.
//!
//! Unsold pixels have no entry; reads synthesize `Pixel::unowned()`.

use soroban_sdk::{contracttype, Address, Env};

use crate::types::{CanvasConfig, Capability, LedgerTotals, Pixel, Team, TeamCounts};
use crate::Error;

/// Persistent storage TTL in ledgers (~30 days at 5 s/ledger).
pub const PERSISTENT_BUMP_LEDGERS: u32 = 518_400;

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    // --- instance() ---
    Config,
    Paused,
    Role(Capability),
    // --- persistent() ---
    Pixel(u32),
    TeamCounts,
    /// Withdrawable escrow balance of an account.
    Pending(Address),
    LedgerTotals,
}

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Config)
}

pub fn get_config(env: &Env) -> Result<CanvasConfig, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .ok_or(Error::NotInitialized)
}

pub fn set_config(env: &Env, config: &CanvasConfig) {
    env.storage().instance().set(&DataKey::Config, config);
    bump_instance(env);
}

pub fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(PERSISTENT_BUMP_LEDGERS, PERSISTENT_BUMP_LEDGERS);
}

pub fn extend_persistent_ttl(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_BUMP_LEDGERS, PERSISTENT_BUMP_LEDGERS);
}

// ---------------------------------------------------------------------------
// Pixel registry
// ---------------------------------------------------------------------------

pub fn check_id(config: &CanvasConfig, id: u32) -> Result<(), Error> {
    if id >= config.cell_count() {
        return Err(Error::BadId);
    }
    Ok(())
}

/// Bounds-checked read.
pub fn read_pixel(env: &Env, config: &CanvasConfig, id: u32) -> Result<Pixel, Error> {
    check_id(config, id)?;
    Ok(get_pixel(env, id))
}

/// Raw read. Callers must have validated `id` against the grid.
pub fn get_pixel(env: &Env, id: u32) -> Pixel {
    env.storage()
        .persistent()
        .get(&DataKey::Pixel(id))
        .unwrap_or_else(Pixel::unowned)
}

/// Overwrite one pixel and move it between teams in `counts`.
///
/// `previous` must be the pixel's current state. `counts` is the caller's
/// working copy; it is persisted with [`set_team_counts`] once the whole batch
/// has been applied.
pub fn set_pixel(
    env: &Env,
    counts: &mut TeamCounts,
    id: u32,
    previous: &Pixel,
    next: &Pixel,
) -> Result<(), Error> {
    let was_owned = previous.owner.is_some();
    if !was_owned || previous.team != next.team {
        if was_owned {
            let slot = count_slot(counts, previous.team);
            *slot = slot.checked_sub(1).ok_or(Error::Overflow)?;
        }
        let slot = count_slot(counts, next.team);
        *slot = slot.checked_add(1).ok_or(Error::Overflow)?;
    }

    let key = DataKey::Pixel(id);
    env.storage().persistent().set(&key, next);
    extend_persistent_ttl(env, &key);
    Ok(())
}

fn count_slot(counts: &mut TeamCounts, team: Team) -> &mut u32 {
    match team {
        Team::A => &mut counts.count_a,
        Team::B => &mut counts.count_b,
    }
}

pub fn get_team_counts(env: &Env) -> TeamCounts {
    env.storage()
        .persistent()
        .get(&DataKey::TeamCounts)
        .unwrap_or_default()
}

pub fn set_team_counts(env: &Env, counts: &TeamCounts) {
    let key = DataKey::TeamCounts;
    env.storage().persistent().set(&key, counts);
    extend_persistent_ttl(env, &key);
}

// ---------------------------------------------------------------------------
// Escrow entries
// ---------------------------------------------------------------------------

pub fn get_pending(env: &Env, account: &Address) -> i128 {
    env.storage()
        .persistent()
        .get(&DataKey::Pending(account.clone()))
        .unwrap_or(0)
}

pub fn set_pending(env: &Env, account: &Address, amount: i128) {
    let key = DataKey::Pending(account.clone());
    if amount == 0 {
        env.storage().persistent().remove(&key);
    } else {
        env.storage().persistent().set(&key, &amount);
        extend_persistent_ttl(env, &key);
    }
}

pub fn get_ledger_totals(env: &Env) -> LedgerTotals {
    env.storage()
        .persistent()
        .get(&DataKey::LedgerTotals)
        .unwrap_or_default()
}

pub fn set_ledger_totals(env: &Env, totals: &LedgerTotals) {
    let key = DataKey::LedgerTotals;
    env.storage().persistent().set(&key, totals);
    extend_persistent_ttl(env, &key);
}
