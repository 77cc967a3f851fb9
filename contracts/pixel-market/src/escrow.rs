//! Pull-payment escrow.
//!
//! Sale proceeds and overpayment refunds are credited here and only leave the
//! contract through `withdraw`. A balance is zeroed before the outgoing token
//! transfer is issued.

use soroban_sdk::{Address, Env, Map};

use crate::storage;
use crate::Error;

/// Add `amount` to `account`'s entry in a scratch credit map. Zero amounts
/// are dropped so they never create storage entries.
pub fn accrue(
    credits: &mut Map<Address, i128>,
    account: &Address,
    amount: i128,
) -> Result<(), Error> {
    if amount == 0 {
        return Ok(());
    }
    if amount < 0 {
        return Err(Error::InvalidAmount);
    }
    let current = credits.get(account.clone()).unwrap_or(0);
    let next = current.checked_add(amount).ok_or(Error::Overflow)?;
    credits.set(account.clone(), next);
    Ok(())
}

pub fn credit(env: &Env, account: &Address, amount: i128) -> Result<(), Error> {
    let next = storage::get_pending(env, account)
        .checked_add(amount)
        .ok_or(Error::Overflow)?;
    storage::set_pending(env, account, next);
    Ok(())
}

/// Apply every entry of a scratch credit map, one write per account.
pub fn credit_all(env: &Env, credits: &Map<Address, i128>) -> Result<(), Error> {
    for (account, amount) in credits.iter() {
        credit(env, &account, amount)?;
    }
    Ok(())
}

pub fn balance_of(env: &Env, account: &Address) -> i128 {
    storage::get_pending(env, account)
}

/// Record tokens pulled into the contract by a purchase.
pub fn record_received(env: &Env, amount: i128) -> Result<(), Error> {
    let mut totals = storage::get_ledger_totals(env);
    totals.total_received = totals
        .total_received
        .checked_add(amount)
        .ok_or(Error::Overflow)?;
    storage::set_ledger_totals(env, &totals);
    Ok(())
}

/// Zero `account`'s balance and return what it held. The caller performs the
/// token transfer afterwards.
pub fn take_balance(env: &Env, account: &Address) -> Result<i128, Error> {
    let amount = storage::get_pending(env, account);
    if amount <= 0 {
        return Err(Error::NothingToWithdraw);
    }

    let mut totals = storage::get_ledger_totals(env);
    totals.total_withdrawn = totals
        .total_withdrawn
        .checked_add(amount)
        .ok_or(Error::Overflow)?;

    storage::set_pending(env, account, 0);
    storage::set_ledger_totals(env, &totals);
    Ok(amount)
}
