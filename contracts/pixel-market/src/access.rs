//! Capability checks and the pause switch.
//!
//! Every privileged entry point names the one [`Capability`] it needs. The two
//! capabilities are held independently; neither implies the other.

use soroban_sdk::{Address, Env};

use crate::storage::{self, DataKey};
use crate::types::Capability;
use crate::Error;

pub fn role_holder(env: &Env, capability: Capability) -> Result<Address, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Role(capability))
        .ok_or(Error::NotInitialized)
}

pub fn set_role_holder(env: &Env, capability: Capability, holder: &Address) {
    env.storage()
        .instance()
        .set(&DataKey::Role(capability), holder);
    storage::bump_instance(env);
}

/// Verify that `caller` holds `capability` and has signed the invocation.
pub fn require_capability(
    env: &Env,
    caller: &Address,
    capability: Capability,
) -> Result<(), Error> {
    let holder = role_holder(env, capability)?;
    caller.require_auth();
    if caller != &holder {
        return Err(Error::Forbidden);
    }
    Ok(())
}

pub fn is_paused(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::Paused)
        .unwrap_or(false)
}

pub fn set_paused(env: &Env, paused: bool) {
    env.storage().instance().set(&DataKey::Paused, &paused);
    storage::bump_instance(env);
}

pub fn require_not_paused(env: &Env) -> Result<(), Error> {
    if is_paused(env) {
        return Err(Error::Paused);
    }
    Ok(())
}
