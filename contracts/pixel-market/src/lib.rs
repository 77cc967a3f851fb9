//! Pixelwar Market Contract
//!
//! Sells and re-sells the cells of a fixed `width x height` canvas to two
//! competing teams. Purchases arrive as batches in a compact binary format
//! (see [`codec`]), are priced by a resale step and a team-balance bias (see
//! [`pricing`]), and settle into a pull-payment escrow (see [`escrow`]).
//!
//! ## Purchase flow
//! 1. Reject while paused.
//! 2. Decode and validate the batch.
//! 3. Quote every item against the state at call start. Nothing is written.
//! 4. Check the total against the buyer's `max_total` and `payment`.
//! 5. Pull `payment` from the buyer, then write every pixel, the team counts
//!    and the escrow credits, and publish one `PixelPurchased` per cell.
//!
//! Any failure in 1-4 returns before the first write, so a rejected batch
//! leaves no trace.
//!
//! ## Settlement
//! First sale: the whole price goes to the treasury. Resale: 90% to the
//! previous owner, the rest to the treasury. Overpayment is credited back to
//! the buyer. All of it is withdrawn later with `withdraw`.
#![no_std]
#![allow(unexpected_cfgs)]

use soroban_sdk::{
    contract, contracterror, contractevent, contractimpl, token::TokenClient, Address, Bytes,
    Env, Map, Vec,
};

use shared::{split_bps, MathError};

pub mod access;
pub mod codec;
pub mod escrow;
pub mod pricing;
pub mod storage;
pub mod types;

pub use codec::BatchEncoder;
pub use types::{
    BatchItem, BiasParams, CanvasConfig, CanvasParams, Capability, LedgerTotals, Pixel,
    PurchaseReceipt, Team, TeamCounts,
};

// ---------------------------------------------------------------------------
// Error Types
// ---------------------------------------------------------------------------

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized  = 1,
    NotInitialized      = 2,
    /// Caller does not hold the capability the operation requires.
    Forbidden           = 3,
    /// Pixel id out of range, or a malformed / unsorted batch.
    BadId               = 4,
    /// Empty batch, or more items than `max_batch`.
    BatchTooLarge       = 5,
    /// Quoted total exceeds the buyer's `max_total`.
    SlippageExceeded    = 6,
    InsufficientPayment = 7,
    Paused              = 8,
    AlreadyPaused       = 9,
    NotPaused           = 10,
    InvalidConfig       = 11,
    InvalidAmount       = 12,
    NothingToWithdraw   = 13,
    Overflow            = 14,
}

impl From<MathError> for Error {
    fn from(err: MathError) -> Self {
        match err {
            MathError::NegativeAmount => Error::InvalidAmount,
            MathError::Overflow | MathError::InvalidBps => Error::Overflow,
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[contractevent]
pub struct Initialized {
    pub config_admin: Address,
    pub pause_admin: Address,
    pub treasury: Address,
    pub token: Address,
    pub width: u32,
    pub height: u32,
}

#[contractevent]
pub struct PixelPurchased {
    #[topic]
    pub id: u32,
    #[topic]
    pub buyer: Address,
    pub previous_owner: Option<Address>,
    pub price: i128,
    pub color: u32,
    pub team: Team,
}

#[contractevent]
pub struct Withdrawn {
    #[topic]
    pub account: Address,
    pub amount: i128,
}

#[contractevent]
pub struct MaxBatchUpdated {
    pub max_batch: u32,
    pub admin: Address,
}

#[contractevent]
pub struct PauseChanged {
    pub paused: bool,
    pub admin: Address,
}

#[contractevent]
pub struct RoleTransferred {
    #[topic]
    pub capability: Capability,
    pub from: Address,
    pub to: Address,
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

#[contract]
pub struct PixelMarket;

#[contractimpl]
impl PixelMarket {
    // -----------------------------------------------------------------------
    // init
    // -----------------------------------------------------------------------

    /// Initialize the canvas. May only be called once.
    ///
    /// `config_admin` receives the `Configure` capability and `pause_admin`
    /// the `Pause` capability; they may be the same address.
    pub fn init(
        env: Env,
        config_admin: Address,
        pause_admin: Address,
        params: CanvasParams,
    ) -> Result<(), Error> {
        if storage::is_initialized(&env) {
            return Err(Error::AlreadyInitialized);
        }

        config_admin.require_auth();

        if params.width == 0 || params.height == 0 {
            return Err(Error::InvalidConfig);
        }
        params
            .width
            .checked_mul(params.height)
            .ok_or(Error::InvalidConfig)?;
        if params.base_price <= 0 || params.max_batch == 0 {
            return Err(Error::InvalidConfig);
        }
        if !pricing::bias_is_valid(&params.bias) {
            return Err(Error::InvalidConfig);
        }

        let config = CanvasConfig {
            width: params.width,
            height: params.height,
            base_price: params.base_price,
            treasury: params.treasury,
            token: params.token,
            max_batch: params.max_batch,
            bias: params.bias,
        };
        storage::set_config(&env, &config);
        access::set_role_holder(&env, Capability::Configure, &config_admin);
        access::set_role_holder(&env, Capability::Pause, &pause_admin);
        access::set_paused(&env, false);

        // Seed persistent counters so downstream reads never encounter None.
        storage::set_team_counts(&env, &TeamCounts::default());
        storage::set_ledger_totals(&env, &LedgerTotals::default());

        Initialized {
            config_admin,
            pause_admin,
            treasury: config.treasury,
            token: config.token,
            width: config.width,
            height: config.height,
        }
        .publish(&env);

        Ok(())
    }

    // -----------------------------------------------------------------------
    // buy_batch
    // -----------------------------------------------------------------------

    /// Buy (or recolor) every pixel in the batch for `buyer`.
    ///
    /// `payment` tokens are pulled from `buyer`; whatever exceeds the quoted
    /// total is credited to the buyer's escrow balance. `max_total` caps the
    /// total the buyer accepts, guarding against prices that moved since the
    /// client quoted them.
    pub fn buy_batch(
        env: Env,
        buyer: Address,
        ids: Bytes,
        colors: Bytes,
        teams: Bytes,
        max_total: i128,
        payment: i128,
    ) -> Result<Vec<PurchaseReceipt>, Error> {
        let config = storage::get_config(&env)?;
        access::require_not_paused(&env)?;
        if payment < 0 {
            return Err(Error::InvalidAmount);
        }

        buyer.require_auth();

        let items = codec::decode_batch(
            &env,
            &ids,
            &colors,
            &teams,
            config.cell_count(),
            config.max_batch,
        )?;

        let start_counts = storage::get_team_counts(&env);
        let (planned, total) = plan_batch(&env, &config, &start_counts, &items)?;

        if total > max_total {
            return Err(Error::SlippageExceeded);
        }
        if payment < total {
            return Err(Error::InsufficientPayment);
        }

        let contract_address = env.current_contract_address();
        TokenClient::new(&env, &config.token).transfer(&buyer, &contract_address, &payment);
        escrow::record_received(&env, payment)?;

        // Commit pass.
        let mut counts = start_counts;
        let mut credits: Map<Address, i128> = Map::new(&env);
        let mut receipts = Vec::new(&env);
        for (item, previous, price) in planned.iter() {
            let next = Pixel {
                owner: Some(buyer.clone()),
                last_paid: price,
                color: item.color,
                team: item.team,
            };
            storage::set_pixel(&env, &mut counts, item.id, &previous, &next)?;

            match &previous.owner {
                Some(seller) => {
                    let (seller_share, treasury_share) =
                        split_bps(price, pricing::SELLER_SHARE_BPS)?;
                    escrow::accrue(&mut credits, seller, seller_share)?;
                    escrow::accrue(&mut credits, &config.treasury, treasury_share)?;
                }
                None => escrow::accrue(&mut credits, &config.treasury, price)?,
            }

            PixelPurchased {
                id: item.id,
                buyer: buyer.clone(),
                previous_owner: previous.owner.clone(),
                price,
                color: item.color,
                team: item.team,
            }
            .publish(&env);

            receipts.push_back(PurchaseReceipt {
                id: item.id,
                previous_owner: previous.owner,
                price,
                color: item.color,
                team: item.team,
            });
        }

        let surplus = payment.checked_sub(total).ok_or(Error::Overflow)?;
        escrow::accrue(&mut credits, &buyer, surplus)?;

        storage::set_team_counts(&env, &counts);
        escrow::credit_all(&env, &credits)?;
        storage::bump_instance(&env);

        Ok(receipts)
    }

    // -----------------------------------------------------------------------
    // withdraw
    // -----------------------------------------------------------------------

    /// Pay out `caller`'s whole escrow balance. Available while paused.
    pub fn withdraw(env: Env, caller: Address) -> Result<i128, Error> {
        let config = storage::get_config(&env)?;

        caller.require_auth();

        // Balance is zeroed before the transfer below.
        let amount = escrow::take_balance(&env, &caller)?;

        let contract_address = env.current_contract_address();
        TokenClient::new(&env, &config.token).transfer(&contract_address, &caller, &amount);

        Withdrawn {
            account: caller,
            amount,
        }
        .publish(&env);

        Ok(amount)
    }

    // -----------------------------------------------------------------------
    // Role-gated configuration
    // -----------------------------------------------------------------------

    pub fn set_max_batch(env: Env, caller: Address, max_batch: u32) -> Result<(), Error> {
        let mut config = storage::get_config(&env)?;
        access::require_capability(&env, &caller, Capability::Configure)?;

        if max_batch == 0 {
            return Err(Error::InvalidConfig);
        }

        config.max_batch = max_batch;
        storage::set_config(&env, &config);

        MaxBatchUpdated {
            max_batch,
            admin: caller,
        }
        .publish(&env);
        Ok(())
    }

    pub fn pause(env: Env, caller: Address) -> Result<(), Error> {
        access::require_capability(&env, &caller, Capability::Pause)?;
        if access::is_paused(&env) {
            return Err(Error::AlreadyPaused);
        }

        access::set_paused(&env, true);
        PauseChanged {
            paused: true,
            admin: caller,
        }
        .publish(&env);
        Ok(())
    }

    pub fn unpause(env: Env, caller: Address) -> Result<(), Error> {
        access::require_capability(&env, &caller, Capability::Pause)?;
        if !access::is_paused(&env) {
            return Err(Error::NotPaused);
        }

        access::set_paused(&env, false);
        PauseChanged {
            paused: false,
            admin: caller,
        }
        .publish(&env);
        Ok(())
    }

    /// Hand `capability` to `new_holder`. Only its current holder may do so.
    pub fn transfer_role(
        env: Env,
        caller: Address,
        capability: Capability,
        new_holder: Address,
    ) -> Result<(), Error> {
        access::require_capability(&env, &caller, capability)?;

        access::set_role_holder(&env, capability, &new_holder);
        RoleTransferred {
            capability,
            from: caller,
            to: new_holder,
        }
        .publish(&env);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    pub fn width(env: Env) -> Result<u32, Error> {
        Ok(storage::get_config(&env)?.width)
    }

    pub fn height(env: Env) -> Result<u32, Error> {
        Ok(storage::get_config(&env)?.height)
    }

    pub fn base_price(env: Env) -> Result<i128, Error> {
        Ok(storage::get_config(&env)?.base_price)
    }

    pub fn max_batch(env: Env) -> Result<u32, Error> {
        Ok(storage::get_config(&env)?.max_batch)
    }

    pub fn get_config(env: Env) -> Result<CanvasConfig, Error> {
        storage::get_config(&env)
    }

    pub fn get_pixel(env: Env, id: u32) -> Result<Pixel, Error> {
        let config = storage::get_config(&env)?;
        storage::read_pixel(&env, &config, id)
    }

    /// `count` consecutive pixels starting at `start`, for viewport rendering.
    /// `count` is capped by `max_batch`.
    pub fn get_pixels(env: Env, start: u32, count: u32) -> Result<Vec<Pixel>, Error> {
        let config = storage::get_config(&env)?;
        if count == 0 || count > config.max_batch {
            return Err(Error::BatchTooLarge);
        }
        let end = start.checked_add(count).ok_or(Error::BadId)?;
        if end > config.cell_count() {
            return Err(Error::BadId);
        }

        let mut pixels = Vec::new(&env);
        for id in start..end {
            pixels.push_back(storage::get_pixel(&env, id));
        }
        Ok(pixels)
    }

    /// Resale step (`last_paid * 3 / 2`) before the team bias.
    pub fn get_step_price(env: Env, id: u32) -> Result<i128, Error> {
        let config = storage::get_config(&env)?;
        let pixel = storage::read_pixel(&env, &config, id)?;
        pricing::step_price(pixel.last_paid)
    }

    pub fn get_multiplier_bps(env: Env, team: Team) -> Result<u32, Error> {
        let config = storage::get_config(&env)?;
        let counts = storage::get_team_counts(&env);
        Ok(pricing::multiplier_bps(&counts, team, &config.bias))
    }

    pub fn quote_price(env: Env, id: u32, team: Team) -> Result<i128, Error> {
        let config = storage::get_config(&env)?;
        let pixel = storage::read_pixel(&env, &config, id)?;
        let counts = storage::get_team_counts(&env);
        let mult = pricing::multiplier_bps(&counts, team, &config.bias);
        pricing::quote(&pixel, config.base_price, mult)
    }

    /// Total `buy_batch` would charge for the same arrays right now.
    pub fn quote_batch(env: Env, ids: Bytes, colors: Bytes, teams: Bytes) -> Result<i128, Error> {
        let config = storage::get_config(&env)?;
        let items = codec::decode_batch(
            &env,
            &ids,
            &colors,
            &teams,
            config.cell_count(),
            config.max_batch,
        )?;

        let counts = storage::get_team_counts(&env);
        let (_, total) = plan_batch(&env, &config, &counts, &items)?;
        Ok(total)
    }

    pub fn get_team_counts(env: Env) -> TeamCounts {
        storage::get_team_counts(&env)
    }

    pub fn pending_balance(env: Env, account: Address) -> i128 {
        escrow::balance_of(&env, &account)
    }

    pub fn ledger_totals(env: Env) -> LedgerTotals {
        storage::get_ledger_totals(&env)
    }

    pub fn is_paused(env: Env) -> bool {
        access::is_paused(&env)
    }

    pub fn role_holder(env: Env, capability: Capability) -> Result<Address, Error> {
        access::role_holder(&env, capability)
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Quote every item against `counts` and the current pixels without writing
/// anything. Returns each item with its pre-purchase pixel and price, plus
/// the batch total.
fn plan_batch(
    env: &Env,
    config: &CanvasConfig,
    counts: &TeamCounts,
    items: &Vec<BatchItem>,
) -> Result<(Vec<(BatchItem, Pixel, i128)>, i128), Error> {
    let mut planned = Vec::new(env);
    let mut total: i128 = 0;
    for item in items.iter() {
        let previous = storage::get_pixel(env, item.id);
        let mult = pricing::multiplier_bps(counts, item.team, &config.bias);
        let price = pricing::quote(&previous, config.base_price, mult)?;
        total = total.checked_add(price).ok_or(Error::Overflow)?;
        planned.push_back((item, previous, price));
    }
    Ok((planned, total))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
