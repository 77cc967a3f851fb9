use soroban_sdk::{contracttype, Address};

/// The two competing teams. Encoded on the wire as one bit per item
/// (0 = `A`, 1 = `B`).
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Team {
    A = 0,
    B = 1,
}

impl Team {
    pub fn from_bit(bit: u8) -> Self {
        if bit & 1 == 1 {
            Team::B
        } else {
            Team::A
        }
    }

    pub fn bit(self) -> u8 {
        match self {
            Team::A => 0,
            Team::B => 1,
        }
    }
}

/// State of one grid cell.
///
/// `owner == None` iff `last_paid == 0` iff the cell was never sold. `team` is
/// only meaningful while the cell has an owner.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pixel {
    pub owner: Option<Address>,
    pub last_paid: i128,
    /// 24-bit RGB, `0xRRGGBB`.
    pub color: u32,
    pub team: Team,
}

impl Pixel {
    pub fn unowned() -> Self {
        Pixel {
            owner: None,
            last_paid: 0,
            color: 0,
            team: Team::A,
        }
    }
}

/// Number of cells currently held by each team.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TeamCounts {
    pub count_a: u32,
    pub count_b: u32,
}

impl TeamCounts {
    /// `(own, other)` from the point of view of `team`.
    pub fn split(&self, team: Team) -> (u32, u32) {
        match team {
            Team::A => (self.count_a, self.count_b),
            Team::B => (self.count_b, self.count_a),
        }
    }
}

/// Team-balance bias parameters, all in basis points.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BiasParams {
    /// Slope of the multiplier against the requesting team's lead.
    pub alpha_bps: u32,
    pub min_mult_bps: u32,
    pub max_mult_bps: u32,
}

/// Everything `init` needs besides the two role holders.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CanvasParams {
    pub width: u32,
    pub height: u32,
    pub base_price: i128,
    pub treasury: Address,
    /// SEP-41 token buyers pay in and withdrawals are paid out in.
    pub token: Address,
    pub max_batch: u32,
    pub bias: BiasParams,
}

/// Stored canvas configuration. Only `max_batch` changes after `init`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    pub base_price: i128,
    pub treasury: Address,
    pub token: Address,
    pub max_batch: u32,
    pub bias: BiasParams,
}

impl CanvasConfig {
    /// Number of addressable cells; ids are valid in `0..cell_count()`.
    /// `init` guarantees `width * height` fits in a `u32`.
    pub fn cell_count(&self) -> u32 {
        self.width.saturating_mul(self.height)
    }
}

/// One decoded purchase item.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BatchItem {
    pub id: u32,
    pub color: u32,
    pub team: Team,
}

/// Returned by `buy_batch`, one per purchased cell, mirroring the
/// `PixelPurchased` event.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PurchaseReceipt {
    pub id: u32,
    pub previous_owner: Option<Address>,
    pub price: i128,
    pub color: u32,
    pub team: Team,
}

/// Running escrow totals. `total_received - total_withdrawn` equals the sum
/// of all pending balances.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LedgerTotals {
    pub total_received: i128,
    pub total_withdrawn: i128,
}

/// Capabilities that gate privileged operations. Each has exactly one holder.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Capability {
    /// Changes `max_batch`.
    Configure = 0,
    /// Toggles the pause flag.
    Pause = 1,
}
