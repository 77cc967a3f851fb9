//! Pixel pricing: resale step plus team-balance bias.
//!
//! ```text
//! unowned:  price = base_price * mult(team) / 10000
//! owned:    step  = last_paid * 3 / 2
//!           price = step * mult(team) / 10000
//!
//! mult(team) = clamp(10000 + alpha * (own - other) / (own + other), min, max)
//!            = 10000 when nobody owns anything
//! ```
//!
//! `own`/`other` are the cell counts of the requesting team and its rival.
//! Joining the leading team costs more, joining the trailing one costs less.
//! At equal counts both teams sit at exactly 10000. The division truncates
//! toward zero, so the two teams' deviations from 10000 are exact mirrors.

use shared::{apply_bps, BASIS_POINTS_DIVISOR};

use crate::types::{BiasParams, Pixel, Team, TeamCounts};
use crate::Error;

/// Share of a resale price paid to the previous owner; the rest goes to the
/// treasury.
pub const SELLER_SHARE_BPS: u32 = 9_000;

pub const STEP_NUMERATOR: i128 = 3;
pub const STEP_DENOMINATOR: i128 = 2;

/// Floor applied to every quote so that a sold pixel always records a
/// non-zero `last_paid`.
pub const MIN_PRICE: i128 = 1;

/// `0 < min <= 10000 <= max`, so a fresh canvas quotes exactly `base_price`.
pub fn bias_is_valid(bias: &BiasParams) -> bool {
    bias.min_mult_bps > 0
        && bias.min_mult_bps <= BASIS_POINTS_DIVISOR
        && bias.max_mult_bps >= BASIS_POINTS_DIVISOR
}

pub fn multiplier_bps(counts: &TeamCounts, team: Team, bias: &BiasParams) -> u32 {
    let (own, other) = counts.split(team);
    let total = own as i128 + other as i128;
    let neutral = BASIS_POINTS_DIVISOR as i128;

    let raw = if total == 0 {
        neutral
    } else {
        let lead = own as i128 - other as i128;
        neutral + (bias.alpha_bps as i128) * lead / total
    };

    raw.clamp(bias.min_mult_bps as i128, bias.max_mult_bps as i128) as u32
}

/// Resale base before the team bias; zero for a never-sold pixel.
pub fn step_price(last_paid: i128) -> Result<i128, Error> {
    last_paid
        .checked_mul(STEP_NUMERATOR)
        .map(|v| v / STEP_DENOMINATOR)
        .ok_or(Error::Overflow)
}

pub fn quote(pixel: &Pixel, base_price: i128, mult_bps: u32) -> Result<i128, Error> {
    let before_bias = match pixel.owner {
        Some(_) => step_price(pixel.last_paid)?,
        None => base_price,
    };
    let price = apply_bps(before_bias, mult_bps)?;
    Ok(price.max(MIN_PRICE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use soroban_sdk::{testutils::Address as _, Address, Env};

    fn bias() -> BiasParams {
        BiasParams {
            alpha_bps: 5_000,
            min_mult_bps: 5_000,
            max_mult_bps: 20_000,
        }
    }

    fn counts(a: u32, b: u32) -> TeamCounts {
        TeamCounts {
            count_a: a,
            count_b: b,
        }
    }

    #[test]
    fn test_multiplier_neutral_on_empty_canvas() {
        let c = counts(0, 0);
        assert_eq!(multiplier_bps(&c, Team::A, &bias()), 10_000);
        assert_eq!(multiplier_bps(&c, Team::B, &bias()), 10_000);
    }

    #[test]
    fn test_multiplier_neutral_at_equal_counts() {
        let c = counts(7, 7);
        assert_eq!(multiplier_bps(&c, Team::A, &bias()), 10_000);
        assert_eq!(multiplier_bps(&c, Team::B, &bias()), 10_000);
    }

    #[test]
    fn test_multiplier_penalizes_leader() {
        // A holds 3 of 4: lead = 2, 5000 * 2 / 4 = 2500
        let c = counts(3, 1);
        assert_eq!(multiplier_bps(&c, Team::A, &bias()), 12_500);
        assert_eq!(multiplier_bps(&c, Team::B, &bias()), 7_500);
    }

    #[test]
    fn test_multiplier_symmetric_between_teams() {
        for (a, b) in [(1u32, 2u32), (5, 0), (10, 3), (2, 9)] {
            let forward = counts(a, b);
            let mirrored = counts(b, a);
            assert_eq!(
                multiplier_bps(&forward, Team::A, &bias()),
                multiplier_bps(&mirrored, Team::B, &bias())
            );
            let up = multiplier_bps(&forward, Team::A, &bias()) as i64 - 10_000;
            let down = multiplier_bps(&forward, Team::B, &bias()) as i64 - 10_000;
            assert_eq!(up, -down);
        }
    }

    #[test]
    fn test_multiplier_monotone_in_own_share() {
        let mut last = 0u32;
        for own in 0..=10u32 {
            let m = multiplier_bps(&counts(own, 10 - own), Team::A, &bias());
            assert!(m >= last);
            last = m;
        }
    }

    #[test]
    fn test_multiplier_clamped() {
        let steep = BiasParams {
            alpha_bps: 50_000,
            min_mult_bps: 8_000,
            max_mult_bps: 11_000,
        };
        let c = counts(10, 0);
        assert_eq!(multiplier_bps(&c, Team::A, &steep), 11_000);
        assert_eq!(multiplier_bps(&c, Team::B, &steep), 8_000);
    }

    #[test]
    fn test_step_price_truncates() {
        assert_eq!(step_price(0), Ok(0));
        assert_eq!(step_price(1), Ok(1));
        assert_eq!(step_price(3), Ok(4));
        assert_eq!(step_price(1_000), Ok(1_500));
        assert_eq!(step_price(i128::MAX), Err(Error::Overflow));
    }

    #[test]
    fn test_quote_unowned_and_owned() {
        let env = Env::default();
        let unowned = Pixel::unowned();
        assert_eq!(quote(&unowned, 100, 10_000), Ok(100));
        assert_eq!(quote(&unowned, 100, 12_500), Ok(125));

        let owned = Pixel {
            owner: Some(Address::generate(&env)),
            last_paid: 100,
            color: 0xff0000,
            team: Team::A,
        };
        assert_eq!(quote(&owned, 100, 10_000), Ok(150));
        assert_eq!(quote(&owned, 100, 7_500), Ok(112));
    }

    #[test]
    fn test_quote_never_zero() {
        assert_eq!(quote(&Pixel::unowned(), 1, 5_000), Ok(MIN_PRICE));
    }

    #[test]
    fn test_bias_validation() {
        assert!(bias_is_valid(&bias()));
        assert!(!bias_is_valid(&BiasParams {
            alpha_bps: 0,
            min_mult_bps: 0,
            max_mult_bps: 10_000,
        }));
        assert!(!bias_is_valid(&BiasParams {
            alpha_bps: 0,
            min_mult_bps: 10_001,
            max_mult_bps: 20_000,
        }));
        assert!(!bias_is_valid(&BiasParams {
            alpha_bps: 0,
            min_mult_bps: 5_000,
            max_mult_bps: 9_999,
        }));
    }
}
