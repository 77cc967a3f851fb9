//! Batch wire format.
//!
//! A batch of `n` items travels as three parallel byte strings:
//!
//! | array  | width per item | encoding                                   |
//! |--------|----------------|--------------------------------------------|
//! | ids    | 4 bytes        | u32 little-endian                          |
//! | colors | 3 bytes        | RGB big-endian (`0xRRGGBB`)                |
//! | teams  | 1 bit          | packed LSB-first, `ceil(n / 8)` bytes, 1=B |
//!
//! Ids must be strictly increasing, which rules out duplicates without a set.
//! Unused high bits of the last team byte are ignored.

use soroban_sdk::{Bytes, Env, Vec};

use crate::types::{BatchItem, Team};
use crate::Error;

pub const ID_WIDTH: u32 = 4;
pub const COLOR_WIDTH: u32 = 3;

/// Decode and validate a batch against a grid of `cell_count` cells.
pub fn decode_batch(
    env: &Env,
    ids: &Bytes,
    colors: &Bytes,
    teams: &Bytes,
    cell_count: u32,
    max_batch: u32,
) -> Result<Vec<BatchItem>, Error> {
    if ids.len() % ID_WIDTH != 0 {
        return Err(Error::BadId);
    }
    let n = ids.len() / ID_WIDTH;
    if n == 0 || n > max_batch {
        return Err(Error::BatchTooLarge);
    }
    let colors_len = n.checked_mul(COLOR_WIDTH).ok_or(Error::BadId)?;
    if colors.len() != colors_len || teams.len() != team_bytes_len(n) {
        return Err(Error::BadId);
    }

    let mut items = Vec::new(env);
    let mut previous: Option<u32> = None;
    for i in 0..n {
        let id = read_id(ids, i);
        if id >= cell_count {
            return Err(Error::BadId);
        }
        if let Some(prev) = previous {
            if id <= prev {
                return Err(Error::BadId);
            }
        }
        previous = Some(id);

        items.push_back(BatchItem {
            id,
            color: read_color(colors, i),
            team: read_team(teams, i),
        });
    }
    Ok(items)
}

pub fn team_bytes_len(n: u32) -> u32 {
    n.div_ceil(8)
}

fn read_id(ids: &Bytes, index: u32) -> u32 {
    let at = index * ID_WIDTH;
    u32::from_le_bytes([
        ids.get_unchecked(at),
        ids.get_unchecked(at + 1),
        ids.get_unchecked(at + 2),
        ids.get_unchecked(at + 3),
    ])
}

fn read_color(colors: &Bytes, index: u32) -> u32 {
    let at = index * COLOR_WIDTH;
    ((colors.get_unchecked(at) as u32) << 16)
        | ((colors.get_unchecked(at + 1) as u32) << 8)
        | colors.get_unchecked(at + 2) as u32
}

fn read_team(teams: &Bytes, index: u32) -> Team {
    let byte = teams.get_unchecked(index / 8);
    Team::from_bit(byte >> (index % 8))
}

/// Builds the three wire arrays for a batch. Items must be pushed in
/// ascending id order for the result to decode.
pub struct BatchEncoder {
    ids: Bytes,
    colors: Bytes,
    teams: Bytes,
    len: u32,
}

impl BatchEncoder {
    pub fn new(env: &Env) -> Self {
        BatchEncoder {
            ids: Bytes::new(env),
            colors: Bytes::new(env),
            teams: Bytes::new(env),
            len: 0,
        }
    }

    pub fn push(&mut self, id: u32, color: u32, team: Team) -> &mut Self {
        self.ids.extend_from_array(&id.to_le_bytes());
        let [_, r, g, b] = color.to_be_bytes();
        self.colors.extend_from_array(&[r, g, b]);

        let bit = self.len % 8;
        if bit == 0 {
            self.teams.push_back(0);
        }
        let at = self.len / 8;
        let byte = self.teams.get_unchecked(at) | (team.bit() << bit);
        self.teams.set(at, byte);
        self.len += 1;
        self
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// `(ids, colors, teams)`.
    pub fn finish(self) -> (Bytes, Bytes, Bytes) {
        (self.ids, self.colors, self.teams)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CELLS: u32 = 100;

    fn decode(env: &Env, ids: &[u8], colors: &[u8], teams: &[u8]) -> Result<Vec<BatchItem>, Error> {
        decode_batch(
            env,
            &Bytes::from_slice(env, ids),
            &Bytes::from_slice(env, colors),
            &Bytes::from_slice(env, teams),
            CELLS,
            16,
        )
    }

    #[test]
    fn test_decode_fields() {
        let env = Env::default();
        let items = decode_batch(
            &env,
            &Bytes::from_slice(&env, &[1, 0, 0, 0, 0x02, 0x01, 0, 0]),
            &Bytes::from_slice(&env, &[0x11, 0x22, 0x33, 0xa0, 0xb0, 0xc0]),
            &Bytes::from_slice(&env, &[0b0000_0010]),
            1_000,
            16,
        )
        .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(
            items.get(0).unwrap(),
            BatchItem {
                id: 1,
                color: 0x112233,
                team: Team::A
            }
        );
        assert_eq!(
            items.get(1).unwrap(),
            BatchItem {
                id: 258,
                color: 0xa0b0c0,
                team: Team::B
            }
        );
    }

    #[test]
    fn test_team_bits_span_bytes() {
        let env = Env::default();
        let mut enc = BatchEncoder::new(&env);
        for id in 0..10u32 {
            let team = if id == 0 || id == 9 { Team::B } else { Team::A };
            enc.push(id, 0, team);
        }
        let (ids, colors, teams) = enc.finish();
        assert_eq!(teams, Bytes::from_slice(&env, &[0b0000_0001, 0b0000_0010]));

        let items = decode_batch(&env, &ids, &colors, &teams, CELLS, 16).unwrap();
        assert_eq!(items.get(0).unwrap().team, Team::B);
        assert_eq!(items.get(1).unwrap().team, Team::A);
        assert_eq!(items.get(8).unwrap().team, Team::A);
        assert_eq!(items.get(9).unwrap().team, Team::B);
    }

    #[test]
    fn test_padding_bits_ignored() {
        let env = Env::default();
        let items = decode(&env, &[5, 0, 0, 0], &[0, 0, 0], &[0b1111_1110]).unwrap();
        assert_eq!(items.get(0).unwrap().team, Team::A);
    }

    #[test]
    fn test_length_mismatches_rejected() {
        let env = Env::default();
        // ids not a multiple of 4
        assert_eq!(decode(&env, &[1, 0, 0], &[0, 0, 0], &[0]), Err(Error::BadId));
        // colors short
        assert_eq!(decode(&env, &[1, 0, 0, 0], &[0, 0], &[0]), Err(Error::BadId));
        // team byte missing
        assert_eq!(decode(&env, &[1, 0, 0, 0], &[0, 0, 0], &[]), Err(Error::BadId));
        // extra team byte
        assert_eq!(decode(&env, &[1, 0, 0, 0], &[0, 0, 0], &[0, 0]), Err(Error::BadId));
    }

    #[test]
    fn test_empty_and_oversized_batches_rejected() {
        let env = Env::default();
        assert_eq!(decode(&env, &[], &[], &[]), Err(Error::BatchTooLarge));

        let mut enc = BatchEncoder::new(&env);
        for id in 0..17u32 {
            enc.push(id, 0, Team::A);
        }
        let (ids, colors, teams) = enc.finish();
        assert_eq!(
            decode_batch(&env, &ids, &colors, &teams, CELLS, 16),
            Err(Error::BatchTooLarge)
        );
    }

    #[test]
    fn test_item_count_checked_before_array_lengths() {
        let env = Env::default();
        let mut enc = BatchEncoder::new(&env);
        for id in 0..17u32 {
            enc.push(id, 0, Team::A);
        }
        let (ids, _, teams) = enc.finish();
        let short_colors = Bytes::from_slice(&env, &[0; 5]);
        assert_eq!(
            decode_batch(&env, &ids, &short_colors, &teams, CELLS, 16),
            Err(Error::BatchTooLarge)
        );

        // Within the limit the same mismatch is a bad id.
        let mut enc = BatchEncoder::new(&env);
        enc.push(0, 0, Team::A).push(1, 0, Team::A);
        let (ids, _, teams) = enc.finish();
        assert_eq!(
            decode_batch(&env, &ids, &short_colors, &teams, CELLS, 16),
            Err(Error::BadId)
        );
    }

    #[test]
    fn test_out_of_range_id_rejected() {
        let env = Env::default();
        let last = (CELLS - 1).to_le_bytes();
        assert!(decode(&env, &last, &[0, 0, 0], &[0]).is_ok());
        let first_bad = CELLS.to_le_bytes();
        assert_eq!(decode(&env, &first_bad, &[0, 0, 0], &[0]), Err(Error::BadId));
    }

    #[test]
    fn test_unsorted_and_duplicate_ids_rejected() {
        let env = Env::default();
        let colors = [0u8; 6];
        assert_eq!(
            decode(&env, &[2, 0, 0, 0, 1, 0, 0, 0], &colors, &[0]),
            Err(Error::BadId)
        );
        assert_eq!(
            decode(&env, &[2, 0, 0, 0, 2, 0, 0, 0], &colors, &[0]),
            Err(Error::BadId)
        );
        assert!(decode(&env, &[1, 0, 0, 0, 2, 0, 0, 0], &colors, &[0]).is_ok());
    }

    #[test]
    fn test_encoder_matches_decoder() {
        let env = Env::default();
        let mut enc = BatchEncoder::new(&env);
        enc.push(3, 0xffffff, Team::B).push(40, 0x000001, Team::A);
        assert_eq!(enc.len(), 2);
        let (ids, colors, teams) = enc.finish();

        assert_eq!(ids, Bytes::from_slice(&env, &[3, 0, 0, 0, 40, 0, 0, 0]));
        assert_eq!(colors, Bytes::from_slice(&env, &[0xff, 0xff, 0xff, 0, 0, 1]));
        assert_eq!(teams, Bytes::from_slice(&env, &[0b01]));
    }
}
