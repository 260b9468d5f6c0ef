//! Lane and byte selector constants for the gather and transpose paths.
//!
//! Byte masks act on every 16 byte block (four lanes) independently; lane masks span the whole register.

use crate::{ByteMask, LaneMask};
use vfetch_core::SIMD_WIDTH;

const BLOCKS: usize = SIMD_WIDTH / 4;

/// Group the bytes of an 8 bit per channel gather by destination channel.
///
/// Lane `c` of every block collects the bytes of channel `swizzle[c]` from the block's four lanes.
pub fn group_channels_8bpc(swizzle: [u8; 4]) -> ByteMask {
    std::array::from_fn(|i| (swizzle[i / 4] + 4 * (i % 4) as u8) as i8)
}

/// Group the halves of a 16 bit per channel gather: lanes 0-1 of every block hold the low halves,
/// lanes 2-3 the high halves.
pub const GROUP_CHANNELS_16BPC: ByteMask = [0, 1, 4, 5, 8, 9, 12, 13, 2, 3, 6, 7, 10, 11, 14, 15];

/// Move the source channel of every lane into its low bits and clear the rest.
pub fn zero_extend_mask(channel: u8, bits: u32) -> ByteMask {
    let bytes = (bits / 8) as usize;
    std::array::from_fn(|i| match i % 4 {
        b if b < bytes => (i - i % 4 + channel as usize * bytes + b) as i8,
        _ => -1,
    })
}

/// Collect a channel grouped by [`group_channels_8bpc`] or [`GROUP_CHANNELS_16BPC`]
/// into the low `SIMD_WIDTH` bytes or halfwords of the register.
pub fn channel_permute(channel: u8, bits: u32) -> LaneMask {
    let channel = channel as usize;
    let mut mask = [0; SIMD_WIDTH];

    match bits {
        8 => {
            for block in 0..BLOCKS {
                mask[block] = (4 * block + channel) as u8;
            }
        }
        16 => {
            for block in 0..BLOCKS {
                for half in 0..2 {
                    mask[2 * block + half] = (4 * block + 2 * (channel % 2) + half) as u8;
                }
            }
        }
        _ => panic!("no channel permute for {bits} bit channels"),
    }

    mask
}

/// Move lanes 0-3 of the second operand into block `block` of the first.
pub fn insert_mask(block: usize) -> LaneMask {
    std::array::from_fn(|i| match i / 4 == block {
        true => (SIMD_WIDTH + i % 4) as u8,
        false => i as u8,
    })
}

/// Interleave the low (`half = 0`) or high (`half = 1`) pair of every block of two registers.
pub fn interleave_mask(half: usize) -> LaneMask {
    std::array::from_fn(|i| {
        let base = i - i % 4 + 2 * half + (i % 4) / 2;
        match i % 2 {
            0 => base as u8,
            _ => (SIMD_WIDTH + base) as u8,
        }
    })
}

/// Concatenate the low (`half = 0`) or high (`half = 1`) pair of every block of two registers.
pub fn half_mask(half: usize) -> LaneMask {
    std::array::from_fn(|i| {
        let base = i - i % 4 + 2 * half + i % 2;
        match i % 4 < 2 {
            true => base as u8,
            false => (SIMD_WIDTH + base) as u8,
        }
    })
}

/// Rearrange lanes 0-3 by a format swizzle, leaving the other lanes in place.
pub fn swizzle_mask(swizzle: [u8; 4]) -> LaneMask {
    std::array::from_fn(|i| match i < 4 {
        true => swizzle[i],
        false => i as u8,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_8bpc_identity() {
        assert_eq!(
            group_channels_8bpc([0, 1, 2, 3]),
            [0, 4, 8, 12, 1, 5, 9, 13, 2, 6, 10, 14, 3, 7, 11, 15]
        );
        assert_eq!(&group_channels_8bpc([2, 1, 0, 3])[..4], &[2, 6, 10, 14]);
    }

    #[test]
    fn zero_extend() {
        assert_eq!(
            zero_extend_mask(2, 8),
            [2, -1, -1, -1, 6, -1, -1, -1, 10, -1, -1, -1, 14, -1, -1, -1]
        );
        assert_eq!(
            zero_extend_mask(1, 16),
            [2, 3, -1, -1, 6, 7, -1, -1, 10, 11, -1, -1, 14, 15, -1, -1]
        );
    }

    #[test]
    fn permutes() {
        let mask = channel_permute(3, 8);
        for block in 0..BLOCKS {
            assert_eq!(mask[block] as usize, 4 * block + 3);
        }

        let mask = channel_permute(1, 16);
        assert_eq!(&mask[..2], &[2, 3]);
        if SIMD_WIDTH >= 8 {
            assert_eq!(&mask[2..4], &[6, 7]);
        }
    }

    #[test]
    fn transpose_masks() {
        let mask = insert_mask(0);
        assert_eq!(&mask[..4], &[SIMD_WIDTH as u8, SIMD_WIDTH as u8 + 1, SIMD_WIDTH as u8 + 2, SIMD_WIDTH as u8 + 3]);

        let w = SIMD_WIDTH as u8;
        assert_eq!(&interleave_mask(0)[..4], &[0, w, 1, w + 1]);
        assert_eq!(&interleave_mask(1)[..4], &[2, w + 2, 3, w + 3]);
        assert_eq!(&half_mask(0)[..4], &[0, 1, w, w + 1]);
        assert_eq!(&half_mask(1)[..4], &[2, 3, w + 2, w + 3]);

        if SIMD_WIDTH >= 8 {
            assert_eq!(&interleave_mask(0)[4..8], &[4, w + 4, 5, w + 5]);
            assert_eq!(&half_mask(1)[4..8], &[6, 7, w + 6, w + 7]);
        }
    }

    #[test]
    fn masks_stay_in_range() {
        for half in 0..2 {
            assert!(interleave_mask(half).iter().all(|&m| (m as usize) < 2 * SIMD_WIDTH));
            assert!(half_mask(half).iter().all(|&m| (m as usize) < 2 * SIMD_WIDTH));
        }

        for channel in 0..4 {
            assert!(channel_permute(channel, 8).iter().all(|&m| (m as usize) < SIMD_WIDTH));
            assert!(channel_permute(channel, 16).iter().all(|&m| (m as usize) < SIMD_WIDTH));
            assert!(zero_extend_mask(channel, 8).iter().all(|&m| m < 16));
        }
    }
}
