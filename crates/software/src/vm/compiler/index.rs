use super::ir::{IR, IRBuilder};
use crate::FetchParam;
use vfetch_core::{IndexType, SIMD_WIDTH};

/// Load one index per lane, zero extended to 32 bits.
///
/// With `checked` set, lanes whose index lies at or past `LastIndex` read zero instead of touching memory.
pub fn load_lane_indices<'a>(builder: &IRBuilder<'a>, ty: IndexType, checked: bool) -> IR<'a> {
    if !checked {
        return builder.load_indices(ty);
    }

    let last_index = builder.param(FetchParam::LastIndex);
    match ty {
        IndexType::U8 | IndexType::U16 => {
            let bytes = ty.bytes();
            let mut indices = builder.lit_i(0);

            for lane in 0..SIMD_WIDTH {
                let addr = builder.lit_i((lane * bytes) as i32);
                let end = builder.lit_i(((lane + 1) * bytes) as i32);
                let valid = builder.le_u(end, last_index);
                let index = builder.load_index(ty, addr, valid);
                indices = builder.insert(lane as u8, indices, index);
            }

            indices
        }

        IndexType::U32 => {
            let remaining = builder.div_i(last_index, builder.lit_i(4));
            let mask = builder.gt_i(remaining, builder.lane_id());
            builder.load_indices_masked(ty, mask)
        }
    }
}
