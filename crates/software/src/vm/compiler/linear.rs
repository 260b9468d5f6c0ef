use super::{
    convert::{convert_linear, default_component},
    ir::{IR, IRBuilder},
    tables::{half_mask, insert_mask, interleave_mask, swizzle_mask},
};
use crate::{FetchParam, FetchTarget, StreamParam, VertexLoad};
use vfetch_core::{InputElement, SIMD_WIDTH};

/// Fetch one element with a scalar load per lane, then transpose the lanes into component rows.
///
/// Packing, component control and instancing do not apply here: all four rows of `slot` are written.
pub fn fetch_linear<'a>(builder: &mut IRBuilder<'a>, slot: usize, element: &InputElement, indices: IR<'a>, checked: bool) {
    let info = element.format.info();
    let bits = info.bits_per_component();
    let kind = info.kind[0];
    let stream = element.stream as u8;

    let load = VertexLoad {
        bits: bits as u8,
        components: info.components as u8,
        signed: kind.is_signed(),
    };

    let stride = builder.stream(stream, StreamParam::Pitch);
    let vertex = builder.add_i(indices, builder.param(FetchParam::StartVertex));
    let vertex_base = builder.mul_i(vertex, stride);
    let offsets = builder.add_i(vertex_base, builder.lit_i(element.offset as i32));

    let valid = checked.then(|| {
        // vertices up to max_vertex start inside the buffer, so their byte offsets cannot wrap
        let max_vertex = builder.stream(stream, StreamParam::MaxVertex);
        let in_range = builder.and_i(builder.le_u(indices, vertex), builder.le_u(vertex, max_vertex));

        // the read must end inside the buffer without wrapping around
        let size = builder.stream(stream, StreamParam::Size);
        let end = builder.add_i(offsets, builder.lit_i(load.bytes() as i32));
        let in_buffer = builder.and_i(
            builder.and_i(builder.le_u(vertex_base, offsets), builder.le_u(offsets, end)),
            builder.le_u(end, size),
        );

        builder.and_i(in_range, in_buffer)
    });

    let lanes = std::array::from_fn(|lane| {
        let offset = builder.extract(lane as u8, offsets);
        let valid = match valid {
            Some(valid) => builder.extract(lane as u8, valid),
            None => builder.lit_true(),
        };

        let value = builder.load_vertex(stream, load, offset, valid);
        match info.swizzle {
            [0, 1, 2, 3] => value,
            swizzle => builder.permute(value, swizzle_mask(swizzle)),
        }
    });

    let rows = transpose(builder, &lanes);
    for (component, row) in rows.into_iter().enumerate() {
        let value = match component < info.components as usize {
            true => convert_linear(builder, row, kind, bits),
            false => default_component(builder, component),
        };

        builder.store(FetchTarget::Row(slot as u8, component as u8), value);
    }
}

/// Turn `SIMD_WIDTH` per-lane vectors (components in lanes 0-3) into four component-major vectors.
pub fn transpose<'a>(builder: &IRBuilder<'a>, lanes: &[IR<'a>; SIMD_WIDTH]) -> [IR<'a>; 4] {
    // block b of m[k] holds the vector of lane 4b + k
    let m: [IR<'a>; 4] = std::array::from_fn(|k| {
        (1..SIMD_WIDTH / 4).fold(lanes[k], |acc, block| builder.shuffle(acc, lanes[4 * block + k], insert_mask(block)))
    });

    // then a 4x4 transpose inside every block
    let t0 = builder.shuffle(m[0], m[1], interleave_mask(0));
    let t1 = builder.shuffle(m[0], m[1], interleave_mask(1));
    let t2 = builder.shuffle(m[2], m[3], interleave_mask(0));
    let t3 = builder.shuffle(m[2], m[3], interleave_mask(1));

    [
        builder.shuffle(t0, t2, half_mask(0)),
        builder.shuffle(t0, t2, half_mask(1)),
        builder.shuffle(t1, t3, half_mask(0)),
        builder.shuffle(t1, t3, half_mask(1)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{VMInterpreter, vm::compiler::ir::lower_to_opcodes};
    use bumpalo::Bump;
    use vfetch_core::{FetchContext, SimdVertex};

    #[test]
    fn transpose_lanes() {
        let arena = Bump::new();
        let mut builder = IRBuilder::new(&arena);

        let lanes = std::array::from_fn(|lane| builder.add_i(builder.lane_id(), builder.lit_i(100 * lane as i32)));
        let rows = transpose(&builder, &lanes);
        for (component, row) in rows.into_iter().enumerate() {
            builder.store(FetchTarget::Row(0, component as u8), row);
        }

        let program = lower_to_opcodes(&builder.finish(), &arena);
        let mut ctx = FetchContext::new(&[], &[]);
        let mut out = SimdVertex::new();
        VMInterpreter::new().execute(&program.opcodes, program.registers, &mut ctx, &mut out);

        for component in 0..4 {
            let expected: [u32; SIMD_WIDTH] = std::array::from_fn(|lane| (component + 100 * lane) as u32);
            assert_eq!(out.bits(0, component), expected, "component {component}");
        }
    }
}
