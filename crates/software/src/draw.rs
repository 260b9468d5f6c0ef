use crate::{FetchFunction, VMInterpreter, simd::dispatch};
use log::trace;
use vfetch_core::{FetchContext, SIMD_WIDTH, SimdInt, SimdVertex, VertexBuffer};

/// Per draw arguments of the fetch call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawInfo {
    pub start_vertex: u32,
    pub base_vertex: i32,
    pub start_instance: u32,
    /// instance being drawn, relative to `start_instance`
    pub instance: u32,
}

/// Output of one fetch call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedBatch {
    pub vertex: SimdVertex,
    pub vertex_id: SimdInt,
    pub cut_mask: SimdInt,
}

/// Run `function` over every `SIMD_WIDTH` sized batch of `indices`.
///
/// The last batch sees only the remaining indices, the lanes past them are handled by the
/// function's own bounds checks. Functions compiled without them panic on a partial batch.
pub fn fetch_draw(function: &FetchFunction, streams: &[VertexBuffer], indices: &[u8], info: &DrawInfo) -> Vec<FetchedBatch> {
    let batch_bytes = SIMD_WIDTH * function.index_type().bytes();
    let batch_count = indices.len().div_ceil(batch_bytes);
    let mut batches = vec![FetchedBatch::default(); batch_count];

    trace!("fetching {batch_count} batches of {} index bytes", indices.len());

    let run = |vm: &mut VMInterpreter, batch: usize, out: &mut FetchedBatch| {
        let mut ctx = FetchContext::new(streams, &indices[batch * batch_bytes..]);
        ctx.start_vertex = info.start_vertex;
        ctx.base_vertex = info.base_vertex;
        ctx.start_instance = info.start_instance;
        ctx.cur_instance = info.instance;

        function.fetch_with(vm, &mut ctx, &mut out.vertex);
        out.vertex_id = ctx.vertex_id;
        out.cut_mask = ctx.cut_mask;
    };

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        batches
            .par_iter_mut()
            .enumerate()
            .for_each_init(VMInterpreter::new, |vm, (batch, out)| dispatch(|| run(vm, batch, out)));
    }

    #[cfg(not(feature = "parallel"))]
    dispatch(|| {
        let mut vm = VMInterpreter::new();
        for (batch, out) in batches.iter_mut().enumerate() {
            run(&mut vm, batch, out);
        }
    });

    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use vfetch_core::{FetchDescriptor, Format, IndexType, InputElement};

    #[test]
    fn batches_cover_every_index() {
        let descriptor = FetchDescriptor::new(IndexType::U16, vec![InputElement::new(0, 0, Format::R32_UINT)]).unwrap();
        let function = FetchFunction::compile(&Bump::new(), &descriptor);

        let vertices: Vec<u8> = (0..64u32).flat_map(|v| (v * 10).to_le_bytes()).collect();
        let streams = [VertexBuffer::new(&vertices, 4)];

        let count = SIMD_WIDTH + 3;
        let indices: Vec<u8> = (0..count as u16).map(|i| 2 * i).flat_map(u16::to_le_bytes).collect();

        let batches = fetch_draw(&function, &streams, &indices, &DrawInfo::default());
        assert_eq!(batches.len(), 2);

        for i in 0..count {
            let batch = &batches[i / SIMD_WIDTH];
            let lane = i % SIMD_WIDTH;
            assert_eq!(batch.vertex_id[lane], 2 * i as u32);
            assert_eq!(batch.vertex.bits(0, 0)[lane], 20 * i as u32);
        }

        // lanes past the last index read index 0
        assert_eq!(batches[1].vertex_id[3], 0);
        assert_eq!(batches[1].vertex.bits(0, 0)[3], 0);
    }

    #[test]
    fn draw_arguments_reach_the_function() {
        let element = InputElement::new(0, 0, Format::R32_UINT).per_instance(1);
        let descriptor = FetchDescriptor::new(IndexType::U32, vec![element]).unwrap();
        let function = FetchFunction::compile(&Bump::new(), &descriptor);

        let instances: Vec<u8> = (0..8u32).flat_map(|v| (100 + v).to_le_bytes()).collect();
        let streams = [VertexBuffer::new(&instances, 4)];
        let indices = [0u8; 4 * SIMD_WIDTH];

        let info = DrawInfo {
            start_instance: 2,
            instance: 3,
            ..DrawInfo::default()
        };
        let batches = fetch_draw(&function, &streams, &indices, &info);
        assert_eq!(batches[0].vertex.bits(0, 0), [105; SIMD_WIDTH]);
    }
}
