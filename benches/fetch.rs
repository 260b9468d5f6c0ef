use bumpalo::Bump;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use vfetch::*;

fn layout(strategy: FetchStrategy) -> FetchDescriptor {
    FetchDescriptor::new(
        IndexType::U16,
        [
            InputElement::new(0, 0, Format::R32G32B32_FLOAT),
            InputElement::new(0, 12, Format::R16G16B16A16_SNORM),
            InputElement::new(0, 20, Format::R8G8B8A8_UNORM),
            InputElement::new(1, 0, Format::R32G32B32A32_FLOAT).per_instance(1),
        ],
    )
    .unwrap()
    .with_strategy(strategy)
}

fn criterion_benchmark(c: &mut Criterion) {
    for strategy in [FetchStrategy::Gather, FetchStrategy::Linear] {
        c.bench_function(&format!("{strategy:?} (compile)"), |b| {
            let descriptor = layout(strategy);
            let mut arena = Bump::new();

            b.iter(|| {
                black_box(FetchFunction::compile(&arena, &descriptor));
                arena.reset();
            });
        });

        c.bench_function(&format!("{strategy:?} (fetch)"), |b| {
            let function = FetchFunction::compile(&Bump::new(), &layout(strategy));

            let vertices = vec![0x3cu8; 24 * 4096];
            let instances = vec![0x3fu8; 16 * 16];
            let streams = [VertexBuffer::new(&vertices, 24), VertexBuffer::new(&instances, 16)];
            let indices: Vec<u8> = (0..4096u16).rev().flat_map(u16::to_le_bytes).collect();

            b.iter(|| {
                let batches = fetch_draw(&function, &streams, &indices, &DrawInfo::default());
                black_box(batches);
            });
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
