use super::{
    convert::{Conversion, Extend, classify, control_vector, convert_gathered, default_component},
    ir::{IR, IRBuilder},
    tables::{GROUP_CHANNELS_16BPC, channel_permute, group_channels_8bpc, zero_extend_mask},
};
use crate::{ExpandKind, FetchParam, FetchTarget, StreamParam};
use log::trace;
use vfetch_core::{ComponentControl, ComponentKind, InputElement, Instancing, MAX_ATTRIBUTES};

/// Packs the components of consecutive elements into output rows, four per output element.
///
/// `None` marks a component that takes a slot but is never stored.
#[derive(Default)]
pub struct RowPacker<'a> {
    output: usize,
    count: usize,
    slots: [Option<IR<'a>>; 4],
}

impl<'a> RowPacker<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, builder: &mut IRBuilder<'a>, value: Option<IR<'a>>) {
        self.slots[self.count] = value;
        self.count += 1;

        if self.count == 4 {
            self.flush(builder);
        }
    }

    /// flush a trailing partial group, once
    pub fn finish(mut self, builder: &mut IRBuilder<'a>) {
        if self.count > 0 {
            self.flush(builder);
        }
    }

    fn flush(&mut self, builder: &mut IRBuilder<'a>) {
        assert!(self.output < MAX_ATTRIBUTES, "packed output exceeds {MAX_ATTRIBUTES} elements");

        for (component, slot) in self.slots[..self.count].iter().enumerate() {
            if let Some(value) = slot {
                builder.store(FetchTarget::Row(self.output as u8, component as u8), *value);
            }
        }

        trace!("flushed {} components into output element {}", self.count, self.output);

        self.output += 1;
        self.count = 0;
        self.slots = [None; 4];
    }
}

/// Fetch one element with a masked gather per 4 byte group.
pub fn fetch_gather<'a>(builder: &mut IRBuilder<'a>, packer: &mut RowPacker<'a>, element: &InputElement, indices: IR<'a>) {
    let values = gather_components(builder, element, indices);
    for value in values.into_iter().flatten() {
        packer.push(builder, value);
    }
}

/// Per component value of an element: `None` if the component is not packed, `Some(None)` for `NoStore`.
fn gather_components<'a>(builder: &IRBuilder<'a>, element: &InputElement, indices: IR<'a>) -> [Option<Option<IR<'a>>>; 4] {
    let info = element.format.info();
    let bits = info.bits_per_component();
    let bytes = info.bytes_per_pixel();
    let stream = element.stream as u8;

    let (current, start) = match element.instancing {
        Instancing::PerVertex => (
            builder.add_i(indices, builder.param(FetchParam::BaseVertex)),
            builder.param(FetchParam::StartVertex),
        ),
        Instancing::PerInstance(0) => (builder.lit_i(0), builder.param(FetchParam::StartInstance)),
        Instancing::PerInstance(step) => (
            builder.div_u(builder.param(FetchParam::CurInstance), builder.lit_i(step as i32)),
            builder.param(FetchParam::StartInstance),
        ),
    };

    let stride = builder.stream(stream, StreamParam::Pitch);
    let aligned_offset = builder.lit_i(element.offset as i32);

    // move the buffer start to the first fetched vertex, clamping the bounds at zero
    let max_vertex = builder.stream(stream, StreamParam::MaxVertex);
    let past_end = builder.lt_u(max_vertex, start);
    let max_vertex = builder.select(past_end, builder.lit_i(0), builder.sub_i(max_vertex, start));
    let partial_size = builder.select(past_end, builder.lit_i(0), builder.stream(stream, StreamParam::PartialSize));

    // bytes <= partial - offset, signed
    let element_in_bounds = builder.lt_i(
        builder.lit_i(bytes as i32 - 1),
        builder.sub_i(partial_size, aligned_offset),
    );
    let partial_oob = builder.eq_i(current, max_vertex);
    let in_bounds = builder.lt_u(current, max_vertex);
    let vertex_mask = builder.select(partial_oob, element_in_bounds, in_bounds);

    let base = builder.mul_i(start, stride);
    let offsets = builder.add_i(base, builder.add_i(builder.mul_i(current, stride), aligned_offset));

    // a zero pitch or an element reaching past the pitch passes the vertex test but not this one
    let end = builder.add_i(offsets, builder.lit_i(bytes as i32));
    let in_buffer = builder.and_i(
        builder.and_i(builder.le_u(aligned_offset, offsets), builder.le_u(offsets, end)),
        builder.le_u(end, builder.stream(stream, StreamParam::Size)),
    );
    let mask = builder.and_i(vertex_mask, in_buffer);

    let group = |g: u32| {
        let group_bytes = bytes.saturating_sub(4 * g).min(4);
        let offsets = builder.add_i(offsets, builder.lit_i(4 * g as i32));
        builder.gather(stream, group_bytes as u8, offsets, mask)
    };

    let source = |component: usize| -> IR<'a> {
        let kind = info.kind[component];
        match (kind, bits) {
            (ComponentKind::Float, 32) => group(component as u32),
            (ComponentKind::Float, 16) => {
                let grouped = builder.shuffle_bytes(group(component as u32 / 2), GROUP_CHANNELS_16BPC);
                let channel = builder.permute(grouped, channel_permute(component as u8, 16));
                builder.expand(ExpandKind::Half, channel)
            }
            (ComponentKind::Float, _) => panic!("gather fetch does not support {bits} bit float components"),

            (kind, 8) => {
                let (extend, conversion) = classify(kind);
                let raw = group(0);
                let value = match extend {
                    Extend::Sign => {
                        let grouped = builder.shuffle_bytes(raw, group_channels_8bpc(info.swizzle));
                        let channel = builder.permute(grouped, channel_permute(component as u8, 8));
                        builder.expand(ExpandKind::Sign8, channel)
                    }
                    _ => builder.shuffle_bytes(raw, zero_extend_mask(info.swizzle[component], 8)),
                };
                convert_gathered(builder, value, extend, conversion, 8)
            }

            (kind, 16) => {
                let (extend, conversion) = classify(kind);
                let raw = group(component as u32 / 2);
                let value = match extend {
                    Extend::Sign => {
                        let grouped = builder.shuffle_bytes(raw, GROUP_CHANNELS_16BPC);
                        let channel = builder.permute(grouped, channel_permute(component as u8, 16));
                        builder.expand(ExpandKind::Sign16, channel)
                    }
                    _ => builder.shuffle_bytes(raw, zero_extend_mask(component as u8 % 2, 16)),
                };
                convert_gathered(builder, value, extend, conversion, 16)
            }

            (kind, 32) => {
                let (_, conversion) = classify(kind);
                assert!(
                    conversion == Conversion::None,
                    "gather fetch does not support 32 bit {kind:?} components"
                );
                group(component as u32)
            }

            (kind, bits) => panic!("gather fetch does not support {bits} bit {kind:?} components"),
        }
    };

    std::array::from_fn(|component| {
        if !element.packing.contains(component) {
            return None;
        }

        Some(match element.control[component] {
            ComponentControl::StoreSrc if component < info.components as usize => Some(source(component)),
            ComponentControl::StoreSrc => Some(default_component(builder, component)),
            control => control_vector(builder, control),
        })
    })
}
