use super::{ExpandKind, FetchParam, FetchTarget, StreamParam, VMOp, VMOpcode, VMReg, VertexLoad};
use bytemuck::{Pod, Zeroable};
use half::f16;
use vfetch_core::{FetchContext, IndexType, SIMD_WIDTH, SimdVertex, VertexBuffer};

/// One vm register: a vector of `SIMD_WIDTH` 32-bit lanes.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct VMLanes(pub [u32; SIMD_WIDTH]);

impl VMLanes {
    pub fn splat(value: u32) -> Self {
        Self([value; SIMD_WIDTH])
    }

    #[inline(always)]
    pub fn view<T: Pod>(&self) -> &[T; SIMD_WIDTH] {
        bytemuck::cast_ref(&self.0)
    }

    #[inline(always)]
    pub fn view_mut<T: Pod>(&mut self) -> &mut [T; SIMD_WIDTH] {
        bytemuck::cast_mut(&mut self.0)
    }

    /// little endian byte image of the register
    pub fn to_bytes(self) -> [u8; SIMD_WIDTH * 4] {
        bytemuck::cast(self.0.map(u32::to_le))
    }

    pub fn from_bytes(bytes: [u8; SIMD_WIDTH * 4]) -> Self {
        Self(bytemuck::cast::<_, [u32; SIMD_WIDTH]>(bytes).map(u32::from_le))
    }
}

/// Register file for running fetch opcodes.
///
/// An interpreter can be reused across calls and functions, registers are resized on every run.
#[derive(Debug, Default)]
pub struct VMInterpreter {
    registers: Vec<VMLanes>,
}

impl VMInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `ops` against a fetch context.
    ///
    /// Panics if a load falls outside of the slices provided by `ctx`, or if an op references an unbound stream.
    pub fn execute(&mut self, ops: &[VMOpcode], registers: VMReg, ctx: &mut FetchContext, out: &mut SimdVertex) {
        use VMOp::*;

        self.registers.clear();
        self.registers.resize(registers as usize, VMLanes::default());

        macro_rules! op {
            (|$a:ident: $ta:ty, $o:ident: mut $to:ty| $x:expr) => {{
                let src = self.registers[$a as usize];
                let dst = &mut self.registers[$o as usize];
                for (&$a, lane) in src.view::<$ta>().iter().zip(dst.view_mut::<$to>()) {
                    *lane = $x;
                }
            }};

            (|$a:ident: $ta:ty, $b:ident: $tb:ty, $o:ident: mut $to:ty| $x:expr) => {{
                let src_a = self.registers[$a as usize];
                let src_b = self.registers[$b as usize];
                let dst = &mut self.registers[$o as usize];
                for ((&$a, &$b), lane) in src_a
                    .view::<$ta>()
                    .iter()
                    .zip(src_b.view::<$tb>())
                    .zip(dst.view_mut::<$to>())
                {
                    *lane = $x;
                }
            }};

            (|$a:ident: $ta:ty, $b:ident: $tb:ty, $c:ident: $tc:ty, $o:ident: mut $to:ty| $x:expr) => {{
                let src_a = self.registers[$a as usize];
                let src_b = self.registers[$b as usize];
                let src_c = self.registers[$c as usize];
                let dst = &mut self.registers[$o as usize];
                for (((&$a, &$b), &$c), lane) in src_a
                    .view::<$ta>()
                    .iter()
                    .zip(src_b.view::<$tb>())
                    .zip(src_c.view::<$tc>())
                    .zip(dst.view_mut::<$to>())
                {
                    *lane = $x;
                }
            }};
        }

        for op in ops.iter().copied() {
            match op {
                Param(param, o) => {
                    let value = match param {
                        FetchParam::StartVertex => ctx.start_vertex,
                        FetchParam::BaseVertex => ctx.base_vertex as u32,
                        FetchParam::StartInstance => ctx.start_instance,
                        FetchParam::CurInstance => ctx.cur_instance,
                        FetchParam::LastIndex => ctx.last_index.min(i32::MAX as usize) as u32,
                    };
                    self.registers[o as usize] = VMLanes::splat(value);
                }
                Stream(stream, param, o) => {
                    let stream = bound_stream(ctx, stream);
                    let value = match param {
                        StreamParam::Pitch => stream.pitch,
                        StreamParam::Size => stream.size,
                        StreamParam::MaxVertex => stream.max_vertex,
                        StreamParam::PartialSize => stream.partial_inbounds_size,
                    };
                    self.registers[o as usize] = VMLanes::splat(value);
                }
                LaneId(o) => {
                    self.registers[o as usize] = VMLanes(std::array::from_fn(|i| i as u32));
                }
                LitF(value, o) => {
                    self.registers[o as usize] = VMLanes::splat(value.to_bits());
                }
                LitI(value, o) => {
                    self.registers[o as usize] = VMLanes::splat(value as u32);
                }

                AddI(a, b, c) => op!(|a: i32, b: i32, c: mut i32| a.wrapping_add(b)),
                SubI(a, b, c) => op!(|a: i32, b: i32, c: mut i32| a.wrapping_sub(b)),
                MulI(a, b, c) => op!(|a: i32, b: i32, c: mut i32| a.wrapping_mul(b)),
                DivI(a, b, c) => op!(|a: i32, b: i32, c: mut i32| a.checked_div(b).unwrap_or(0)),
                DivU(a, b, c) => op!(|a: u32, b: u32, c: mut u32| a.checked_div(b).unwrap_or(0)),
                AndI(a, b, c) => op!(|a: u32, b: u32, c: mut u32| a & b),
                MulF(a, b, c) => op!(|a: f32, b: f32, c: mut f32| a * b),

                CastF(a, b) => op!(|a: i32, b: mut f32| a as f32),
                CastUF(a, b) => op!(|a: u32, b: mut f32| a as f32),

                EqI(a, b, c) => op!(|a: i32, b: i32, c: mut i32| if a == b { -1 } else { 0 }),
                LtI(a, b, c) => op!(|a: i32, b: i32, c: mut i32| if a < b { -1 } else { 0 }),
                GtI(a, b, c) => op!(|a: i32, b: i32, c: mut i32| if a > b { -1 } else { 0 }),
                LtU(a, b, c) => op!(|a: u32, b: u32, c: mut i32| if a < b { -1 } else { 0 }),
                LeU(a, b, c) => op!(|a: u32, b: u32, c: mut i32| if a <= b { -1 } else { 0 }),

                Select(a, b, c, d) => op!(|a: u32, b: u32, c: u32, d: mut u32| c ^ ((c ^ b) & a)),

                Extract(lane, a, o) => {
                    let value = self.registers[a as usize].0[lane as usize];
                    self.registers[o as usize] = VMLanes::splat(value);
                }
                Insert(lane, a, s, o) => {
                    let mut value = self.registers[a as usize];
                    value.0[lane as usize] = self.registers[s as usize].0[0];
                    self.registers[o as usize] = value;
                }
                Shuffle(a, b, mask, o) => {
                    let (a, b) = (self.registers[a as usize], self.registers[b as usize]);
                    self.registers[o as usize] = VMLanes(mask.map(|m| match m as usize {
                        m if m < SIMD_WIDTH => a.0[m],
                        m => b.0[m - SIMD_WIDTH],
                    }));
                }
                Permute(a, mask, o) => {
                    let a = self.registers[a as usize];
                    self.registers[o as usize] = VMLanes(mask.map(|m| a.0[m as usize]));
                }
                ShuffleBytes(a, mask, o) => {
                    let src = self.registers[a as usize].to_bytes();
                    let mut dst = [0u8; SIMD_WIDTH * 4];
                    for (block_src, block_dst) in src.chunks_exact(16).zip(dst.chunks_exact_mut(16)) {
                        for (byte, &m) in block_dst.iter_mut().zip(&mask) {
                            *byte = if m < 0 { 0 } else { block_src[(m & 15) as usize] };
                        }
                    }
                    self.registers[o as usize] = VMLanes::from_bytes(dst);
                }
                Expand(kind, a, o) => {
                    let src = self.registers[a as usize].to_bytes();
                    let half = |i: usize| u16::from_le_bytes([src[2 * i], src[2 * i + 1]]);
                    self.registers[o as usize] = VMLanes(std::array::from_fn(|i| match kind {
                        ExpandKind::Sign8 => src[i] as i8 as i32 as u32,
                        ExpandKind::Sign16 => half(i) as i16 as i32 as u32,
                        ExpandKind::Half => f16::from_bits(half(i)).to_f32().to_bits(),
                    }));
                }

                LoadIndices(ty, o) => {
                    let bytes = ty.bytes();
                    self.registers[o as usize] = VMLanes(std::array::from_fn(|i| read(ctx.indices, i * bytes, bytes)));
                }
                LoadIndicesMasked(ty, mask, o) => {
                    let bytes = ty.bytes();
                    let mask = self.registers[mask as usize];
                    self.registers[o as usize] = VMLanes(std::array::from_fn(|i| match mask.0[i] {
                        0 => 0,
                        _ => read(ctx.indices, i * bytes, bytes),
                    }));
                }
                LoadIndex(ty, addr, valid, o) => {
                    let value = match self.registers[valid as usize].0[0] {
                        0 => read_local_zero(ty),
                        _ => read(ctx.indices, self.registers[addr as usize].0[0] as usize, ty.bytes()),
                    };
                    self.registers[o as usize] = VMLanes::splat(value);
                }
                LoadVertex(stream, load, offset, valid, o) => {
                    let mut value = VMLanes::default();
                    if self.registers[valid as usize].0[0] != 0 {
                        let data = bound_stream(ctx, stream).data;
                        let offset = self.registers[offset as usize].0[0] as usize;
                        load_vertex(data, offset, load, &mut value);
                    }
                    self.registers[o as usize] = value;
                }
                Gather(stream, bytes, offsets, mask, o) => {
                    let data = bound_stream(ctx, stream).data;
                    let (offsets, mask) = (self.registers[offsets as usize], self.registers[mask as usize]);
                    self.registers[o as usize] = VMLanes(std::array::from_fn(|i| match mask.0[i] {
                        0 => 0,
                        _ => read(data, offsets.0[i] as usize, bytes as usize),
                    }));
                }

                Store(target, a) => {
                    let value = self.registers[a as usize];
                    match target {
                        FetchTarget::Row(element, component) => {
                            out.attrib[element as usize][component as usize] = *value.view::<f32>();
                        }
                        FetchTarget::VertexId => ctx.vertex_id = value.0,
                        FetchTarget::CutMask => ctx.cut_mask = value.0,
                    }
                }
            }
        }
    }

    pub fn register(&self, id: VMReg) -> &VMLanes {
        &self.registers[id as usize]
    }
}

fn bound_stream<'a>(ctx: &FetchContext<'a>, stream: u8) -> VertexBuffer<'a> {
    match ctx.streams.get(stream as usize) {
        Some(buffer) => *buffer,
        None => panic!("vertex stream {stream} is not bound ({} streams provided)", ctx.streams.len()),
    }
}

/// little endian read of up to 4 bytes, zero extended
fn read(data: &[u8], offset: usize, len: usize) -> u32 {
    let Some(bytes) = offset.checked_add(len).and_then(|end| data.get(offset..end)) else {
        panic!(
            "fetch read of {len} bytes at offset {offset} is outside of a {} byte buffer",
            data.len()
        );
    };

    let mut value = [0u8; 4];
    value[..len].copy_from_slice(bytes);
    u32::from_le_bytes(value)
}

// masked off index lanes read from a zero held by the function itself
fn read_local_zero(ty: IndexType) -> u32 {
    let zero = [0u8; 4];
    read(&zero, 0, ty.bytes())
}

fn load_vertex(data: &[u8], offset: usize, load: VertexLoad, value: &mut VMLanes) {
    let bytes = load.bits as usize / 8;
    for component in 0..load.components as usize {
        let raw = read(data, offset + component * bytes, bytes);
        value.0[component] = match (load.bits, load.signed) {
            (8, true) => raw as u8 as i8 as i32 as u32,
            (16, true) => raw as u16 as i16 as i32 as u32,
            _ => raw,
        };
    }
}
