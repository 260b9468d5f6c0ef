mod compiler;
mod interpreter;

pub use compiler::*;
pub use interpreter::*;

use std::fmt;
use vfetch_core::{IndexType, SIMD_WIDTH};

/// Scalar argument of the fetch call, broadcast to every lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchParam {
    StartVertex,
    BaseVertex,
    StartInstance,
    CurInstance,
    /// Byte offset one past the last valid index.
    LastIndex,
}

/// Per-stream value of the bound vertex buffer, broadcast to every lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamParam {
    Pitch,
    Size,
    MaxVertex,
    PartialSize,
}

/// Where a `Store` writes its vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchTarget {
    /// `SimdVertex::attrib[element][component]`
    Row(u8, u8),
    VertexId,
    CutMask,
}

/// How `Expand` widens the low lanes of a vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpandKind {
    /// sign extend the low `SIMD_WIDTH` bytes
    Sign8,
    /// sign extend the low `SIMD_WIDTH` halfwords
    Sign16,
    /// convert the low `SIMD_WIDTH` halfwords from half to single precision
    Half,
}

/// Shape of a single vertex load: `components` values of `bits` each, widened to 32 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexLoad {
    pub bits: u8,
    pub components: u8,
    pub signed: bool,
}

impl VertexLoad {
    pub fn bytes(&self) -> usize {
        self.bits as usize / 8 * self.components as usize
    }
}

/// Lane selector, `out[i] = src[mask[i]]`.
pub type LaneMask = [u8; SIMD_WIDTH];

/// Byte selector applied to every 16 byte block, negative entries produce zero.
pub type ByteMask = [i8; 16];

#[repr(align(8))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VMOp<I, O> {
    Param(FetchParam, O),
    Stream(u8, StreamParam, O),
    LaneId(O),

    LitF(f32, O),
    LitI(i32, O),

    AddI(I, I, O),
    SubI(I, I, O),
    MulI(I, I, O),
    DivI(I, I, O),
    DivU(I, I, O),
    AndI(I, I, O),
    MulF(I, I, O),

    CastF(I, O),
    CastUF(I, O),

    EqI(I, I, O),
    LtI(I, I, O),
    GtI(I, I, O),
    LtU(I, I, O),
    LeU(I, I, O),

    Select(I, I, I, O),

    Extract(u8, I, O),
    Insert(u8, I, I, O),
    Shuffle(I, I, LaneMask, O),
    Permute(I, LaneMask, O),
    ShuffleBytes(I, ByteMask, O),
    Expand(ExpandKind, I, O),

    LoadIndices(IndexType, O),
    LoadIndicesMasked(IndexType, I, O),
    LoadIndex(IndexType, I, I, O),
    LoadVertex(u8, VertexLoad, I, I, O),
    Gather(u8, u8, I, I, O),

    Store(FetchTarget, I),
}

impl<I, O> VMOp<I, O> {
    pub fn map<I0, O0>(self, mut inp: impl FnMut(I) -> I0, mut out: impl FnMut(O) -> O0) -> VMOp<I0, O0> {
        use VMOp::*;
        match self {
            Param(p, o) => Param(p, out(o)),
            Stream(s, p, o) => Stream(s, p, out(o)),
            LaneId(o) => LaneId(out(o)),
            LitF(x, o) => LitF(x, out(o)),
            LitI(x, o) => LitI(x, out(o)),
            AddI(a, b, o) => AddI(inp(a), inp(b), out(o)),
            SubI(a, b, o) => SubI(inp(a), inp(b), out(o)),
            MulI(a, b, o) => MulI(inp(a), inp(b), out(o)),
            DivI(a, b, o) => DivI(inp(a), inp(b), out(o)),
            DivU(a, b, o) => DivU(inp(a), inp(b), out(o)),
            AndI(a, b, o) => AndI(inp(a), inp(b), out(o)),
            MulF(a, b, o) => MulF(inp(a), inp(b), out(o)),
            CastF(a, o) => CastF(inp(a), out(o)),
            CastUF(a, o) => CastUF(inp(a), out(o)),
            EqI(a, b, o) => EqI(inp(a), inp(b), out(o)),
            LtI(a, b, o) => LtI(inp(a), inp(b), out(o)),
            GtI(a, b, o) => GtI(inp(a), inp(b), out(o)),
            LtU(a, b, o) => LtU(inp(a), inp(b), out(o)),
            LeU(a, b, o) => LeU(inp(a), inp(b), out(o)),
            Select(c, t, f, o) => Select(inp(c), inp(t), inp(f), out(o)),
            Extract(l, a, o) => Extract(l, inp(a), out(o)),
            Insert(l, a, s, o) => Insert(l, inp(a), inp(s), out(o)),
            Shuffle(a, b, m, o) => Shuffle(inp(a), inp(b), m, out(o)),
            Permute(a, m, o) => Permute(inp(a), m, out(o)),
            ShuffleBytes(a, m, o) => ShuffleBytes(inp(a), m, out(o)),
            Expand(k, a, o) => Expand(k, inp(a), out(o)),
            LoadIndices(t, o) => LoadIndices(t, out(o)),
            LoadIndicesMasked(t, m, o) => LoadIndicesMasked(t, inp(m), out(o)),
            LoadIndex(t, a, v, o) => LoadIndex(t, inp(a), inp(v), out(o)),
            LoadVertex(s, l, a, v, o) => LoadVertex(s, l, inp(a), inp(v), out(o)),
            Gather(s, n, a, m, o) => Gather(s, n, inp(a), inp(m), out(o)),
            Store(t, a) => Store(t, inp(a)),
        }
    }

    pub fn map_inputs<I0>(self, inp: impl FnMut(I) -> I0) -> VMOp<I0, O> {
        self.map(inp, |o| o)
    }

    pub fn map_outputs<O0>(self, out: impl FnMut(O) -> O0) -> VMOp<I, O0> {
        self.map(|i| i, out)
    }

    /// output of the op, `None` for stores
    pub fn output(self) -> Option<O> {
        let mut output = None;
        self.map(|_| (), |o| output = Some(o));
        output
    }
}

pub type VMReg = u16;
pub type VMOpcode = VMOp<VMReg, VMReg>;

impl fmt::Display for VMOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use VMOp::*;

        let name = match self {
            Param(..) => "param",
            Stream(..) => "stream",
            LaneId(..) => "lane_id",
            LitF(..) => "lit.f",
            LitI(..) => "lit.i",
            AddI(..) => "add.i",
            SubI(..) => "sub.i",
            MulI(..) => "mul.i",
            DivI(..) => "div.i",
            DivU(..) => "div.u",
            AndI(..) => "and.i",
            MulF(..) => "mul.f",
            CastF(..) => "cast.f",
            CastUF(..) => "cast.uf",
            EqI(..) => "eq.i",
            LtI(..) => "lt.i",
            GtI(..) => "gt.i",
            LtU(..) => "lt.u",
            LeU(..) => "le.u",
            Select(..) => "select",
            Extract(..) => "extract",
            Insert(..) => "insert",
            Shuffle(..) => "shuffle",
            Permute(..) => "permute",
            ShuffleBytes(..) => "shuffle.b",
            Expand(..) => "expand",
            LoadIndices(..) => "load.idx",
            LoadIndicesMasked(..) => "load.idx.masked",
            LoadIndex(..) => "load.idx.lane",
            LoadVertex(..) => "load.vtx",
            Gather(..) => "gather",
            Store(..) => "store",
        };

        if let Some(output) = self.output() {
            write!(f, "r{output:<3} = {name:<16}")?;
        } else {
            write!(f, "{:6} {name:<16}", "")?;
        }

        match *self {
            Param(p, _) => write!(f, " {p:?}")?,
            Stream(s, p, _) => write!(f, " #{s} {p:?}")?,
            LitF(x, _) => write!(f, " {x:?}")?,
            LitI(x, _) => write!(f, " {x}")?,
            Extract(l, _, _) | Insert(l, _, _, _) => write!(f, " [{l}]")?,
            Shuffle(_, _, m, _) | Permute(_, m, _) => write!(f, " {m:?}")?,
            ShuffleBytes(_, m, _) => write!(f, " {m:?}")?,
            Expand(k, _, _) => write!(f, " {k:?}")?,
            LoadIndices(t, _) | LoadIndicesMasked(t, _, _) | LoadIndex(t, _, _, _) => write!(f, " {t:?}")?,
            LoadVertex(s, l, _, _, _) => write!(f, " #{s} {}x{}{}", l.components, if l.signed { "s" } else { "u" }, l.bits)?,
            Gather(s, n, _, _, _) => write!(f, " #{s} {n}b")?,
            Store(t, _) => write!(f, " {t:?}")?,
            _ => {}
        }

        let mut first = true;
        self.map(
            |i| {
                let _ = write!(f, "{} r{i}", if first { "" } else { "," });
                first = false;
            },
            |_| (),
        );

        Ok(())
    }
}
