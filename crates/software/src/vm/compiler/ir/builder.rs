use super::{IR, IRProgram};
use crate::{ByteMask, ExpandKind, FetchParam, FetchTarget, LaneMask, StreamParam, VMOp, VertexLoad};
use bumpalo::{Bump, collections::Vec};
use vfetch_core::IndexType;

/// Construction facade for fetch value graphs.
///
/// Value constructors take `&self`; only `store` extends the program.
pub struct IRBuilder<'a> {
    arena: &'a Bump,
    stores: Vec<'a, IR<'a>>,
}

macro_rules! binary {
    ($($name:ident => $op:ident),* $(,)?) => {
        $(
            pub fn $name(&self, a: IR<'a>, b: IR<'a>) -> IR<'a> {
                self.emit(VMOp::$op(a, b, ()))
            }
        )*
    };
}

impl<'a> IRBuilder<'a> {
    pub fn new(arena: &'a Bump) -> Self {
        Self {
            arena,
            stores: Vec::new_in(arena),
        }
    }

    pub fn emit(&self, op: VMOp<IR<'a>, ()>) -> IR<'a> {
        IR::new(self.arena, op)
    }

    pub fn lit_i(&self, value: i32) -> IR<'a> {
        self.emit(VMOp::LitI(value, ()))
    }

    pub fn lit_f(&self, value: f32) -> IR<'a> {
        self.emit(VMOp::LitF(value, ()))
    }

    /// all ones in every lane, the "true" of lane masks
    pub fn lit_true(&self) -> IR<'a> {
        self.lit_i(-1)
    }

    pub fn param(&self, param: FetchParam) -> IR<'a> {
        self.emit(VMOp::Param(param, ()))
    }

    pub fn stream(&self, stream: u8, param: StreamParam) -> IR<'a> {
        self.emit(VMOp::Stream(stream, param, ()))
    }

    pub fn lane_id(&self) -> IR<'a> {
        self.emit(VMOp::LaneId(()))
    }

    binary! {
        add_i => AddI,
        sub_i => SubI,
        mul_i => MulI,
        div_i => DivI,
        div_u => DivU,
        and_i => AndI,
        mul_f => MulF,
        eq_i => EqI,
        lt_i => LtI,
        gt_i => GtI,
        lt_u => LtU,
        le_u => LeU,
    }

    pub fn cast_f(&self, a: IR<'a>) -> IR<'a> {
        self.emit(VMOp::CastF(a, ()))
    }

    pub fn cast_uf(&self, a: IR<'a>) -> IR<'a> {
        self.emit(VMOp::CastUF(a, ()))
    }

    pub fn select(&self, cond: IR<'a>, t: IR<'a>, f: IR<'a>) -> IR<'a> {
        self.emit(VMOp::Select(cond, t, f, ()))
    }

    pub fn extract(&self, lane: u8, a: IR<'a>) -> IR<'a> {
        self.emit(VMOp::Extract(lane, a, ()))
    }

    pub fn insert(&self, lane: u8, a: IR<'a>, scalar: IR<'a>) -> IR<'a> {
        self.emit(VMOp::Insert(lane, a, scalar, ()))
    }

    pub fn shuffle(&self, a: IR<'a>, b: IR<'a>, mask: LaneMask) -> IR<'a> {
        self.emit(VMOp::Shuffle(a, b, mask, ()))
    }

    pub fn permute(&self, a: IR<'a>, mask: LaneMask) -> IR<'a> {
        self.emit(VMOp::Permute(a, mask, ()))
    }

    pub fn shuffle_bytes(&self, a: IR<'a>, mask: ByteMask) -> IR<'a> {
        self.emit(VMOp::ShuffleBytes(a, mask, ()))
    }

    pub fn expand(&self, kind: ExpandKind, a: IR<'a>) -> IR<'a> {
        self.emit(VMOp::Expand(kind, a, ()))
    }

    pub fn load_indices(&self, ty: IndexType) -> IR<'a> {
        self.emit(VMOp::LoadIndices(ty, ()))
    }

    pub fn load_indices_masked(&self, ty: IndexType, mask: IR<'a>) -> IR<'a> {
        self.emit(VMOp::LoadIndicesMasked(ty, mask, ()))
    }

    pub fn load_index(&self, ty: IndexType, addr: IR<'a>, valid: IR<'a>) -> IR<'a> {
        self.emit(VMOp::LoadIndex(ty, addr, valid, ()))
    }

    pub fn load_vertex(&self, stream: u8, load: VertexLoad, offset: IR<'a>, valid: IR<'a>) -> IR<'a> {
        self.emit(VMOp::LoadVertex(stream, load, offset, valid, ()))
    }

    pub fn gather(&self, stream: u8, bytes: u8, offsets: IR<'a>, mask: IR<'a>) -> IR<'a> {
        self.emit(VMOp::Gather(stream, bytes, offsets, mask, ()))
    }

    pub fn store(&mut self, target: FetchTarget, value: IR<'a>) {
        let store = IR::new(self.arena, VMOp::Store(target, value));
        self.stores.push(store);
    }

    pub fn finish(self) -> IRProgram<'a> {
        IRProgram {
            outputs: self.stores.into_bump_slice(),
        }
    }
}
