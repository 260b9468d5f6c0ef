use super::{IR, IRProgram, VMOp};
use bumpalo::Bump;
use std::{collections::HashMap, hash::Hash, mem::discriminant};

/// common subexpression elimination
/// this is a simple hashconsing pass that will eliminate duplicate IR nodes
pub fn optimize_hashcons<'a>(program: &IRProgram<'a>, arena: &'a Bump) -> IRProgram<'a> {
    let mut forward = HashMap::new();
    program.rewrite(arena, |ir| *forward.entry(IRKey(*ir.0)).or_insert(ir))
}

/// an IR graph node that can be hashed and compared "structurally"
#[derive(Debug)]
struct IRKey<'a>(VMOp<IR<'a>, ()>);

impl<'a> Eq for IRKey<'a> {}
impl<'a> PartialEq for IRKey<'a> {
    fn eq(&self, other: &Self) -> bool {
        use VMOp::*;
        match (self.0, other.0) {
            (AddI(a, b, _), AddI(x, y, _))
            | (MulI(a, b, _), MulI(x, y, _))
            | (AndI(a, b, _), AndI(x, y, _))
            | (EqI(a, b, _), EqI(x, y, _))
            | (MulF(a, b, _), MulF(x, y, _)) => (a == x && b == y) || (a == y && b == x),

            // bitwise, so -0.0 and 0.0 stay apart and NaN literals dedup
            (LitF(a, _), LitF(b, _)) => a.to_bits() == b.to_bits(),

            _ => self.0 == other.0,
        }
    }
}

impl<'a> Hash for IRKey<'a> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        use VMOp::*;

        discriminant(&self.0).hash(state);
        match self.0 {
            AddI(a, b, _) | MulI(a, b, _) | AndI(a, b, _) | EqI(a, b, _) | MulF(a, b, _) => {
                (a.0 as *const _ as usize ^ b.0 as *const _ as usize).hash(state);
            }

            Param(p, _) => p.hash(state),
            Stream(s, p, _) => (s, p).hash(state),
            LitF(x, _) => x.to_bits().hash(state),
            LitI(x, _) => x.hash(state),

            Extract(l, a, _) => (l, a).hash(state),
            Insert(l, a, s, _) => (l, a, s).hash(state),
            Shuffle(a, b, m, _) => (a, b, m).hash(state),
            Permute(a, m, _) => (a, m).hash(state),
            ShuffleBytes(a, m, _) => (a, m).hash(state),
            Expand(k, a, _) => (k, a).hash(state),

            LoadIndices(t, _) => t.hash(state),
            LoadIndicesMasked(t, m, _) => (t, m).hash(state),
            LoadIndex(t, a, v, _) => (t, a, v).hash(state),
            LoadVertex(s, l, a, v, _) => (s, l, a, v).hash(state),
            Gather(s, n, a, m, _) => (s, n, a, m).hash(state),
            Store(t, a) => (t, a).hash(state),

            _ => {
                self.0.map_inputs(|i| std::ptr::hash(i.0, state));
            }
        }
    }
}
