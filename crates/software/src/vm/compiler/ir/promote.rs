use super::{IR, IRProgram, VMOp};
use bumpalo::Bump;
use std::collections::HashMap;

/// lane promotion: collapse `Extract` of lane vectors that were assembled lane by lane,
/// and of values that hold the same scalar in every lane
pub fn promote_lanes<'a>(program: &IRProgram<'a>, arena: &'a Bump) -> IRProgram<'a> {
    let mut uniform = HashMap::new();
    program.rewrite(arena, |ir| promote_single(arena, ir, &mut uniform))
}

fn promote_single<'a>(arena: &'a Bump, ir: IR<'a>, uniform: &mut HashMap<IR<'a>, bool>) -> IR<'a> {
    use VMOp::*;

    let VMOp::Extract(lane, extracted, _) = *ir.0 else {
        return ir;
    };

    let mut src = extracted;
    loop {
        match *src.0 {
            _ if is_uniform(src, uniform) => return src,
            LaneId(_) => return IR::new(arena, LitI(lane as i32, ())),
            Insert(l, _, scalar, _) if l == lane && is_uniform(scalar, uniform) => return scalar,
            Insert(l, vector, _, _) if l != lane => src = vector,
            _ => break,
        }
    }

    if src == extracted { ir } else { IR::new(arena, Extract(lane, src, ())) }
}

/// every lane of the value is known to be equal
fn is_uniform<'a>(ir: IR<'a>, memo: &mut HashMap<IR<'a>, bool>) -> bool {
    use VMOp::*;

    if let Some(&known) = memo.get(&ir) {
        return known;
    }

    let result = match *ir.0 {
        Param(..) | Stream(..) | LitF(..) | LitI(..) | Extract(..) | LoadIndex(..) => true,

        AddI(..) | SubI(..) | MulI(..) | DivI(..) | DivU(..) | AndI(..) | MulF(..) | CastF(..) | CastUF(..)
        | EqI(..) | LtI(..) | GtI(..) | LtU(..) | LeU(..) | Select(..) => {
            let mut all = true;
            ir.visit_children(|child| all &= is_uniform(child, memo));
            all
        }

        LaneId(..) | Insert(..) | Shuffle(..) | Permute(..) | ShuffleBytes(..) | Expand(..) | LoadIndices(..)
        | LoadIndicesMasked(..) | LoadVertex(..) | Gather(..) | Store(..) => false,
    };

    memo.insert(ir, result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FetchParam, FetchTarget, vm::compiler::ir::IRBuilder};
    use vfetch_core::IndexType;

    #[test]
    fn extract_of_inserted_lane() {
        let arena = Bump::new();
        let mut builder = IRBuilder::new(&arena);

        let valid = builder.lit_true();
        let first = builder.load_index(IndexType::U16, builder.lit_i(0), valid);
        let second = builder.load_index(IndexType::U16, builder.lit_i(2), valid);
        let vector = builder.insert(0, builder.lit_i(0), first);
        let vector = builder.insert(1, vector, second);

        builder.store(FetchTarget::Row(0, 0), builder.extract(0, vector));
        builder.store(FetchTarget::Row(0, 1), builder.extract(1, vector));
        builder.store(FetchTarget::Row(0, 2), builder.extract(5, vector));
        builder.store(FetchTarget::Row(0, 3), builder.extract(3, builder.lane_id()));

        let program = promote_lanes(&builder.finish(), &arena);
        let stored = |i: usize| match *program.outputs[i].0 {
            VMOp::Store(_, value) => value,
            _ => unreachable!(),
        };

        assert_eq!(stored(0), first);
        assert_eq!(stored(1), second);
        assert!(matches!(*stored(2).0, VMOp::LitI(0, _)));
        assert!(matches!(*stored(3).0, VMOp::LitI(3, _)));
    }

    #[test]
    fn lane_varying_values_stay() {
        let arena = Bump::new();
        let mut builder = IRBuilder::new(&arena);

        let indices = builder.load_indices(IndexType::U32);
        let offset = builder.add_i(indices, builder.param(FetchParam::BaseVertex));
        builder.store(FetchTarget::Row(0, 0), builder.extract(2, offset));

        let program = promote_lanes(&builder.finish(), &arena);
        assert!(matches!(*program.outputs[0].0, VMOp::Store(_, value) if matches!(value.0, VMOp::Extract(2, _, _))));
    }
}
