use super::{IR, IRProgram, VMOp};
use bumpalo::Bump;

/// fold selects with a known condition or identical arms
pub fn simplify_selects<'a>(program: &IRProgram<'a>, arena: &'a Bump) -> IRProgram<'a> {
    program.rewrite(arena, |ir| match *ir.0 {
        VMOp::Select(cond, t, f, _) => match cond.lit_i() {
            Some(0) => f,
            Some(-1) => t,
            _ if t == f => t,
            _ => match (t.lit_i(), f.lit_i()) {
                // select(c, -1, 0) is the mask itself
                (Some(-1), Some(0)) if is_mask(cond) => cond,
                (Some(x), Some(y)) if x == y => t,
                _ => ir,
            },
        },
        _ => ir,
    })
}

/// lanes are known to be all ones or all zeroes
fn is_mask(ir: IR) -> bool {
    use VMOp::*;
    match *ir.0 {
        EqI(..) | LtI(..) | GtI(..) | LtU(..) | LeU(..) => true,
        AndI(a, b, _) => is_mask(a) && is_mask(b),
        Select(_, t, f, _) => is_mask(t) && is_mask(f),
        LitI(x, _) => x == 0 || x == -1,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FetchParam, FetchTarget, vm::compiler::ir::IRBuilder};

    #[test]
    fn constant_conditions() {
        let arena = Bump::new();
        let mut builder = IRBuilder::new(&arena);

        let a = builder.param(FetchParam::StartVertex);
        let b = builder.param(FetchParam::CurInstance);
        let x = builder.select(builder.lit_true(), a, b);
        let y = builder.select(builder.lit_i(0), a, b);
        let mask = builder.lt_u(a, b);
        let z = builder.select(mask, builder.lit_true(), builder.lit_i(0));

        builder.store(FetchTarget::Row(0, 0), x);
        builder.store(FetchTarget::Row(0, 1), y);
        builder.store(FetchTarget::Row(0, 2), z);

        let program = simplify_selects(&builder.finish(), &arena);
        let stored = |i: usize| match *program.outputs[i].0 {
            VMOp::Store(_, value) => value,
            _ => unreachable!(),
        };

        assert_eq!(stored(0), a);
        assert_eq!(stored(1), b);
        assert_eq!(stored(2), mask);
    }
}
