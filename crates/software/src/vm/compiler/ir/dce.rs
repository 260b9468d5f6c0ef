use super::{IRProgram, VMOp};
use bumpalo::{Bump, collections::Vec};
use std::collections::HashSet;

/// drop stores that a later store to the same target overwrites.
/// nodes that no store reaches are never visited again, so this is all the dead code there is
pub fn eliminate_dead<'a>(program: &IRProgram<'a>, arena: &'a Bump) -> IRProgram<'a> {
    let mut seen = HashSet::new();
    let mut outputs = Vec::new_in(arena);

    for ir in program.outputs.iter().rev() {
        let live = match *ir.0 {
            VMOp::Store(target, _) => seen.insert(target),
            _ => true,
        };

        if live {
            outputs.push(*ir);
        }
    }

    outputs.reverse();
    IRProgram {
        outputs: outputs.into_bump_slice(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FetchTarget, vm::compiler::ir::IRBuilder};

    #[test]
    fn last_store_wins() {
        let arena = Bump::new();
        let mut builder = IRBuilder::new(&arena);

        builder.store(FetchTarget::VertexId, builder.lit_i(1));
        builder.store(FetchTarget::Row(0, 0), builder.lit_i(2));
        builder.store(FetchTarget::VertexId, builder.lit_i(3));

        let program = eliminate_dead(&builder.finish(), &arena);
        assert_eq!(program.outputs.len(), 2);
        assert!(matches!(*program.outputs[0].0, VMOp::Store(FetchTarget::Row(0, 0), _)));
        assert!(matches!(*program.outputs[1].0, VMOp::Store(FetchTarget::VertexId, v) if v.lit_i() == Some(3)));
    }
}
