use super::{IRProgram, VMProgram};
use crate::VMReg;
use bumpalo::{Bump, collections::Vec};
use std::collections::HashMap;

/// register allocation and lowering to executable vm ops
pub fn lower_to_opcodes<'a>(program: &IRProgram<'a>, arena: &'a Bump) -> VMProgram<'a> {
    // collect ops in dfs post order and collected output edge counts
    let mut ops = Vec::new_in(arena);
    let mut edges = HashMap::new();

    program.visit_ops(
        arena,
        (),
        |_, ir, _| {
            let edges = edges.entry(ir).or_insert(0);
            *edges += 1;
            *edges == 1
        },
        |_, ir, _| {
            ops.push(ir);
        },
    );

    // allocate registers for each op, stores have no output and take none
    let mut registers = HashMap::new();
    let mut state = Vec::new_in(arena);

    for op in ops.iter().copied() {
        if op.0.output().is_some() {
            let output_register = match state.iter().position(|x| !x) {
                Some(register) => {
                    state[register] = true;
                    register
                }
                None => {
                    state.push(true);
                    state.len() - 1
                }
            };

            registers.insert(op, output_register as VMReg);
        }

        op.visit_children(|input| {
            let register = registers[&input];
            let edges = edges.entry(input).or_default();
            *edges -= 1;
            if *edges == 0 {
                state[register as usize] = false;
            }
        });
    }

    assert!(state.len() <= VMReg::MAX as usize, "too many registers used");

    // map ops to vm opcodes
    let mut opcodes = Vec::new_in(arena);
    for op in ops.iter().copied() {
        opcodes.push(
            op.0.map_inputs(|input| registers[&input])
                .map_outputs(|_| registers[&op]),
        );
    }

    VMProgram {
        opcodes,
        registers: state.len() as VMReg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FetchParam, FetchTarget, VMOp, vm::compiler::ir::IRBuilder};

    #[test]
    fn registers_are_reused() {
        let arena = Bump::new();
        let mut builder = IRBuilder::new(&arena);

        let start = builder.param(FetchParam::StartVertex);
        let x = builder.add_i(start, builder.lit_i(1));
        let y = builder.add_i(x, builder.lit_i(2));
        let z = builder.add_i(y, builder.lit_i(3));
        builder.store(FetchTarget::VertexId, z);

        let program = lower_to_opcodes(&builder.finish(), &arena);

        assert_eq!(program.opcodes.len(), 8);
        assert!(program.registers <= 3, "{} registers", program.registers);
        assert!(matches!(program.opcodes.last(), Some(VMOp::Store(FetchTarget::VertexId, _))));

        // every input is defined before it is used, and outputs never alias inputs
        let mut defined = std::collections::HashSet::new();
        for op in program.opcodes.iter().copied() {
            let mut inputs = std::vec::Vec::new();
            op.map(|i| inputs.push(i), |_| ());
            for i in &inputs {
                assert!(defined.contains(i));
            }
            if let Some(o) = op.output() {
                assert!(!inputs.contains(&o));
                defined.insert(o);
            }
        }
    }
}
