use crate::{VMOp, VMOpcode, VMReg};
use bumpalo::{Bump, collections::Vec};
use std::{collections::HashMap, fmt::Debug, hash::Hash};

mod builder;
mod dce;
mod hashcons;
mod lowering;
mod peephole;
mod promote;
mod selects;

pub use builder::IRBuilder;
pub use dce::eliminate_dead;
pub use hashcons::optimize_hashcons;
pub use lowering::lower_to_opcodes;
pub use peephole::optimize_peephole;
pub use promote::promote_lanes;
pub use selects::simplify_selects;

#[derive(Debug)]
pub struct VMProgram<'a> {
    pub opcodes: Vec<'a, VMOpcode>,
    pub registers: VMReg,
}

/// A value graph rooted at its stores.
#[derive(Debug, Clone, Copy)]
pub struct IRProgram<'a> {
    pub outputs: &'a [IR<'a>],
}

impl<'a> IRProgram<'a> {
    pub fn visit_ops<T>(
        &self,
        arena: &'a Bump,
        mut state: T,
        mut enter: impl FnMut(&mut T, IR<'a>, Option<IR<'a>>) -> bool,
        mut exit: impl FnMut(&mut T, IR<'a>, Option<IR<'a>>),
    ) {
        enum Visit<'a> {
            Enter(IR<'a>, Option<IR<'a>>),
            Exit(IR<'a>, Option<IR<'a>>),
        }

        let mut stack = Vec::new_in(arena);

        for ir in self.outputs.iter().rev() {
            stack.push(Visit::Enter(*ir, None));
        }

        loop {
            match stack.pop() {
                Some(Visit::Enter(ir, from)) => {
                    if enter(&mut state, ir, from) {
                        stack.push(Visit::Exit(ir, from));

                        // first operand is visited first
                        let len = stack.len();
                        ir.visit_children(|x| stack.push(Visit::Enter(x, Some(ir))));
                        stack[len..].reverse();
                    }
                }

                Some(Visit::Exit(ir, from)) => {
                    exit(&mut state, ir, from);
                }

                None => break,
            }
        }
    }

    /// rebuild the graph bottom up, `f` receives every node with its children already rewritten
    pub fn rewrite(&self, arena: &'a Bump, mut f: impl FnMut(IR<'a>) -> IR<'a>) -> IRProgram<'a> {
        let mut mapping = HashMap::new();
        self.visit_ops(
            arena,
            &mut mapping,
            |mapping, ir, _| !mapping.contains_key(&ir),
            |mapping, ir, _| {
                let rewritten = f(ir.map_children(arena, |ir| mapping[&ir]));
                mapping.insert(ir, rewritten);
            },
        );

        IRProgram {
            outputs: arena.alloc_slice_fill_iter(self.outputs.iter().map(|ir| mapping[ir])),
        }
    }

    /// number of distinct nodes reachable from the outputs
    pub fn node_count(&self, arena: &'a Bump) -> usize {
        let mut seen = std::collections::HashSet::new();
        self.visit_ops(arena, (), |_, ir, _| seen.insert(ir), |_, _, _| {});
        seen.len()
    }
}

#[derive(Clone, Copy)]
pub struct IR<'a>(pub &'a VMOp<IR<'a>, ()>);

impl<'a> IR<'a> {
    pub fn new(arena: &'a Bump, op: VMOp<IR<'a>, ()>) -> Self {
        IR(arena.alloc(op))
    }

    pub fn visit_children(&self, mut f: impl FnMut(IR<'a>)) {
        self.0.map_inputs(|x| f(x));
    }

    /// returns `self` untouched when `f` maps every child onto itself
    pub fn map_children(&self, arena: &'a Bump, mut f: impl FnMut(IR<'a>) -> IR<'a>) -> IR<'a> {
        let mut changed = false;
        let op = self.0.map_inputs(|x| {
            let y = f(x);
            changed |= y != x;
            y
        });

        if changed { IR(arena.alloc(op)) } else { *self }
    }

    /// integer literal value, if this node is one
    pub fn lit_i(&self) -> Option<i32> {
        match *self.0 {
            VMOp::LitI(x, _) => Some(x),
            VMOp::LitF(x, _) => Some(x.to_bits() as i32),
            _ => None,
        }
    }
}

impl<'a> Eq for IR<'a> {}
impl<'a> PartialEq for IR<'a> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.0, other.0)
    }
}

impl<'a> Hash for IR<'a> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::ptr::hash(self.0, state);
    }
}

impl<'a> Debug for IR<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IR({:p} := {:?})", self.0, self.0.map_inputs(|x| x.0 as *const _))
    }
}
