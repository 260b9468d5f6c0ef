mod convert;
mod gather;
mod index;
mod ir;
mod linear;
mod tables;

use super::{FetchTarget, VMInterpreter, VMOpcode, VMReg};
use bumpalo::Bump;
use gather::{RowPacker, fetch_gather};
use index::load_lane_indices;
use ir::{IRBuilder, IRProgram};
use linear::fetch_linear;
use log::{Level, debug, log_enabled, trace};
use std::fmt;
use vfetch_core::{FetchContext, FetchDescriptor, FetchStrategy, IndexType, SimdVertex};

/// Emission progress, each step may only follow the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EmitState {
    Uninitialized,
    EntryBuilt,
    IndicesResolved,
    AttributesLowered,
    Optimized,
    Finalized,
}

impl EmitState {
    fn advance(&mut self, next: EmitState) {
        assert!(
            *self as u8 + 1 == next as u8,
            "fetch emission went from {self:?} to {next:?}"
        );
        *self = next;
    }
}

#[derive(Debug, Clone, Copy)]
enum Pass {
    SimplifySelects,
    HashCons,
    PromoteLanes,
    Peephole,
    EliminateDead,
}

const SETUP_PASSES: &[Pass] = &[Pass::SimplifySelects, Pass::HashCons, Pass::PromoteLanes];
const OPTIMIZE_PASSES: &[Pass] = &[Pass::SimplifySelects, Pass::HashCons, Pass::Peephole, Pass::EliminateDead];
const OPTIMIZE_ROUNDS: usize = 2;

impl Pass {
    fn run<'a>(self, program: &IRProgram<'a>, arena: &'a Bump) -> IRProgram<'a> {
        let program = match self {
            Pass::SimplifySelects => ir::simplify_selects(program, arena),
            Pass::HashCons => ir::optimize_hashcons(program, arena),
            Pass::PromoteLanes => ir::promote_lanes(program, arena),
            Pass::Peephole => ir::optimize_peephole(program, arena),
            Pass::EliminateDead => ir::eliminate_dead(program, arena),
        };

        if log_enabled!(Level::Trace) {
            trace!("{self:?}: {} nodes", program.node_count(arena));
        }

        program
    }
}

/// A fetch function generated for one [`FetchDescriptor`].
///
/// Holds no mutable state, so one function can serve any number of threads.
#[derive(Debug, Clone)]
pub struct FetchFunction {
    opcodes: Vec<VMOpcode>,
    registers: VMReg,
    index_type: IndexType,
    strategy: FetchStrategy,
}

impl FetchFunction {
    /// Generate the fetch function for `descriptor`, allocating the value graph in `arena`.
    ///
    /// Panics on format and conversion combinations the selected strategy cannot lower.
    pub fn compile(arena: &Bump, descriptor: &FetchDescriptor) -> Self {
        let mut state = EmitState::Uninitialized;
        let strategy = descriptor.strategy();
        let elements = descriptor.elements();

        debug!(
            "compiling fetch: {strategy:?}, {} elements, {:?} indices, oob checks {}",
            elements.len(),
            descriptor.index_type(),
            descriptor.oob_checks()
        );

        let mut builder = IRBuilder::new(arena);
        state.advance(EmitState::EntryBuilt);

        let indices = load_lane_indices(&builder, descriptor.index_type(), descriptor.oob_checks());
        state.advance(EmitState::IndicesResolved);

        builder.store(FetchTarget::VertexId, indices);
        if let Some(cut) = descriptor.cut_index() {
            let cut_mask = builder.eq_i(indices, builder.lit_i(cut as i32));
            builder.store(FetchTarget::CutMask, cut_mask);
        }

        match strategy {
            FetchStrategy::Linear => {
                for (slot, element) in elements.iter().enumerate() {
                    trace!("element {slot}: {:?} at stream {} + {}", element.format, element.stream, element.offset);
                    fetch_linear(&mut builder, slot, element, indices, descriptor.oob_checks());
                }
            }
            FetchStrategy::Gather => {
                let mut packer = RowPacker::new();
                for (slot, element) in elements.iter().enumerate() {
                    trace!("element {slot}: {:?} at stream {} + {}", element.format, element.stream, element.offset);
                    fetch_gather(&mut builder, &mut packer, element, indices);
                }
                packer.finish(&mut builder);
            }
        }
        state.advance(EmitState::AttributesLowered);

        let mut program = builder.finish();
        let initial_nodes = program.node_count(arena);

        for pass in SETUP_PASSES {
            program = pass.run(&program, arena);
        }

        for _ in 0..OPTIMIZE_ROUNDS {
            for pass in OPTIMIZE_PASSES {
                program = pass.run(&program, arena);
            }
        }
        state.advance(EmitState::Optimized);

        debug!("optimized {initial_nodes} nodes into {}", program.node_count(arena));

        let program = ir::lower_to_opcodes(&program, arena);
        state.advance(EmitState::Finalized);

        debug!("fetch function: {} opcodes, {} registers", program.opcodes.len(), program.registers);

        Self {
            opcodes: program.opcodes.to_vec(),
            registers: program.registers,
            index_type: descriptor.index_type(),
            strategy,
        }
    }

    /// Fetch one batch with a fresh interpreter.
    pub fn fetch(&self, ctx: &mut FetchContext, out: &mut SimdVertex) {
        self.fetch_with(&mut VMInterpreter::new(), ctx, out);
    }

    /// Fetch one batch, reusing the registers of `vm`.
    pub fn fetch_with(&self, vm: &mut VMInterpreter, ctx: &mut FetchContext, out: &mut SimdVertex) {
        vm.execute(&self.opcodes, self.registers, ctx, out);
    }

    pub fn opcodes(&self) -> &[VMOpcode] {
        &self.opcodes
    }

    pub fn register_count(&self) -> VMReg {
        self.registers
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    pub fn strategy(&self) -> FetchStrategy {
        self.strategy
    }
}

impl fmt::Display for FetchFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "; {:?} fetch, {:?} indices, {} registers",
            self.strategy, self.index_type, self.registers
        )?;

        for (i, op) in self.opcodes.iter().enumerate() {
            writeln!(f, "{i:4}: {op}")?;
        }

        Ok(())
    }
}
