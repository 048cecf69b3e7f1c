//! The monotone fixpoint iterator (§4.5): a FIFO worklist algorithm over the CFG, joining
//! predecessor out-states and re-running a block's transfer chain whenever its in-state changes.
//!
//! Mirrors the source's `MonotonicFixpointIterator`: the entry block starts at `Top` (nothing
//! known yet about the caller's state), every other block starts at `Bottom` (unreached), and the
//! worklist drains until no block's out-state changes under another pass.

use crate::cfg::Program;
use crate::env::AbstractEnvironment;
use crate::error::TypeCheckError;
use crate::transfer;
use std::collections::VecDeque;

/// Runs the fixpoint over `program` and reports the first transfer-function precondition
/// violation encountered, if any. Keeps every block's out-state around after `run` returns, so a
/// caller that gets `Err` back can still inspect `exit_state` for diagnostics. The engine never
/// discards the partial analysis it had built up to the point of the failing transfer.
pub struct FixpointEngine<'a> {
    program: &'a Program,
    out_states: Vec<AbstractEnvironment>,
}

impl<'a> FixpointEngine<'a> {
    pub fn new(program: &'a Program) -> FixpointEngine<'a> {
        let n = program.blocks().len();
        FixpointEngine {
            program,
            out_states: vec![AbstractEnvironment::bottom(); n],
        }
    }

    /// Runs the worklist to completion.
    pub fn run(&mut self) -> Result<(), TypeCheckError> {
        let n = self.program.blocks().len();
        let mut in_states = vec![AbstractEnvironment::bottom(); n];
        in_states[self.program.entry()] = AbstractEnvironment::top();

        let mut worklist: VecDeque<usize> = VecDeque::new();
        worklist.push_back(self.program.entry());
        let mut queued = vec![false; n];
        queued[self.program.entry()] = true;

        while let Some(block) = worklist.pop_front() {
            queued[block] = false;
            tracing::trace!(block, "processing block");

            let mut env = in_states[block].clone();
            for element in &self.program.blocks()[block].elements {
                transfer::apply(&mut env, element)?;
            }

            if env != self.out_states[block] {
                self.out_states[block] = env.clone();
                for succ in self.program.successors(block) {
                    let joined = in_states[succ].join(&env);
                    if joined != in_states[succ] {
                        in_states[succ] = joined;
                        if !queued[succ] {
                            queued[succ] = true;
                            worklist.push_back(succ);
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// The out-state of the program's designated exit block. Meaningful after `run` regardless of
    /// whether it returned `Ok` or `Err`.
    pub fn exit_state(&self) -> AbstractEnvironment {
        self.out_states[self.program.exit()].clone()
    }
}
