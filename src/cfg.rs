//! Control-flow graph construction (§4.3).
//!
//! Two builders share one arena representation: `build_linear`, which chains each `QElement` into
//! its own block linearly (the default, matching source programs with no control flow), and
//! `build_labelled`, which splits at `label`/jump boundaries and resolves jump targets into real
//! edges.

use crate::error::NormalizeError;
use crate::ir::{NopeMeta, QElement};
use std::collections::HashMap;

/// One straight-line run of `QElement`s with no internal control flow.
#[derive(Clone, Debug, Default)]
pub struct BasicBlock {
    pub elements: Vec<QElement>,
}

/// A directed edge between two blocks, named by index into [`Program::blocks`].
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
}

/// The arena-based CFG the fixpoint engine walks.
#[derive(Clone, Debug)]
pub struct Program {
    blocks: Vec<BasicBlock>,
    edges: Vec<Edge>,
    entry: usize,
    exit: usize,
}

impl Program {
    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    pub fn entry(&self) -> usize {
        self.entry
    }

    pub fn exit(&self) -> usize {
        self.exit
    }

    /// Outgoing edges of `block`, in insertion order.
    pub fn successors(&self, block: usize) -> impl Iterator<Item = usize> + '_ {
        self.edges
            .iter()
            .filter(move |e| e.from == block)
            .map(|e| e.to)
    }

    /// Incoming edges of `block`, in insertion order.
    pub fn predecessors(&self, block: usize) -> impl Iterator<Item = usize> + '_ {
        self.edges
            .iter()
            .filter(move |e| e.to == block)
            .map(|e| e.from)
    }

    /// Builds a program out of `elements`, one block per `QElement`, chained by successor edges.
    /// A preamble block installing a synthetic `settype number r2` (the immediate-operand
    /// pseudo-register is always a `Number`) leads the chain, as the source's entry-block
    /// preamble does. Entry is the preamble block; exit is the block holding the last element (or
    /// the preamble itself, for an empty program).
    pub fn build_linear(elements: Vec<QElement>) -> Program {
        let preamble = BasicBlock {
            elements: vec![QElement::SetType {
                reg: "r2".to_owned(),
                ty: crate::ir::DeclaredType::Number,
            }],
        };

        let mut blocks = vec![preamble];
        blocks.extend(elements.into_iter().map(|element| BasicBlock {
            elements: vec![element],
        }));

        let mut edges = Vec::new();
        for from in 0..blocks.len().saturating_sub(1) {
            edges.push(Edge { from, to: from + 1 });
        }

        let exit = blocks.len() - 1;
        Program {
            blocks,
            edges,
            entry: 0,
            exit,
        }
    }

    /// Splits `elements` into blocks at `label`/jump-target boundaries and resolves every jump's
    /// target into a real edge. Falls through to the next block in source order in addition to
    /// any jump edge, since this language has no unconditional-jump-only terminator distinct from
    /// the conditional family.
    ///
    /// # Errors
    /// Returns [`NormalizeError::UnresolvedLabel`] if a jump names a label that never appears.
    pub fn build_labelled(elements: Vec<QElement>) -> Result<Program, NormalizeError> {
        let preamble = QElement::SetType {
            reg: "r2".to_owned(),
            ty: crate::ir::DeclaredType::Number,
        };

        let mut blocks: Vec<BasicBlock> = vec![BasicBlock {
            elements: vec![preamble],
        }];
        let mut label_positions: HashMap<String, usize> = HashMap::new();
        let mut pending_jumps: Vec<(usize, String)> = Vec::new();

        for element in elements {
            match &element {
                QElement::Nope {
                    meta: NopeMeta::Label(name),
                } => {
                    if !blocks.last().unwrap().elements.is_empty() {
                        blocks.push(BasicBlock::default());
                    }
                    label_positions.insert(name.clone(), blocks.len() - 1);
                    continue;
                }
                QElement::Nope {
                    meta: NopeMeta::JumpTarget(target),
                } => {
                    blocks.last_mut().unwrap().elements.push(element.clone());
                    let from = blocks.len() - 1;
                    pending_jumps.push((from, target.clone()));
                    blocks.push(BasicBlock::default());
                    continue;
                }
                _ => blocks.last_mut().unwrap().elements.push(element),
            }
        }

        let mut edges = Vec::new();
        for from in 0..blocks.len().saturating_sub(1) {
            edges.push(Edge { from, to: from + 1 });
        }

        for (from, target) in pending_jumps {
            let to = label_positions
                .get(&target)
                .copied()
                .ok_or_else(|| NormalizeError::UnresolvedLabel(target.clone()))?;
            edges.push(Edge { from, to });
        }

        let exit = blocks.len() - 1;
        Ok(Program {
            blocks,
            edges,
            entry: 0,
            exit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::DeclaredType;

    #[test]
    fn linear_build_prepends_immediate_seed_as_its_own_block() {
        let program = Program::build_linear(vec![QElement::Add {
            src: "r1".to_owned(),
            dst: "r3".to_owned(),
        }]);

        assert_eq!(program.blocks().len(), 2);
        assert_eq!(program.blocks()[0].elements.len(), 1);
        assert!(matches!(
            program.blocks()[0].elements[0],
            QElement::SetType {
                ty: DeclaredType::Number,
                ..
            }
        ));
        assert!(matches!(
            program.blocks()[1].elements[0],
            QElement::Add { .. }
        ));
    }

    #[test]
    fn linear_build_chains_one_block_per_element() {
        let program = Program::build_linear(vec![
            QElement::Add {
                src: "r1".to_owned(),
                dst: "r3".to_owned(),
            },
            QElement::Sub {
                src: "r1".to_owned(),
                dst: "r3".to_owned(),
            },
        ]);

        // preamble -> Add -> Sub
        assert_eq!(program.blocks().len(), 3);
        assert_eq!(program.successors(0).collect::<Vec<_>>(), vec![1]);
        assert_eq!(program.successors(1).collect::<Vec<_>>(), vec![2]);
        assert_eq!(program.successors(2).count(), 0);
        assert_eq!(program.exit(), 2);
    }

    #[test]
    fn linear_build_of_empty_program_is_just_the_preamble() {
        let program = Program::build_linear(vec![]);
        assert_eq!(program.blocks().len(), 1);
        assert_eq!(program.successors(0).count(), 0);
        assert_eq!(program.entry(), 0);
        assert_eq!(program.exit(), 0);
    }

    #[test]
    fn labelled_build_resolves_forward_jump() {
        let elements = vec![
            QElement::Nope {
                meta: NopeMeta::JumpTarget("end".to_owned()),
            },
            QElement::Add {
                src: "r1".to_owned(),
                dst: "r3".to_owned(),
            },
            QElement::Nope {
                meta: NopeMeta::Label("end".to_owned()),
            },
            QElement::Sub {
                src: "r1".to_owned(),
                dst: "r3".to_owned(),
            },
        ];

        let program = Program::build_labelled(elements).unwrap();
        let jump_block = program
            .blocks()
            .iter()
            .position(|b| {
                matches!(
                    b.elements.last(),
                    Some(QElement::Nope {
                        meta: NopeMeta::JumpTarget(_)
                    })
                )
            })
            .unwrap();
        let targets: Vec<usize> = program.successors(jump_block).collect();

        let end_block = program
            .blocks()
            .iter()
            .position(|b| matches!(b.elements.first(), Some(QElement::Sub { .. })))
            .unwrap();
        assert!(targets.contains(&end_block));
        assert_eq!(program.exit(), program.blocks().len() - 1);
    }

    #[test]
    fn labelled_build_rejects_unknown_target() {
        let elements = vec![QElement::Nope {
            meta: NopeMeta::JumpTarget("nowhere".to_owned()),
        }];
        assert_eq!(
            Program::build_labelled(elements),
            Err(NormalizeError::UnresolvedLabel("nowhere".to_owned()))
        );
    }
}
