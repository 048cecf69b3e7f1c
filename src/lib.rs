//! Static type-checker for a small x86-like assembly language.
//!
//! The checker assigns each machine register, at each program point, one of two abstract types:
//! **Number** or **Pointer**. It rejects programs that perform operations inconsistent with
//! those types (dereferencing a number, multiplying a pointer, subtracting a pointer from a
//! number, comparing a pointer to a number, ...).
//!
//! This crate does not tokenize source text and does not drive a command line; it consumes
//! pre-tokenized instruction records (one `Vec<String>` per source line) and returns either the
//! inferred exit environment or a structured [`Error`].
//!
//! # Pipeline
//!
//! 1. [`register`] canonicalizes architecture register names (`rdi`, `eax`, ...) into a dense
//!    symbolic space (`r0`, `r1`, ...).
//! 2. [`ir`] normalizes each tokenized line into one or a few [`ir::QElement`]s over that
//!    symbolic space.
//! 3. [`cfg`] lifts the QElement stream into a [`cfg::Program`] of basic blocks.
//! 4. [`transfer`] runs the abstract semantics of each QElement against an [`env::AbstractEnvironment`].
//! 5. [`fixpoint`] drives those transfer functions to a least fixed point over the CFG.
//!
//! The top-level entry point is [`typecheck`].

pub mod cfg;
pub mod env;
pub mod error;
pub mod fixpoint;
pub mod ir;
pub mod lattice;
pub mod register;
pub mod transfer;

pub use env::AbstractEnvironment;
pub use error::{Error, NormalizeError, TypeCheckError, TypeErrorKind};
pub use lattice::Type;
pub use register::{Canonicalizer, OperandKind};

/// The environment inferred at the exit of a program, on success.
pub type ExitEnvironment = env::AbstractEnvironment;

/// A fully normalized program together with the canonicalizer that produced it.
///
/// Owning both lets a caller inspect the source→canonical register mapping (for diagnostics, or
/// for the canonicalization-determinism property in the test suite) alongside the CFG it built.
pub struct QProgram {
    canonicalizer: register::Canonicalizer,
    program: cfg::Program,
}

impl QProgram {
    /// Normalizes `tokens` and builds the default (linear) CFG.
    pub fn from_tokens(tokens: &[Vec<String>]) -> Result<Self, Error> {
        let mut canonicalizer = register::Canonicalizer::new();
        let elements = ir::normalize_program(tokens, &mut canonicalizer)?;
        let program = cfg::Program::build_linear(elements);
        Ok(QProgram {
            canonicalizer,
            program,
        })
    }

    /// Normalizes `tokens` and builds the labelled CFG extension (§4.3), resolving jump targets
    /// to real edges instead of leaving them as inert `Nope`s.
    pub fn from_tokens_labelled(tokens: &[Vec<String>]) -> Result<Self, Error> {
        let mut canonicalizer = register::Canonicalizer::new();
        let elements = ir::normalize_program(tokens, &mut canonicalizer)?;
        let program = cfg::Program::build_labelled(elements)?;
        Ok(QProgram {
            canonicalizer,
            program,
        })
    }

    /// Runs the fixpoint engine over this program's CFG.
    pub fn typecheck(&self) -> Result<ExitEnvironment, TypeCheckError> {
        let mut engine = fixpoint::FixpointEngine::new(&self.program);
        engine.run()?;
        Ok(engine.exit_state())
    }

    /// The register name mapping this program's canonicalizer produced, `source name -> r<N>`.
    pub fn canonical_registers(&self) -> &std::collections::HashMap<String, String> {
        self.canonicalizer.mapping()
    }

    /// The CFG this program was normalized into.
    pub fn program(&self) -> &cfg::Program {
        &self.program
    }
}

/// Normalizes `tokens`, builds the default linear CFG, and type-checks it.
///
/// This is the convenience entry point for callers that don't need the intermediate
/// [`QProgram`] (e.g. to inspect the canonical register mapping).
pub fn typecheck(tokens: &[Vec<String>]) -> Result<ExitEnvironment, Error> {
    let program = QProgram::from_tokens(tokens)?;
    program.typecheck().map_err(Error::from)
}
