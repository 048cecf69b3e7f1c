//! Instruction normalization (§4.2): turns tokenized source lines into the closed [`QElement`]
//! union, over the canonical register space the [`crate::register::Canonicalizer`] maintains.
//!
//! The source dispatches on mnemonic via a chain-of-responsibility of handler objects. The
//! re-architecture collapses that into a single `match` over the leading token, which gives the
//! compiler exhaustiveness checking for free and needs no `next` pointer chasing at runtime.

use crate::error::NormalizeError;
use crate::register::{Canonicalizer, OperandKind};

/// A declared type, as written by a `settype` line.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum DeclaredType {
    Number,
    Pointer,
}

/// A normalized instruction over the canonical register space.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum QElement {
    SetType {
        reg: String,
        ty: DeclaredType,
    },
    Mov {
        src: String,
        src_is_mem: bool,
        dst: String,
    },
    Add {
        src: String,
        dst: String,
    },
    Sub {
        src: String,
        dst: String,
    },
    /// Implicit destination is always `r1`.
    Mul {
        src: String,
    },
    /// Implicit destination is always `r1`.
    Div {
        src: String,
    },
    Cmp {
        src: String,
        dst: String,
    },
    LogicalOp {
        src: String,
        dst: String,
    },
    /// Identity transfer. Carries label/jump metadata for the labelled CFG builder; inert in the
    /// default linear builder.
    Nope { meta: NopeMeta },
}

/// Why a `Nope` exists: plain (from a no-metadata source like a bare jump with an unresolved
/// family), a block label, or a jump's target label.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum NopeMeta {
    Plain,
    Label(String),
    JumpTarget(String),
}

const IMPLICIT_MUL_DIV_DEST: &str = "r1";

/// The canonical name used everywhere for the fixed `Mul`/`Div` implicit destination.
pub fn implicit_dest() -> &'static str {
    IMPLICIT_MUL_DIV_DEST
}

fn is_jump_mnemonic(mnemonic: &str) -> bool {
    matches!(
        mnemonic,
        "jmp" | "je" | "jne" | "jg" | "jge" | "jl" | "jle"
    )
}

fn is_logical_mnemonic(mnemonic: &str) -> bool {
    matches!(mnemonic, "and" | "or" | "xor" | "not" | "shl" | "shr")
}

/// Normalizes one tokenized line into a (usually one-element) sequence of [`QElement`]s.
///
/// Dispatches on `tokens[0]`, case-insensitively. `lea` and the (also unary) jump family are the
/// only mnemonics that can produce more or fewer than one element.
pub fn normalize_line(
    tokens: &[String],
    canon: &mut Canonicalizer,
) -> Result<Vec<QElement>, NormalizeError> {
    let mnemonic = tokens
        .first()
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();

    match mnemonic.as_str() {
        "label" => {
            let name = operand_token(tokens, 1)?;
            Ok(vec![QElement::Nope {
                meta: NopeMeta::Label(name.clone()),
            }])
        }
        "settype" => {
            let ty = match operand_token(tokens, 1)?.as_str() {
                "number" => DeclaredType::Number,
                "pointer" => DeclaredType::Pointer,
                other => return Err(NormalizeError::MalformedOperand(other.to_owned())),
            };
            let name = operand_token(tokens, 2)?;
            let reg = canon.canonicalize(name);
            Ok(vec![QElement::SetType { reg, ty }])
        }
        "add" => {
            let (src, dst) = two_operands(tokens, canon)?;
            Ok(vec![QElement::Add {
                src: src.register,
                dst: dst.register,
            }])
        }
        "sub" => {
            let (src, dst) = two_operands(tokens, canon)?;
            Ok(vec![QElement::Sub {
                src: src.register,
                dst: dst.register,
            }])
        }
        "cmp" => {
            let (src, dst) = two_operands(tokens, canon)?;
            Ok(vec![QElement::Cmp {
                src: src.register,
                dst: dst.register,
            }])
        }
        "mul" => {
            let src = canon.parse_operand(operand_token(tokens, 1)?)?;
            Ok(vec![QElement::Mul { src: src.register }])
        }
        "div" => {
            let src = canon.parse_operand(operand_token(tokens, 1)?)?;
            Ok(vec![QElement::Div { src: src.register }])
        }
        "mov" => {
            let (src, dst) = two_operands(tokens, canon)?;
            Ok(vec![QElement::Mov {
                src: src.register,
                src_is_mem: src.kind == OperandKind::Mem,
                dst: dst.register,
            }])
        }
        "lea" => normalize_lea(tokens, canon),
        m if is_jump_mnemonic(m) => {
            let target = operand_token(tokens, tokens.len() - 1)?.to_owned();
            Ok(vec![QElement::Nope {
                meta: NopeMeta::JumpTarget(target),
            }])
        }
        m if is_logical_mnemonic(m) => {
            let (src, dst) = two_operands(tokens, canon)?;
            Ok(vec![QElement::LogicalOp {
                src: src.register,
                dst: dst.register,
            }])
        }
        _ => Err(NormalizeError::UnknownMnemonic(
            tokens.first().cloned().unwrap_or_default(),
        )),
    }
}

/// Normalizes every line in `tokens`, concatenating each line's QElement(s) in order.
pub fn normalize_program(
    tokens: &[Vec<String>],
    canon: &mut Canonicalizer,
) -> Result<Vec<QElement>, NormalizeError> {
    let mut elements = Vec::new();
    for line in tokens {
        tracing::trace!(mnemonic = ?line.first(), "normalizing line");
        elements.extend(normalize_line(line, canon)?);
    }
    Ok(elements)
}

fn normalize_lea(
    tokens: &[String],
    canon: &mut Canonicalizer,
) -> Result<Vec<QElement>, NormalizeError> {
    let base = canon.parse_operand(operand_token(tokens, 1)?)?;

    match tokens.len() {
        4 => {
            let index = canon.parse_operand(operand_token(tokens, 2)?)?;
            let dst = canon.parse_operand(operand_token(tokens, 3)?)?;
            Ok(vec![
                QElement::Mul { src: index.register },
                QElement::Mov {
                    src: base.register,
                    src_is_mem: base.kind == OperandKind::Mem,
                    dst: dst.register,
                },
            ])
        }
        3 => {
            let dst = canon.parse_operand(operand_token(tokens, 2)?)?;
            Ok(vec![QElement::Mov {
                src: base.register,
                src_is_mem: base.kind == OperandKind::Mem,
                dst: dst.register,
            }])
        }
        _ => Err(NormalizeError::MalformedOperand(tokens.join(" "))),
    }
}

fn operand_token(tokens: &[String], index: usize) -> Result<&String, NormalizeError> {
    tokens
        .get(index)
        .ok_or_else(|| NormalizeError::MalformedOperand(tokens.join(" ")))
}

fn two_operands(
    tokens: &[String],
    canon: &mut Canonicalizer,
) -> Result<(crate::register::Operand, crate::register::Operand), NormalizeError> {
    let src = canon.parse_operand(operand_token(tokens, 1)?)?;
    let dst = canon.parse_operand(operand_token(tokens, 2)?)?;
    Ok((src, dst))
}
