//! Transfer functions (§4.4): how each [`QElement`] rewrites an [`AbstractEnvironment`], and the
//! preconditions whose violation raises a [`TypeCheckError`] instead.
//!
//! Every transfer follows the same shape as the source's per-instruction `analyze` overrides: a
//! two- or three-way dispatch on the destination's (and sometimes the source's) [`Classification`],
//! `Unknown` always meaning "conservatively skip the check, still apply the effect".

use crate::env::AbstractEnvironment;
use crate::error::{ExpectedType, TypeCheckError, TypeErrorKind};
use crate::ir::{implicit_dest, DeclaredType, QElement};
use crate::lattice::{classify, Classification, Type};

fn mismatch(
    instruction: &'static str,
    register: &str,
    expected: ExpectedType,
    actual: Type,
) -> TypeCheckError {
    TypeCheckError {
        instruction,
        register: register.to_owned(),
        expected,
        actual,
        kind: TypeErrorKind::TypeMismatch,
    }
}

fn deref_of_number(instruction: &'static str, register: &str) -> TypeCheckError {
    TypeCheckError {
        instruction,
        register: register.to_owned(),
        expected: ExpectedType::Pointer,
        actual: Type::Number,
        kind: TypeErrorKind::DerefOfNumber,
    }
}

/// Applies one normalized instruction's transfer function to `env`, in place.
///
/// Returns the precondition violation, if any, as a [`TypeCheckError`]; `env` is still updated
/// with the instruction's effect on the error path where the table calls for it, matching the
/// source's "keep analyzing past the first error" default.
pub fn apply(env: &mut AbstractEnvironment, element: &QElement) -> Result<(), TypeCheckError> {
    match element {
        QElement::SetType { reg, ty } => {
            let declared = match ty {
                DeclaredType::Number => Type::Number,
                DeclaredType::Pointer => Type::pointer(1),
            };
            env.set(reg, declared);
            Ok(())
        }
        QElement::Mov {
            src,
            src_is_mem,
            dst,
        } => apply_mov(env, src, *src_is_mem, dst),
        QElement::Add { src, dst } => apply_add(env, src, dst),
        QElement::Sub { src, dst } => apply_sub(env, src, dst),
        QElement::Mul { src } => apply_mul_div("mul", env, src),
        QElement::Div { src } => apply_mul_div("div", env, src),
        QElement::Cmp { src, dst } => apply_cmp(env, src, dst),
        QElement::LogicalOp { src, dst } => apply_logical(env, src, dst),
        QElement::Nope { .. } => Ok(()),
    }
}

/// `mov`: dereferencing `src` (a `Mem` operand) requires `src` to be a pointer. Per §9, a
/// dereference flatly collapses to `Number` rather than decrementing the indirection count. This
/// matches the observed source behavior rather than the more "obvious" `Pointer(k) -> Pointer(k-1)`
/// reading. A `Reg`-kind `src` is simply copied.
fn apply_mov(
    env: &mut AbstractEnvironment,
    src: &str,
    src_is_mem: bool,
    dst: &str,
) -> Result<(), TypeCheckError> {
    let src_ty = env.get(src);
    if src_is_mem {
        if let Classification::Number = classify(src_ty) {
            return Err(deref_of_number("mov", src));
        }
    }

    let value = if src_is_mem { Type::Number } else { src_ty };

    env.set(dst, value);
    Ok(())
}

/// `add`: a pointer may only be advanced by a number; adding two pointers, or a number and
/// anything but a number, is rejected. The destination classification gates which check applies.
fn apply_add(env: &mut AbstractEnvironment, src: &str, dst: &str) -> Result<(), TypeCheckError> {
    let dst_ty = env.get(dst);
    let src_ty = env.get(src);

    match classify(dst_ty) {
        Classification::Pointer(p) => match classify(src_ty) {
            Classification::Pointer(_) => Err(mismatch("add", src, ExpectedType::Number, src_ty)),
            Classification::Number | Classification::Unknown => {
                env.set(dst, Type::Pointer(p));
                Ok(())
            }
        },
        Classification::Number => match classify(src_ty) {
            Classification::Pointer(_) => {
                env.set(dst, src_ty);
                Ok(())
            }
            Classification::Number | Classification::Unknown => {
                env.set(dst, Type::Number);
                Ok(())
            }
        },
        Classification::Unknown => Ok(()),
    }
}

/// `sub`: `pointer - number = pointer`, `pointer - pointer = number` (pointer difference),
/// `number - number = number`; any other combination is rejected.
fn apply_sub(env: &mut AbstractEnvironment, src: &str, dst: &str) -> Result<(), TypeCheckError> {
    let dst_ty = env.get(dst);
    let src_ty = env.get(src);

    match classify(dst_ty) {
        Classification::Pointer(p) => match classify(src_ty) {
            Classification::Number => {
                env.set(dst, Type::Pointer(p));
                Ok(())
            }
            Classification::Pointer(_) => {
                env.set(dst, Type::Number);
                Ok(())
            }
            Classification::Unknown => Ok(()),
        },
        Classification::Number => {
            if let Classification::Pointer(_) = classify(src_ty) {
                Err(mismatch("sub", src, ExpectedType::Number, src_ty))
            } else {
                env.set(dst, Type::Number);
                Ok(())
            }
        }
        Classification::Unknown => Ok(()),
    }
}

/// `mul`/`div`: the implicit destination (`r1`) must be a `Number`. Per §9, only `r1`'s own
/// classification is checked, not the operand register — `src` is unused for the precondition,
/// matching the data model's statement that these always act on the fixed accumulator register.
fn apply_mul_div(
    instruction: &'static str,
    env: &mut AbstractEnvironment,
    _src: &str,
) -> Result<(), TypeCheckError> {
    let dst = implicit_dest();
    let dst_ty = env.get(dst);

    match classify(dst_ty) {
        Classification::Pointer(_) => {
            return Err(mismatch(instruction, dst, ExpectedType::Number, dst_ty))
        }
        Classification::Number | Classification::Unknown => {}
    }

    env.set(dst, Type::Number);
    Ok(())
}

/// `cmp`: no destructive effect; both operands must agree on being either both `Number` or both
/// `Pointer`, unless either side is `Unknown`. Indirection count is not compared: two pointers of
/// different indirection levels are still both pointers, and nothing about `cmp` inspects `k`.
fn apply_cmp(env: &mut AbstractEnvironment, src: &str, dst: &str) -> Result<(), TypeCheckError> {
    let src_ty = env.get(src);
    let dst_ty = env.get(dst);

    match (classify(src_ty), classify(dst_ty)) {
        (Classification::Unknown, _) | (_, Classification::Unknown) => Ok(()),
        (Classification::Number, Classification::Number) => Ok(()),
        (Classification::Pointer(_), Classification::Pointer(_)) => Ok(()),
        _ => Err(mismatch("cmp", dst, ExpectedType::Matching, dst_ty)),
    }
}

/// `and`/`or`/`xor`/`not`/`shl`/`shr`: bitwise operators admit only `Number` operands, `not`
/// included (§9 resolution: no pointer bitwise-complement carve-out).
fn apply_logical(env: &mut AbstractEnvironment, src: &str, dst: &str) -> Result<(), TypeCheckError> {
    let dst_ty = env.get(dst);
    if let Classification::Pointer(_) = classify(dst_ty) {
        return Err(mismatch("logical", dst, ExpectedType::Number, dst_ty));
    }

    let src_ty = env.get(src);
    if let Classification::Pointer(_) = classify(src_ty) {
        return Err(mismatch("logical", src, ExpectedType::Number, src_ty));
    }

    env.set(dst, Type::Number);
    Ok(())
}
