//! Property-based coverage (§8) over small generated programs.

use proptest::prelude::*;
use regtype_check::{typecheck, Canonicalizer};

fn tok(line: &[&str]) -> Vec<String> {
    line.iter().map(|s| s.to_string()).collect()
}

fn settype(ty: &str, reg: &str) -> Vec<String> {
    tok(&["settype", ty, reg])
}

fn reg_name(n: u32) -> String {
    format!("reg{}", n)
}

proptest! {
    /// A program that only ever declares fresh registers as `Number` and adds them together
    /// never produces a type error: every operand stays a `Number` throughout.
    #[test]
    fn well_typed_number_chains_never_error(count in 1u32..8) {
        let mut program = vec![settype("number", &reg_name(0))];
        for i in 1..count {
            program.push(settype("number", &reg_name(i)));
            program.push(tok(&["add", &format!("Reg:{}", reg_name(i)), &format!("Reg:{}", reg_name(0))]));
        }
        prop_assert!(typecheck(&program).is_ok());
    }

    /// Subtracting a pointer-typed register from a number-typed one is rejected, regardless of
    /// which other unrelated, well-typed instructions surround it.
    #[test]
    fn mixing_pointer_into_number_sub_always_errors(prefix_count in 0u32..4) {
        let mut program = Vec::new();
        for i in 0..prefix_count {
            program.push(settype("number", &reg_name(i)));
        }
        program.push(settype("number", "acc"));
        program.push(settype("pointer", "p"));
        program.push(tok(&["sub", "Reg:p", "Reg:acc"]));
        prop_assert!(typecheck(&program).is_err());
    }

    /// Canonicalization is a pure function of the sequence of first-sighted names: two runs over
    /// the same token stream always agree.
    #[test]
    fn canonicalization_is_deterministic(names in prop::collection::vec("[a-z]{2,6}", 1..20)) {
        let mut first = Canonicalizer::new();
        let first_run: Vec<String> = names.iter().map(|n| first.canonicalize(n)).collect();

        let mut second = Canonicalizer::new();
        let second_run: Vec<String> = names.iter().map(|n| second.canonicalize(n)).collect();

        prop_assert_eq!(first_run, second_run);
        prop_assert_eq!(first.mapping().clone(), second.mapping().clone());
    }

    /// Two consecutive `SetType` instructions on the same register are equivalent to one: the
    /// exit environment only reflects the second (overriding) declaration.
    #[test]
    fn repeated_settype_is_idempotent(first_ty in prop_oneof![Just("number".to_owned()), Just("pointer".to_owned())],
                                       second_ty in prop_oneof![Just("number".to_owned()), Just("pointer".to_owned())]) {
        let once = typecheck(&[settype(&second_ty, "rdi")]).unwrap();
        let twice = typecheck(&[settype(&first_ty, "rdi"), settype(&second_ty, "rdi")]).unwrap();
        prop_assert_eq!(once.get("r3"), twice.get("r3"));
    }
}
