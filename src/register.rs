//! Register canonicalization (§4.1): maps source-architecture register names onto the dense
//! symbolic space `r0, r1, r2, ...`, matching the original `handle_architecture_registers`
//! behavior (`registers[reg] = "r" + registers.size()` on first sight).

use crate::error::NormalizeError;
use std::collections::HashMap;

/// Operand kind: `Reg` reads the register's value directly, `Mem` dereferences it once.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum OperandKind {
    Reg,
    Mem,
}

/// A parsed `Kind:Name` operand, with `Name` already canonicalized.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Operand {
    pub register: String,
    pub kind: OperandKind,
}

/// Owns the source→canonical register mapping for the lifetime of one program.
///
/// Pre-seeded with the stack pointer (`rsp` → `r0`), the implicit multiplicand/dividend register
/// (`rax` → `r1`), and the immediate-operand pseudo-register (`Imm` → `r2`). Any other name seen
/// for the first time is assigned `"r" + <current map size>`, so the resulting mapping depends
/// only on the order new names are first encountered.
#[derive(Clone, Debug)]
pub struct Canonicalizer {
    map: HashMap<String, String>,
}

impl Canonicalizer {
    pub fn new() -> Canonicalizer {
        let mut map = HashMap::new();
        map.insert("rsp".to_owned(), "r0".to_owned());
        map.insert("rax".to_owned(), "r1".to_owned());
        map.insert("Imm".to_owned(), "r2".to_owned());
        Canonicalizer { map }
    }

    /// Returns `name`'s canonical register, allocating a fresh one if this is the first sighting.
    pub fn canonicalize(&mut self, name: &str) -> String {
        if let Some(existing) = self.map.get(name) {
            return existing.clone();
        }
        let canonical = format!("r{}", self.map.len());
        self.map.insert(name.to_owned(), canonical.clone());
        canonical
    }

    /// The full source→canonical mapping built up so far.
    pub fn mapping(&self) -> &HashMap<String, String> {
        &self.map
    }

    /// Parses a `Kind:Name` operand string and canonicalizes its register name.
    pub fn parse_operand(&mut self, token: &str) -> Result<Operand, NormalizeError> {
        let mut parts = token.splitn(2, ':');
        let kind_str = parts.next().unwrap_or("");
        let name = parts
            .next()
            .ok_or_else(|| NormalizeError::MalformedOperand(token.to_owned()))?;

        let kind = match kind_str {
            "Reg" => OperandKind::Reg,
            "Mem" => OperandKind::Mem,
            _ => return Err(NormalizeError::MalformedOperand(token.to_owned())),
        };

        if name.is_empty() {
            return Err(NormalizeError::MalformedOperand(token.to_owned()));
        }

        Ok(Operand {
            register: self.canonicalize(name),
            kind,
        })
    }
}

impl Default for Canonicalizer {
    fn default() -> Canonicalizer {
        Canonicalizer::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_registers_are_preseeded() {
        let mut c = Canonicalizer::new();
        assert_eq!(c.canonicalize("rsp"), "r0");
        assert_eq!(c.canonicalize("rax"), "r1");
        assert_eq!(c.canonicalize("Imm"), "r2");
    }

    #[test]
    fn new_names_allocate_in_sighting_order() {
        let mut c = Canonicalizer::new();
        assert_eq!(c.canonicalize("rdi"), "r3");
        assert_eq!(c.canonicalize("rsi"), "r4");
        // Re-sighting rdi returns the same canonical name, not a fresh one.
        assert_eq!(c.canonicalize("rdi"), "r3");
    }

    #[test]
    fn canonicalization_is_deterministic_given_a_fixed_token_order() {
        let tokens = ["rdi", "rsi", "rdi", "rbx", "rsi"];

        let mut first = Canonicalizer::new();
        let first_run: Vec<String> = tokens.iter().map(|t| first.canonicalize(t)).collect();

        let mut second = Canonicalizer::new();
        let second_run: Vec<String> = tokens.iter().map(|t| second.canonicalize(t)).collect();

        assert_eq!(first_run, second_run);
        assert_eq!(first.mapping(), second.mapping());
    }

    #[test]
    fn parse_operand_splits_kind_and_name() {
        let mut c = Canonicalizer::new();
        let op = c.parse_operand("Reg:rdi").unwrap();
        assert_eq!(op.kind, OperandKind::Reg);
        assert_eq!(op.register, "r3");

        let op = c.parse_operand("Mem:rdi").unwrap();
        assert_eq!(op.kind, OperandKind::Mem);
        assert_eq!(op.register, "r3");
    }

    #[test]
    fn parse_operand_rejects_unknown_kind() {
        let mut c = Canonicalizer::new();
        assert_eq!(
            c.parse_operand("Imd:rdi"),
            Err(NormalizeError::MalformedOperand("Imd:rdi".to_owned()))
        );
    }

    #[test]
    fn parse_operand_rejects_missing_colon() {
        let mut c = Canonicalizer::new();
        assert_eq!(
            c.parse_operand("Regrdi"),
            Err(NormalizeError::MalformedOperand("Regrdi".to_owned()))
        );
    }
}
