//! Classical conditions attached to conditional instructions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::qubit::ClbitId;

/// A condition on one or more classical bits.
///
/// The bits are read as a little-endian register (first bit is the least
/// significant) and compared against `value`. A conditional instruction
/// reads every listed bit, so each bit becomes a wire of the instruction in
/// the DAG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassicalCondition {
    /// The classical bits forming the register being tested.
    pub clbits: Vec<ClbitId>,
    /// The value to compare against.
    pub value: u64,
}

impl ClassicalCondition {
    /// Condition on a whole register.
    pub fn new(clbits: impl IntoIterator<Item = ClbitId>, value: u64) -> Self {
        Self {
            clbits: clbits.into_iter().collect(),
            value,
        }
    }

    /// Condition on a single bit being set or cleared.
    pub fn on_clbit(clbit: ClbitId, set: bool) -> Self {
        Self::new([clbit], u64::from(set))
    }
}

impl fmt::Display for ClassicalCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits: Vec<_> = self.clbits.iter().map(ToString::to_string).collect();
        write!(f, "[{}]=={:#x}", bits.join(","), self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_bit_condition() {
        let cond = ClassicalCondition::on_clbit(ClbitId(0), true);
        assert_eq!(cond.clbits, vec![ClbitId(0)]);
        assert_eq!(cond.value, 1);
        assert_eq!(cond.to_string(), "[c0]==0x1");
    }

    #[test]
    fn test_register_condition() {
        let cond = ClassicalCondition::new([ClbitId(0), ClbitId(1)], 2);
        assert_eq!(cond.to_string(), "[c0,c1]==0x2");
    }
}
