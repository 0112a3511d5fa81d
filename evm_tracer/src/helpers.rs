//! Word comparison and Euclidean division lookups.
//!
//! Both are pure functions of their arguments. Each call is recorded so that
//! the lookup rows can be matched against the calls of the modules using
//! them.

use ethereum_types::U256;

use crate::error::TraceError;
use crate::ledger::StackedList;

pub const LT: u8 = 0x10;
pub const LEQ: u8 = 0x0f;
pub const ISZERO: u8 = 0x15;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WcpInstruction {
    Lt,
    Leq,
    IsZero,
}

impl WcpInstruction {
    pub const fn opcode(self) -> u8 {
        match self {
            Self::Lt => LT,
            Self::Leq => LEQ,
            Self::IsZero => ISZERO,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WcpOperation {
    pub instruction: WcpInstruction,
    pub arg1: U256,
    pub arg2: U256,
    pub result: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EucOperation {
    pub dividend: U256,
    pub divisor: U256,
    pub quotient: U256,
    pub remainder: U256,
}

pub trait WordComparison {
    fn lt(&mut self, a: U256, b: U256) -> bool;
    fn leq(&mut self, a: U256, b: U256) -> bool;
    fn is_zero(&mut self, a: U256) -> bool;
}

pub trait EuclideanDivision {
    /// Returns `(a / b, a % b)`.
    fn divide(&mut self, a: U256, b: U256) -> Result<(U256, U256), TraceError>;
}

#[derive(Clone, Debug, Default)]
pub struct Wcp {
    operations: StackedList<WcpOperation>,
}

impl Wcp {
    fn record(&mut self, instruction: WcpInstruction, arg1: U256, arg2: U256, result: bool) -> bool {
        self.operations.add(WcpOperation {
            instruction,
            arg1,
            arg2,
            result,
        });
        result
    }

    pub fn enter_scope(&mut self) {
        self.operations.enter();
    }

    pub fn exit_scope(&mut self) -> Result<(), TraceError> {
        self.operations.exit()
    }

    pub fn pop_scope(&mut self) -> Result<(), TraceError> {
        self.operations.pop()
    }

    pub fn operations(&self) -> impl Iterator<Item = &WcpOperation> + '_ {
        self.operations.iter()
    }
}

impl WordComparison for Wcp {
    fn lt(&mut self, a: U256, b: U256) -> bool {
        self.record(WcpInstruction::Lt, a, b, a < b)
    }

    fn leq(&mut self, a: U256, b: U256) -> bool {
        self.record(WcpInstruction::Leq, a, b, a <= b)
    }

    fn is_zero(&mut self, a: U256) -> bool {
        self.record(WcpInstruction::IsZero, a, U256::zero(), a.is_zero())
    }
}

#[derive(Clone, Debug, Default)]
pub struct Euc {
    operations: StackedList<EucOperation>,
}

impl Euc {
    pub fn enter_scope(&mut self) {
        self.operations.enter();
    }

    pub fn exit_scope(&mut self) -> Result<(), TraceError> {
        self.operations.exit()
    }

    pub fn pop_scope(&mut self) -> Result<(), TraceError> {
        self.operations.pop()
    }

    pub fn operations(&self) -> impl Iterator<Item = &EucOperation> + '_ {
        self.operations.iter()
    }
}

impl EuclideanDivision for Euc {
    fn divide(&mut self, a: U256, b: U256) -> Result<(U256, U256), TraceError> {
        if b.is_zero() {
            return Err(TraceError::DivisionByZero);
        }
        let (quotient, remainder) = a.div_mod(b);
        self.operations.add(EucOperation {
            dividend: a,
            divisor: b,
            quotient,
            remainder,
        });
        Ok((quotient, remainder))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparisons_are_recorded() -> Result<(), TraceError> {
        let mut wcp = Wcp::default();
        assert!(wcp.lt(1.into(), 2.into()));
        assert!(wcp.leq(2.into(), 2.into()));
        wcp.enter_scope();
        assert!(!wcp.is_zero(3.into()));
        wcp.pop_scope()?;
        let ops: Vec<_> = wcp.operations().map(|op| op.instruction.opcode()).collect();
        assert_eq!(ops, vec![LT, LEQ]);
        Ok(())
    }

    #[test]
    fn division_returns_quotient_and_remainder() -> Result<(), TraceError> {
        let mut euc = Euc::default();
        assert_eq!(euc.divide(21_007.into(), 5.into())?, (4_201.into(), 2.into()));
        assert!(matches!(
            euc.divide(1.into(), U256::zero()),
            Err(TraceError::DivisionByZero)
        ));
        assert_eq!(euc.operations().count(), 1);
        Ok(())
    }
}
