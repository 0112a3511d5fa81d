use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TraceError;
use crate::trace::{ColumnSet, ModuleTrace, TraceWriter};
use crate::witness::{BlockHeader, OpcodeEvent, Transaction, TransactionOutcome};

/// Number of trace rows an operation emits. Known before emission starts.
pub trait RowCount {
    fn row_count(&self) -> usize;
}

/// The trace modules this crate produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    Mxp,
    RlpAddr,
    TxnData,
    RlpTxn,
}

impl ModuleKind {
    pub const ALL: [ModuleKind; 4] = [Self::Mxp, Self::RlpAddr, Self::TxnData, Self::RlpTxn];

    /// Name of the module as used in column names and file names.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Mxp => "mxp",
            Self::RlpAddr => "rlpaddr",
            Self::TxnData => "txndata",
            Self::RlpTxn => "rlptxn",
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown module {0:?}, expected one of mxp, rlpaddr, txndata, rlptxn")]
pub struct UnknownModule(String);

impl FromStr for ModuleKind {
    type Err = UnknownModule;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownModule(s.to_string()))
    }
}

/// Lifecycle of a trace module, driven by the replayed execution events.
///
/// Hooks a module has no use for keep their no-op default.
pub trait Module {
    fn kind(&self) -> ModuleKind;

    fn enter_scope(&mut self);

    /// Commits the innermost scope.
    fn exit_scope(&mut self) -> Result<(), TraceError>;

    /// Reverts the innermost scope.
    fn pop_scope(&mut self) -> Result<(), TraceError>;

    fn trace_start_block(&mut self, _header: &BlockHeader) -> Result<(), TraceError> {
        Ok(())
    }

    fn trace_end_block(&mut self, _header: &BlockHeader) -> Result<(), TraceError> {
        Ok(())
    }

    fn trace_start_tx(&mut self, _tx: &Transaction) -> Result<(), TraceError> {
        Ok(())
    }

    fn trace_end_tx(&mut self, _outcome: &TransactionOutcome) -> Result<(), TraceError> {
        Ok(())
    }

    fn trace_pre_opcode(&mut self, _frame: &OpcodeEvent) -> Result<(), TraceError> {
        Ok(())
    }

    /// Rows the module will emit for the live operations.
    fn line_count(&self) -> usize;

    /// Emits the rows of every live operation.
    fn commit(&self) -> Result<ModuleTrace, TraceError>;
}

/// Sizes a writer with `ops`' row counts, then emits each operation with
/// `emit`, given its 1-based stamp, and checks it wrote exactly the rows it
/// announced.
pub(crate) fn emit_operations<'a, C, T, I, F>(ops: I, mut emit: F) -> Result<ModuleTrace, TraceError>
where
    C: ColumnSet,
    T: RowCount + 'a,
    I: IntoIterator<Item = &'a T>,
    I::IntoIter: Clone,
    F: FnMut(&T, usize, &mut TraceWriter<C>) -> Result<(), TraceError>,
{
    let ops = ops.into_iter();
    let capacity = ops.clone().map(RowCount::row_count).sum();
    let mut trace = TraceWriter::<C>::new(capacity);
    for (i, op) in ops.enumerate() {
        let before = trace.size()?;
        emit(op, i + 1, &mut trace)?;
        let written = trace.size()? - before;
        if written != op.row_count() {
            return Err(TraceError::LineCountMismatch {
                module: C::MODULE,
                expected: op.row_count(),
                actual: written,
            });
        }
    }
    trace.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_names_parse() {
        assert_eq!("rlpTxn".parse::<ModuleKind>().ok(), Some(ModuleKind::RlpTxn));
        assert_eq!(" mxp".parse::<ModuleKind>().ok(), Some(ModuleKind::Mxp));
        assert!("hub".parse::<ModuleKind>().is_err());
        assert_eq!(
            serde_json::to_string(&ModuleKind::RlpAddr).unwrap(),
            r#""rlpaddr""#
        );
    }

    crate::declare_columns! {
        enum Cols in "fixture" {
            Value => "VALUE": 1,
        }
    }

    struct Op(usize);

    impl RowCount for Op {
        fn row_count(&self) -> usize {
            self.0
        }
    }

    #[test]
    fn operations_must_emit_their_row_count() -> Result<(), TraceError> {
        let ops = [Op(2), Op(1)];
        let trace = emit_operations::<Cols, _, _, _>(&ops, |op, stamp, trace| {
            for _ in 0..op.0 {
                trace.set_u64(Cols::Value, stamp as u64)?;
                trace.validate_row()?;
            }
            Ok(())
        })?;
        assert_eq!(trace.column("fixture.VALUE"), Some(&[1u8, 1, 2][..]));

        let short = emit_operations::<Cols, _, _, _>(&ops, |_, _, trace| {
            trace.fill_and_validate_row()
        });
        assert!(matches!(
            short,
            Err(TraceError::LineCountMismatch {
                expected: 2,
                actual: 1,
                ..
            })
        ));
        Ok(())
    }
}
