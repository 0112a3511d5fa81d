use ethereum_types::Address;
use thiserror::Error;

/// Every failure the trace generation can run into.
///
/// None of them is recoverable: a trace with a single malformed row is
/// useless to the prover, so callers are expected to abort the whole
/// conflation on any of these.
#[derive(Debug, Error)]
pub enum TraceError {
    /// A column setter was called twice for the same row.
    #[error("{0} already set")]
    ColumnAlreadySet(&'static str),

    /// A row was validated before all of its columns were written.
    #[error("{0} has not been filled")]
    ColumnNotFilled(&'static str),

    /// A value does not fit in the declared width of its column.
    #[error("{column} has invalid width ({bits} bits)")]
    InvalidWidth { column: &'static str, bits: usize },

    /// The trace was read while a row was still being written.
    #[error("{module}: row {row} has been partially written but not validated")]
    RowNotValidated { module: &'static str, row: usize },

    /// More rows were emitted than were reserved by the counting pass.
    #[error("{module}: cannot write past the {capacity} reserved rows")]
    BufferOverflow {
        module: &'static str,
        capacity: usize,
    },

    /// The emission pass disagrees with the counting pass.
    #[error("{module}: {expected} rows were counted but {actual} were written")]
    LineCountMismatch {
        module: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A reconstructed RLP string differs from the reference encoding.
    #[error("reconstructed RLP {which} differs from the reference: expected 0x{expected}, got 0x{actual}")]
    RlpMismatch {
        which: &'static str,
        expected: String,
        actual: String,
    },

    /// A decreasing byte-size counter did not end at zero, or went below it.
    #[error("{counter} byte size is inconsistent with the emitted limbs")]
    InconsistentByteSize { counter: &'static str },

    /// The address derived from the emitted limbs is not the expected one.
    #[error("derived address {actual:?} differs from the expected {expected:?}")]
    AddressMismatch { expected: Address, actual: Address },

    #[error("unsupported transaction type {0}")]
    UnsupportedTransactionType(u8),

    #[error("{module} cannot handle opcode 0x{opcode:02x}")]
    UnexpectedOpcode { module: &'static str, opcode: u8 },

    #[error("{field} is longer than {max_bytes} bytes")]
    ValueTooLarge {
        field: &'static str,
        max_bytes: usize,
    },

    #[error("transaction is signed for chain {actual}, expected chain {expected}")]
    ChainIdMismatch { expected: u64, actual: u64 },

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("division by zero")]
    DivisionByZero,

    #[error("stack item {0} is not available")]
    StackUnderflow(usize),

    /// `pop` or `exit` was called without a matching `enter`.
    #[error("operation ledger scope underflow")]
    ScopeUnderflow,

    #[error("no block is currently open")]
    NoOpenBlock,

    #[error("no transaction is currently open")]
    NoOpenTransaction,

    #[error(transparent)]
    Rlp(#[from] rlp::DecoderError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
