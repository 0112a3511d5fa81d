//! Trace generation for a zk arithmetization of the EVM.
//!
//! The crate replays the execution of a conflation of blocks, as a stream of
//! [`ExecutionEvent`]s, through a set of trace modules. Each module turns the
//! events it cares about into operations, whose exact number of rows is known
//! as soon as they are captured. Committing then writes every operation into
//! fixed-width, column-major buffers ready to be fed to a prover.
//!
//! The modules are:
//!
//! - [`mxp`], the memory expansion of memory-touching opcodes and its gas
//!   cost;
//! - [`rlp_addr`], the derivation of contract addresses by `CREATE`,
//!   `CREATE2` and deployment transactions;
//! - [`txn_data`], the per-transaction metadata and the checks binding it to
//!   the block;
//! - [`rlp_txn`], the RLP encoding of each transaction, rebuilt limb by limb.
//!
//! Operations live in a scoped [`ledger`], so that the operations of reverted
//! call frames or dropped transactions never reach the trace.
//!
//! ```ignore
//! let mut tracer = ZkTracer::new(TracerConfig::default());
//! tracer.replay(&conflation)?;
//!
//! // Counting pass alone, to check the conflation limits.
//! let line_counts = tracer.line_counts();
//!
//! // Emission pass, writing `<module>.bin` and `<module>.headers.json`.
//! tracer.write_to(Path::new("traces"))?;
//! ```

pub mod codec;
pub mod error;
pub mod helpers;
pub mod ledger;
pub mod module;
pub mod mxp;
pub mod rlp_addr;
pub mod rlp_txn;
pub mod trace;
pub mod tracer;
pub mod txn_data;
pub mod witness;

pub use error::TraceError;
pub use module::{Module, ModuleKind, RowCount};
pub use trace::{ColumnHeader, ModuleTrace};
pub use tracer::{LineCounts, TracerConfig, ZkTracer, LINE_COUNTS_FILE};
pub use witness::{
    BlockHeader, Conflation, ExecutionEvent, OpcodeEvent, Transaction, TransactionOutcome,
};
