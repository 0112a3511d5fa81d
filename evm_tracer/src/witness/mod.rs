//! Serializable execution events.
//!
//! The host engine adapter turns its own callbacks into these values. The
//! modules of this crate only ever see them, never a live EVM frame.

mod instruction;
mod transaction;

use ethereum_types::{Address, U256};
pub use instruction::Instruction;
use serde::{Deserialize, Serialize};
pub use transaction::{AccessListItem, Transaction, TransactionType};

use crate::error::TraceError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub number: u64,
    pub coinbase: Address,
    #[serde(default)]
    pub base_fee: U256,
    pub gas_limit: u64,
}

/// What the host reports once a transaction has been executed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutcome {
    pub success: bool,
    /// Gas used by the block so far, this transaction included.
    pub gas_used: u64,
    pub leftover_gas: u64,
    /// Refund counter before capping.
    pub refund_counter: u64,
}

/// Snapshot of the executing frame right before an opcode runs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpcodeEvent {
    pub opcode: u8,
    pub context_number: u32,
    #[serde(default)]
    pub depth: u32,
    #[serde(default)]
    pub deploys: bool,
    /// Current memory size in 32-byte words.
    pub memory_words: u64,
    /// Stack items, top first.
    pub stack: Vec<U256>,
    #[serde(default, with = "evm_tracer_common::hex")]
    pub memory: Vec<u8>,
    pub contract_address: Address,
    #[serde(default)]
    pub caller: Address,
    /// Nonce of the executing account.
    #[serde(default)]
    pub contract_nonce: u64,
}

impl OpcodeEvent {
    /// Returns the `n`-th stack item, counting from the top.
    pub fn stack_item(&self, n: usize) -> Result<U256, TraceError> {
        self.stack
            .get(n)
            .copied()
            .ok_or(TraceError::StackUnderflow(n))
    }

    /// Reads `size` bytes of memory at `offset`, zero-extending past the end
    /// of the snapshot.
    pub fn read_memory(&self, offset: U256, size: U256) -> Result<Vec<u8>, TraceError> {
        if size.is_zero() {
            return Ok(Vec::new());
        }
        if offset > U256::from(u32::MAX) || size > U256::from(u32::MAX) {
            return Err(TraceError::ValueTooLarge {
                field: "memory range",
                max_bytes: 4,
            });
        }
        let (offset, size) = (offset.as_usize(), size.as_usize());
        let mut out = vec![0u8; size];
        if offset < self.memory.len() {
            let end = (offset + size).min(self.memory.len());
            out[..end - offset].copy_from_slice(&self.memory[offset..end]);
        }
        Ok(out)
    }
}

/// One host callback, in replay order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionEvent {
    BlockStart(BlockHeader),
    BlockEnd(BlockHeader),
    TransactionStart(Transaction),
    TransactionEnd(TransactionOutcome),
    /// The sequencer dropped the last transaction.
    PopTransaction,
    Opcode(OpcodeEvent),
    EnterScope,
    ExitScope { reverted: bool },
}

/// A batch of consecutive blocks traced together.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflation {
    pub events: Vec<ExecutionEvent>,
}
