use ethereum_types::U256;

use crate::codec::LLARGE;
use crate::error::TraceError;
use crate::module::RowCount;
use crate::witness::{Transaction, TransactionType};

/// The fields of a transaction, in encoding order. Each one is traced by its
/// own run of rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    #[default]
    Prefix = 1,
    ChainId,
    Nonce,
    GasPrice,
    MaxPriorityFee,
    MaxFee,
    GasLimit,
    To,
    Value,
    Data,
    AccessList,
    Beta,
    Y,
    R,
    S,
}

use Phase::*;

const FRONTIER_PHASES: &[Phase] = &[Prefix, Nonce, GasPrice, GasLimit, To, Value, Data, Beta, R, S];
const ACCESS_LIST_PHASES: &[Phase] = &[
    Prefix, ChainId, Nonce, GasPrice, GasLimit, To, Value, Data, AccessList, Y, R, S,
];
const EIP1559_PHASES: &[Phase] = &[
    Prefix,
    ChainId,
    Nonce,
    MaxPriorityFee,
    MaxFee,
    GasLimit,
    To,
    Value,
    Data,
    AccessList,
    Y,
    R,
    S,
];

impl Phase {
    pub const fn id(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            Prefix => "rlp prefix",
            ChainId => "chain id",
            Nonce => "nonce",
            GasPrice => "gas price",
            MaxPriorityFee => "max priority fee per gas",
            MaxFee => "max fee per gas",
            GasLimit => "gas limit",
            To => "to",
            Value => "value",
            Data => "data",
            AccessList => "access list",
            Beta => "v",
            Y => "y parity",
            R => "r",
            S => "s",
        }
    }

    pub const fn sequence(tx_type: TransactionType) -> &'static [Phase] {
        match tx_type {
            TransactionType::Frontier => FRONTIER_PHASES,
            TransactionType::AccessList => ACCESS_LIST_PHASES,
            TransactionType::Eip1559 => EIP1559_PHASES,
        }
    }
}

/// Rows of the global prefix: the type byte and the two list prefixes.
pub const PREFIX_ROWS: usize = 17;

/// Rows of an RLP prefix announcing a length.
pub const BYTE_STRING_ROWS: usize = 8;

/// Rows of a short integer field.
pub const INTEGER_ROWS: usize = 8;

/// Rows of the EIP-155 part of the legacy `V` phase.
pub const EIP155_ROWS: usize = 9;

fn integer_rows(value: U256, n_step: usize) -> usize {
    if value.is_zero() {
        1
    } else {
        n_step
    }
}

/// One transaction to encode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RlpTxnChunk {
    pub tx: Transaction,
    pub tx_type: TransactionType,
    /// Chain id of a legacy EIP-155 transaction.
    pub eip155_chain_id: Option<u64>,
    pub requires_evm_execution: bool,
    /// Row count of each phase, in order.
    pub phase_rows: Vec<(Phase, usize)>,
}

impl RlpTxnChunk {
    pub fn new(tx: &Transaction) -> Result<Self, TraceError> {
        let tx_type = tx.tx_type()?;
        let eip155_chain_id = match tx_type {
            TransactionType::Frontier => tx.legacy_chain_id(),
            TransactionType::AccessList | TransactionType::Eip1559 => None,
        };
        let phase_rows = Phase::sequence(tx_type)
            .iter()
            .map(|phase| Ok((*phase, Self::count(tx, *phase, eip155_chain_id)?)))
            .collect::<Result<_, TraceError>>()?;
        Ok(Self {
            tx: tx.clone(),
            tx_type,
            eip155_chain_id,
            requires_evm_execution: tx.requires_evm_execution(),
            phase_rows,
        })
    }

    fn count(tx: &Transaction, phase: Phase, eip155: Option<u64>) -> Result<usize, TraceError> {
        let rows = match phase {
            Prefix => PREFIX_ROWS,
            ChainId => integer_rows(tx.typed_chain_id()?.into(), INTEGER_ROWS),
            Nonce => integer_rows(tx.nonce.into(), INTEGER_ROWS),
            GasPrice => integer_rows(tx.gas_price()?, INTEGER_ROWS),
            MaxPriorityFee => integer_rows(tx.max_priority_fee()?, INTEGER_ROWS),
            MaxFee => integer_rows(tx.max_fee()?, INTEGER_ROWS),
            GasLimit => integer_rows(tx.gas_limit.into(), INTEGER_ROWS),
            To => match tx.to {
                Some(_) => LLARGE,
                None => 1,
            },
            Value => integer_rows(tx.value, LLARGE),
            Data => match tx.payload.len() {
                0 => 2,
                n => BYTE_STRING_ROWS + LLARGE * n.div_ceil(LLARGE) + 2,
            },
            AccessList => match tx.access_list.is_empty() {
                true => 1,
                false => {
                    BYTE_STRING_ROWS
                        + tx.access_list
                            .iter()
                            .map(|item| {
                                let keys = match item.storage_keys.len() {
                                    0 => 1,
                                    n => BYTE_STRING_ROWS + LLARGE * n,
                                };
                                BYTE_STRING_ROWS + LLARGE + keys
                            })
                            .sum::<usize>()
                }
            },
            Beta => INTEGER_ROWS + eip155.map_or(0, |_| EIP155_ROWS),
            Y => 1,
            R => integer_rows(tx.r, LLARGE),
            S => integer_rows(tx.s, LLARGE),
        };
        Ok(rows)
    }

    /// The chain id the transaction commits to, if any.
    pub fn chain_id(&self) -> Result<Option<u64>, TraceError> {
        match self.tx_type {
            TransactionType::Frontier => Ok(self.eip155_chain_id),
            TransactionType::AccessList | TransactionType::Eip1559 => {
                self.tx.typed_chain_id().map(Some)
            }
        }
    }
}

impl RowCount for RlpTxnChunk {
    fn row_count(&self) -> usize {
        self.phase_rows.iter().map(|(_, rows)| rows).sum()
    }
}

#[cfg(test)]
mod tests {
    use ethereum_types::{Address, H256};

    use super::*;
    use crate::witness::AccessListItem;

    fn legacy() -> Transaction {
        Transaction {
            tx_type: 0,
            nonce: 9,
            gas_price: Some(20_000_000_000u64.into()),
            gas_limit: 21_000,
            to: Some(Address::repeat_byte(0x35)),
            value: U256::exp10(18),
            v: 37,
            r: U256::one(),
            s: U256::one(),
            ..Default::default()
        }
    }

    #[test]
    fn legacy_eip155_rows() -> Result<(), TraceError> {
        let chunk = RlpTxnChunk::new(&legacy())?;
        assert_eq!(chunk.eip155_chain_id, Some(1));
        let phases: Vec<_> = chunk.phase_rows.iter().map(|(phase, _)| phase.id()).collect();
        assert_eq!(phases, vec![1, 3, 4, 7, 8, 9, 10, 12, 14, 15]);
        // prefix, nonce, gas price, gas limit, to, value, empty data, v + beta, r, s
        assert_eq!(chunk.row_count(), 17 + 8 + 8 + 8 + 16 + 16 + 2 + 17 + 16 + 16);
        Ok(())
    }

    #[test]
    fn zero_fields_take_one_row() -> Result<(), TraceError> {
        let tx = Transaction {
            nonce: 0,
            to: None,
            value: U256::zero(),
            v: 27,
            r: U256::zero(),
            ..legacy()
        };
        let chunk = RlpTxnChunk::new(&tx)?;
        assert_eq!(chunk.eip155_chain_id, None);
        assert_eq!(chunk.row_count(), 17 + 1 + 8 + 8 + 1 + 1 + 2 + 8 + 1 + 16);
        Ok(())
    }

    #[test]
    fn access_list_rows() -> Result<(), TraceError> {
        let tx = Transaction {
            tx_type: 2,
            chain_id: Some(59_144),
            max_priority_fee_per_gas: Some(0.into()),
            max_fee_per_gas: Some(100.into()),
            payload: vec![0xab; 17],
            access_list: vec![
                AccessListItem {
                    address: Address::repeat_byte(1),
                    storage_keys: vec![H256::zero(); 2],
                },
                AccessListItem {
                    address: Address::repeat_byte(2),
                    storage_keys: vec![],
                },
            ],
            v: 1,
            ..legacy()
        };
        let chunk = RlpTxnChunk::new(&tx)?;
        let rows: Vec<_> = chunk.phase_rows.iter().map(|(_, rows)| *rows).collect();
        assert_eq!(
            rows,
            vec![17, 8, 8, 1, 8, 8, 16, 16, 8 + 32 + 2, 8 + (24 + 8 + 32) + (24 + 1), 1, 16, 16]
        );
        assert_eq!(chunk.chain_id()?, Some(59_144));
        Ok(())
    }

    #[test]
    fn typed_transactions_need_a_chain_id() {
        let tx = Transaction {
            tx_type: 1,
            chain_id: None,
            ..legacy()
        };
        assert!(matches!(
            RlpTxnChunk::new(&tx),
            Err(TraceError::MissingField("chain_id"))
        ));
    }
}
