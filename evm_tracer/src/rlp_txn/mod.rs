//! RLP encoding of transactions.
//!
//! Every transaction is traced phase by phase, each field being cut into
//! limbs that rebuild both the signing pre-image (`LT`) and the signed
//! transaction (`LX`). The rebuilt strings are checked against a reference
//! encoding before the trace is handed out.

mod chunk;
mod columns;
mod emitter;

pub use self::chunk::{
    Phase, RlpTxnChunk, BYTE_STRING_ROWS, EIP155_ROWS, INTEGER_ROWS, PREFIX_ROWS,
};
pub use self::columns::RlpTxnColumn;
use self::emitter::Emitter;
use crate::error::TraceError;
use crate::ledger::StackedList;
use crate::module::{emit_operations, Module, ModuleKind, RowCount};
use crate::trace::ModuleTrace;
use crate::witness::Transaction;

#[derive(Clone, Debug, Default)]
pub struct RlpTxn {
    /// Chain every signed transaction must commit to, if any.
    chain_id: Option<u64>,
    chunks: StackedList<RlpTxnChunk>,
}

impl RlpTxn {
    pub fn new(chain_id: Option<u64>) -> Self {
        Self {
            chain_id,
            chunks: StackedList::new(),
        }
    }

    pub fn chunks(&self) -> impl Iterator<Item = &RlpTxnChunk> + '_ {
        self.chunks.iter()
    }
}

impl Module for RlpTxn {
    fn kind(&self) -> ModuleKind {
        ModuleKind::RlpTxn
    }

    fn enter_scope(&mut self) {
        self.chunks.enter();
    }

    fn exit_scope(&mut self) -> Result<(), TraceError> {
        self.chunks.exit()
    }

    fn pop_scope(&mut self) -> Result<(), TraceError> {
        self.chunks.pop()
    }

    fn trace_start_tx(&mut self, tx: &Transaction) -> Result<(), TraceError> {
        let chunk = RlpTxnChunk::new(tx)?;
        if let (Some(expected), Some(actual)) = (self.chain_id, chunk.chain_id()?) {
            if expected != actual {
                return Err(TraceError::ChainIdMismatch { expected, actual });
            }
        }
        log::debug!(
            "rlptxn tx {}: type {}, {} rows",
            self.chunks.len() + 1,
            chunk.tx_type.as_u8(),
            chunk.row_count()
        );
        self.chunks.add(chunk);
        Ok(())
    }

    fn line_count(&self) -> usize {
        self.chunks.iter().map(RowCount::row_count).sum()
    }

    fn commit(&self) -> Result<ModuleTrace, TraceError> {
        let total = self.chunks.len();
        emit_operations(self.chunks.iter(), |chunk, abs_tx_num, trace| {
            Emitter::new(trace, chunk, abs_tx_num, total).run(chunk)
        })
    }
}

#[cfg(test)]
mod tests {
    use ethereum_types::{Address, H256, U256};

    use super::*;
    use crate::codec;
    use crate::witness::AccessListItem;

    fn legacy(v: u64) -> Transaction {
        Transaction {
            tx_type: 0,
            nonce: 9,
            gas_price: Some(20_000_000_000u64.into()),
            gas_limit: 21_000,
            to: Some(Address::repeat_byte(0x35)),
            value: U256::exp10(18),
            v,
            r: U256::from_dec_str(
                "18515461264373351373200002665853028612451056578545711640558177340181847433846",
            )
            .unwrap(),
            s: U256::from(0x1234_5678u64),
            ..Default::default()
        }
    }

    fn typed(tx_type: u8) -> Transaction {
        Transaction {
            tx_type,
            chain_id: Some(59_144),
            max_priority_fee_per_gas: Some(1_000.into()),
            max_fee_per_gas: Some(U256::from(7) << 40),
            payload: (0u8..=99).collect(),
            access_list: vec![
                AccessListItem {
                    address: Address::repeat_byte(0xaa),
                    storage_keys: vec![H256::repeat_byte(1), H256::zero()],
                },
                AccessListItem {
                    address: Address::repeat_byte(0xbb),
                    storage_keys: vec![],
                },
            ],
            v: 1,
            ..legacy(0)
        }
    }

    fn traced(txs: &[Transaction]) -> Result<(RlpTxn, ModuleTrace), TraceError> {
        let mut rlp_txn = RlpTxn::new(Some(59_144));
        for tx in txs {
            rlp_txn.enter_scope();
            rlp_txn.trace_start_tx(tx)?;
            rlp_txn.exit_scope()?;
        }
        let trace = rlp_txn.commit()?;
        Ok((rlp_txn, trace))
    }

    fn limbs(trace: &ModuleTrace, lx: bool) -> Vec<u8> {
        let flag = if lx { "rlptxn.LX" } else { "rlptxn.LT" };
        (0..trace.line_count())
            .filter(|row| {
                trace.cell("rlptxn.LIMB_CONSTRUCTED", *row) == Some(&[1][..])
                    && trace.cell(flag, *row) == Some(&[1][..])
            })
            .flat_map(|row| {
                let n = trace.cell("rlptxn.nBYTES", row).map_or(0, |n| n[1] as usize);
                let limb = trace.cell("rlptxn.LIMB", row).unwrap_or_default();
                limb[16..16 + n].to_vec()
            })
            .collect()
    }

    #[test]
    fn frontier_without_replay_protection() -> Result<(), TraceError> {
        let tx = legacy(27);
        let (rlp_txn, trace) = traced(&[tx.clone()])?;
        assert_eq!(trace.line_count(), rlp_txn.line_count());
        assert_eq!(limbs(&trace, false), codec::signing_preimage(&tx)?);
        assert_eq!(limbs(&trace, true), codec::signed_payload(&tx)?);
        Ok(())
    }

    #[test]
    fn edge_encodings_are_rebuilt() -> Result<(), TraceError> {
        let cases = [
            (
                "single byte payload below 0x80",
                Transaction {
                    payload: vec![0x42],
                    ..typed(2)
                },
            ),
            (
                "single byte payload from 0x80",
                Transaction {
                    payload: vec![0x80],
                    ..legacy(27)
                },
            ),
            (
                "payload of a whole limb",
                Transaction {
                    payload: (1u8..=16).collect(),
                    ..typed(1)
                },
            ),
            (
                "zero signature",
                Transaction {
                    r: U256::zero(),
                    s: U256::zero(),
                    ..legacy(27)
                },
            ),
            (
                "zero nonce",
                Transaction {
                    nonce: 0,
                    ..legacy(2 * 59_144 + 35)
                },
            ),
            (
                "largest nonce",
                Transaction {
                    nonce: u64::MAX,
                    ..typed(2)
                },
            ),
            (
                "deployment without access list",
                Transaction {
                    to: None,
                    access_list: vec![],
                    ..typed(2)
                },
            ),
        ];
        for (name, tx) in cases {
            let (rlp_txn, trace) = traced(&[tx.clone()])?;
            assert_eq!(trace.line_count(), rlp_txn.line_count(), "{name}");
            assert_eq!(limbs(&trace, false), codec::signing_preimage(&tx)?, "{name}");
            assert_eq!(limbs(&trace, true), codec::signed_payload(&tx)?, "{name}");
        }
        Ok(())
    }

    #[test]
    fn eip155_adds_the_chain_id_to_the_preimage() -> Result<(), TraceError> {
        let tx = legacy(2 * 59_144 + 36);
        let (rlp_txn, trace) = traced(&[tx.clone()])?;
        let chunk = rlp_txn.chunks().next().unwrap();
        assert_eq!(chunk.eip155_chain_id, Some(59_144));
        assert_eq!(limbs(&trace, false), codec::signing_preimage(&tx)?);
        // The signature never reaches the pre-image.
        let last = trace.line_count() - 1;
        assert_eq!(trace.cell("rlptxn.LT", last), Some(&[0][..]));
        assert_eq!(trace.cell("rlptxn.PHASE_END", last), Some(&[1][..]));
        Ok(())
    }

    #[test]
    fn typed_transactions_with_long_data_and_access_list() -> Result<(), TraceError> {
        let deployment = Transaction {
            to: None,
            value: U256::zero(),
            ..typed(1)
        };
        let txs = [deployment, typed(2)];
        let (rlp_txn, trace) = traced(&txs)?;
        assert_eq!(trace.line_count(), rlp_txn.line_count());

        let first = rlp_txn.chunks().next().unwrap().row_count();
        assert_eq!(trace.cell("rlptxn.ABS_TX_NUM", 0), Some(&[0, 0, 0, 0, 0, 0, 0, 1][..]));
        assert_eq!(trace.cell("rlptxn.ABS_TX_NUM", first), Some(&[0, 0, 0, 0, 0, 0, 0, 2][..]));
        assert_eq!(trace.cell("rlptxn.TYPE", first), Some(&[0, 2][..]));
        assert_eq!(trace.cell("rlptxn.ABS_TX_NUM_INFINY", 0), Some(&[0, 0, 0, 2][..]));

        let mut lt = codec::signing_preimage(&txs[0])?;
        lt.extend(codec::signing_preimage(&txs[1])?);
        assert_eq!(limbs(&trace, false), lt);
        Ok(())
    }

    #[test]
    fn access_list_counters_run_down() -> Result<(), TraceError> {
        let (_, trace) = traced(&[typed(2)])?;
        let rows: Vec<usize> = (0..trace.line_count())
            .filter(|row| trace.cell("rlptxn.PHASE_11", *row) == Some(&[1][..]))
            .collect();
        let last = *rows.last().unwrap();
        assert_eq!(trace.cell("rlptxn.PHASE_END", last), Some(&[1][..]));
        assert_eq!(trace.cell("rlptxn.nKEYS", last), Some(&[0, 0, 0, 0][..]));
        assert_eq!(trace.cell("rlptxn.nADDR", last), Some(&[0, 0, 0, 0][..]));
        assert_eq!(trace.cell("rlptxn.PHASE_SIZE", last), Some(&[0; 8][..]));
        assert_eq!(trace.cell("rlptxn.nKEYS", rows[0]), Some(&[0, 0, 0, 2][..]));
        Ok(())
    }

    #[test]
    fn data_gas_cost_is_spent_byte_by_byte() -> Result<(), TraceError> {
        let tx = Transaction {
            payload: vec![0, 1],
            ..legacy(27)
        };
        let (_, trace) = traced(&[tx.clone()])?;
        let data_rows: Vec<usize> = (0..trace.line_count())
            .filter(|row| trace.cell("rlptxn.PHASE_10", *row) == Some(&[1][..]))
            .collect();
        assert_eq!(data_rows.len(), 8 + 16 + 2);
        let cost = |row: usize| trace.cell("rlptxn.DATA_GAS_COST", row).map(|c| c[7]);
        assert_eq!(cost(data_rows[0]), Some(tx.data_cost() as u8));
        assert_eq!(cost(data_rows[8]), Some(20));
        assert_eq!(cost(data_rows[9]), Some(16));
        assert_eq!(cost(data_rows[10]), Some(0));
        Ok(())
    }

    #[test]
    fn foreign_chain_is_rejected() {
        let mut rlp_txn = RlpTxn::new(Some(1));
        rlp_txn.enter_scope();
        assert!(matches!(
            rlp_txn.trace_start_tx(&typed(2)),
            Err(TraceError::ChainIdMismatch {
                expected: 1,
                actual: 59_144
            })
        ));
        // Unprotected legacy transactions are valid on every chain.
        assert!(rlp_txn.trace_start_tx(&legacy(28)).is_ok());
    }

    #[test]
    fn reverted_transactions_are_dropped() -> Result<(), TraceError> {
        let mut rlp_txn = RlpTxn::default();
        rlp_txn.enter_scope();
        rlp_txn.trace_start_tx(&legacy(27))?;
        rlp_txn.pop_scope()?;
        assert_eq!(rlp_txn.line_count(), 0);
        assert_eq!(rlp_txn.commit()?.line_count(), 0);
        Ok(())
    }
}
