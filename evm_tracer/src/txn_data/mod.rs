//! Transaction metadata.
//!
//! One snapshot per transaction, emitting 8 or 9 rows plus a closing row for
//! the last transaction of each block. The rows carry the word comparisons
//! and the division bounding refunds, and the values sent to the transaction
//! and receipt RLP modules.

mod columns;
mod snapshot;

use std::collections::HashMap;

use ethereum_types::U256;
use evm_tracer_common::{address_hi_lo, u256_hi_lo};
use itertools::Itertools;

pub use self::columns::TxnDataColumn;
pub use self::snapshot::{
    Comparison, TxnSnapshot, MAX_NONCE, NB_ROWS_TYPE_0, NB_ROWS_TYPE_1, NB_ROWS_TYPE_2,
};
use crate::error::TraceError;
use crate::helpers::{Euc, Wcp};
use crate::ledger::StackedList;
use crate::module::{emit_operations, Module, ModuleKind, RowCount};
use crate::trace::{ModuleTrace, TraceWriter};
use crate::witness::{BlockHeader, Transaction, TransactionOutcome, TransactionType};

#[derive(Clone, Debug, Default)]
pub struct TxnData {
    snapshots: StackedList<TxnSnapshot>,
    /// The block being traced, with its 1-based index.
    current_block: Option<(usize, BlockHeader)>,
    blocks: usize,
    wcp: Wcp,
    euc: Euc,
}

impl TxnData {
    pub fn snapshots(&self) -> impl Iterator<Item = &TxnSnapshot> + '_ {
        self.snapshots.iter()
    }

    pub fn wcp(&self) -> &Wcp {
        &self.wcp
    }

    pub fn euc(&self) -> &Euc {
        &self.euc
    }
}

impl Module for TxnData {
    fn kind(&self) -> ModuleKind {
        ModuleKind::TxnData
    }

    fn enter_scope(&mut self) {
        self.snapshots.enter();
        self.wcp.enter_scope();
        self.euc.enter_scope();
    }

    fn exit_scope(&mut self) -> Result<(), TraceError> {
        self.snapshots.exit()?;
        self.wcp.exit_scope()?;
        self.euc.exit_scope()
    }

    fn pop_scope(&mut self) -> Result<(), TraceError> {
        self.snapshots.pop()?;
        self.wcp.pop_scope()?;
        self.euc.pop_scope()
    }

    fn trace_start_block(&mut self, header: &BlockHeader) -> Result<(), TraceError> {
        self.blocks += 1;
        self.current_block = Some((self.blocks, header.clone()));
        Ok(())
    }

    fn trace_end_block(&mut self, _header: &BlockHeader) -> Result<(), TraceError> {
        let (rel_block, _) = self.current_block.take().ok_or(TraceError::NoOpenBlock)?;
        if let Some(last) = self
            .snapshots
            .last_mut()
            .filter(|snapshot| snapshot.rel_block == rel_block)
        {
            last.close_block(&mut self.wcp)?;
        }
        Ok(())
    }

    fn trace_start_tx(&mut self, tx: &Transaction) -> Result<(), TraceError> {
        let (rel_block, header) = self.current_block.as_ref().ok_or(TraceError::NoOpenBlock)?;
        let snapshot = TxnSnapshot::new(tx, *rel_block, header)?;
        log::debug!(
            "txndata tx {} of block {}: type {}, upfront gas {}",
            self.snapshots.len() + 1,
            rel_block,
            snapshot.tx_type.as_u8(),
            snapshot.upfront_gas_cost
        );
        self.snapshots.add(snapshot);
        Ok(())
    }

    fn trace_end_tx(&mut self, outcome: &TransactionOutcome) -> Result<(), TraceError> {
        let snapshot = self
            .snapshots
            .last_mut()
            .filter(|snapshot| snapshot.outcome.is_none())
            .ok_or(TraceError::NoOpenTransaction)?;
        snapshot.finalize(outcome, &mut self.wcp, &mut self.euc)
    }

    fn line_count(&self) -> usize {
        self.snapshots.iter().map(RowCount::row_count).sum()
    }

    fn commit(&self) -> Result<ModuleTrace, TraceError> {
        let total = self.snapshots.len();
        let per_block = self.snapshots.iter().counts_by(|snapshot| snapshot.rel_block);
        let mut rel_tx_num = HashMap::<usize, usize>::new();

        let emit = |snapshot: &TxnSnapshot, abs_tx_num, trace: &mut TraceWriter<TxnDataColumn>| {
            let rel = rel_tx_num.entry(snapshot.rel_block).or_default();
            *rel += 1;
            let numbering = Numbering {
                abs_tx_num,
                abs_tx_num_max: total,
                rel_tx_num: *rel,
                rel_tx_num_max: per_block.get(&snapshot.rel_block).copied().unwrap_or(0),
            };
            trace_snapshot(snapshot, &numbering, trace)
        };
        emit_operations(self.snapshots.iter(), emit)
    }
}

struct Numbering {
    abs_tx_num: usize,
    abs_tx_num_max: usize,
    rel_tx_num: usize,
    rel_tx_num_max: usize,
}

fn trace_snapshot(
    snapshot: &TxnSnapshot,
    numbering: &Numbering,
    trace: &mut TraceWriter<TxnDataColumn>,
) -> Result<(), TraceError> {
    let tx = &snapshot.tx;
    let outcome = snapshot.outcome()?;
    let rows = snapshot.row_count();
    if snapshot.comparisons.len() != rows {
        return Err(TraceError::LineCountMismatch {
            module: "txndata",
            expected: rows,
            actual: snapshot.comparisons.len(),
        });
    }

    let (from_hi, from_lo) = address_hi_lo(&tx.from);
    let (to_hi, to_lo) = address_hi_lo(&tx.effective_recipient());
    let (coinbase_hi, coinbase_lo) = address_hi_lo(&snapshot.coinbase);
    let refund_effective = snapshot.refund_effective()?;
    let low = |value: U256| u256_hi_lo(value).1;

    for (ct, comparison) in snapshot.comparisons.iter().enumerate() {
        let (phase, outgoing_hi, outgoing_lo) = snapshot.outgoing_rlp_txn(ct)?;
        let (subphase, outgoing_receipt) = snapshot.outgoing_rlp_receipt(ct)?;
        let (arg1, arg2) = comparison.args();
        trace
            .set_u64(TxnDataColumn::AbsTxNum, numbering.abs_tx_num as u64)?
            .set_u64(TxnDataColumn::AbsTxNumMax, numbering.abs_tx_num_max as u64)?
            .set_u64(TxnDataColumn::RelBlock, snapshot.rel_block as u64)?
            .set_u64(TxnDataColumn::RelTxNum, numbering.rel_tx_num as u64)?
            .set_u64(TxnDataColumn::RelTxNumMax, numbering.rel_tx_num_max as u64)?
            .set_u64(TxnDataColumn::FromHi, from_hi.into())?
            .set_u128(TxnDataColumn::FromLo, from_lo)?
            .set_u64(TxnDataColumn::ToHi, to_hi.into())?
            .set_u128(TxnDataColumn::ToLo, to_lo)?
            .set_u64(TxnDataColumn::Nonce, tx.nonce)?
            .set_bool(TxnDataColumn::IsDep, tx.is_deployment())?
            .set_u256(TxnDataColumn::Value, tx.value)?
            .set_u256(TxnDataColumn::InitialBalance, tx.sender_balance)?
            .set_u64(TxnDataColumn::GasLimit, tx.gas_limit)?
            .set_u64(
                TxnDataColumn::GasInitiallyAvailable,
                snapshot.gas_initially_available(),
            )?
            .set_u256(TxnDataColumn::GasPrice, snapshot.effective_gas_price)?
            .set_u256(
                TxnDataColumn::PriorityFeePerGas,
                snapshot.priority_fee_per_gas(),
            )?
            .set_u256(TxnDataColumn::Basefee, snapshot.base_fee)?
            .set_u64(TxnDataColumn::CoinbaseHi, coinbase_hi.into())?
            .set_u128(TxnDataColumn::CoinbaseLo, coinbase_lo)?
            .set_u64(TxnDataColumn::BlockGasLimit, snapshot.block_gas_limit)?
            .set_u64(TxnDataColumn::CallDataSize, snapshot.call_data_size() as u64)?
            .set_u64(TxnDataColumn::InitCodeSize, snapshot.init_code_size() as u64)?
            .set_bool(
                TxnDataColumn::Type0,
                snapshot.tx_type == TransactionType::Frontier,
            )?
            .set_bool(
                TxnDataColumn::Type1,
                snapshot.tx_type == TransactionType::AccessList,
            )?
            .set_bool(
                TxnDataColumn::Type2,
                snapshot.tx_type == TransactionType::Eip1559,
            )?
            .set_bool(
                TxnDataColumn::RequiresEvmExecution,
                tx.requires_evm_execution(),
            )?
            .set_bool(TxnDataColumn::CopyTxcd, snapshot.copy_txcd())?
            .set_u64(TxnDataColumn::GasLeftover, outcome.leftover_gas)?
            .set_u64(TxnDataColumn::RefundCounter, outcome.refund_counter)?
            .set_u256(TxnDataColumn::RefundEffective, refund_effective)?
            .set_u64(TxnDataColumn::GasCumulative, outcome.gas_used)?
            .set_bool(TxnDataColumn::StatusCode, outcome.success)?
            .set_u64(
                TxnDataColumn::CodeFragmentIndex,
                tx.code_fragment_index.into(),
            )?
            .set_bool(TxnDataColumn::IsLastTxOfBlock, snapshot.is_last_of_block)?
            .set_u64(TxnDataColumn::Ct, ct as u64)?
            .set_bool(TxnDataColumn::WcpFlag, comparison.is_wcp())?
            .set_bool(TxnDataColumn::EucFlag, comparison.is_euc())?
            .set_u64(TxnDataColumn::Inst, comparison.inst().into())?
            .set_u128(TxnDataColumn::ArgOneLo, low(arg1))?
            .set_u128(TxnDataColumn::ArgTwoLo, low(arg2))?
            .set_u256(TxnDataColumn::Res, comparison.result())?
            .set_u64(TxnDataColumn::PhaseRlpTxn, phase.into())?
            .set_u256(TxnDataColumn::OutgoingHi, outgoing_hi)?
            .set_u256(TxnDataColumn::OutgoingLo, outgoing_lo)?
            .set_u64(TxnDataColumn::PhaseRlpTxnrcpt, subphase.into())?
            .set_u256(TxnDataColumn::OutgoingRlpTxnrcpt, outgoing_receipt)?;
        trace.validate_row()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use ethereum_types::Address;

    use super::*;

    fn header(number: u64) -> BlockHeader {
        BlockHeader {
            number,
            coinbase: Address::repeat_byte(0xc0),
            base_fee: 7.into(),
            gas_limit: 30_000_000,
        }
    }

    fn transfer(nonce: u64) -> Transaction {
        Transaction {
            tx_type: 0,
            nonce,
            gas_price: Some(10.into()),
            gas_limit: 21_000,
            from: Address::repeat_byte(0x01),
            to: Some(Address::repeat_byte(0x02)),
            value: 5.into(),
            v: 27,
            r: U256::one(),
            s: U256::one(),
            sender_balance: U256::from(10u64.pow(18)),
            ..Default::default()
        }
    }

    fn outcome(gas_used: u64) -> TransactionOutcome {
        TransactionOutcome {
            success: true,
            gas_used,
            leftover_gas: 0,
            refund_counter: 0,
        }
    }

    fn run_tx(txn_data: &mut TxnData, tx: &Transaction, gas_used: u64) -> Result<(), TraceError> {
        txn_data.enter_scope();
        txn_data.trace_start_tx(tx)?;
        txn_data.trace_end_tx(&outcome(gas_used))?;
        txn_data.exit_scope()
    }

    #[test]
    fn transactions_need_an_open_block() {
        let mut txn_data = TxnData::default();
        assert!(matches!(
            txn_data.trace_start_tx(&transfer(0)),
            Err(TraceError::NoOpenBlock)
        ));
        assert!(matches!(
            txn_data.trace_end_tx(&outcome(0)),
            Err(TraceError::NoOpenTransaction)
        ));
    }

    #[test]
    fn missing_comparisons_are_a_row_mismatch() -> Result<(), TraceError> {
        let mut txn_data = TxnData::default();
        txn_data.trace_start_block(&header(1))?;
        run_tx(&mut txn_data, &transfer(0), 21_000)?;
        let mut snapshot = txn_data.snapshots().next().cloned().expect("traced transaction");
        let rows = snapshot.row_count();
        snapshot.comparisons.pop();

        let numbering = Numbering {
            abs_tx_num: 1,
            abs_tx_num_max: 1,
            rel_tx_num: 1,
            rel_tx_num_max: 1,
        };
        let mut trace = TraceWriter::<TxnDataColumn>::new(rows);
        let err = trace_snapshot(&snapshot, &numbering, &mut trace).unwrap_err();
        assert!(matches!(
            err,
            TraceError::LineCountMismatch { module: "txndata", expected, actual }
                if expected == rows && actual == rows - 1
        ));
        Ok(())
    }

    #[test]
    fn two_blocks_are_numbered() -> Result<(), TraceError> {
        let mut txn_data = TxnData::default();
        txn_data.trace_start_block(&header(1))?;
        run_tx(&mut txn_data, &transfer(0), 21_000)?;
        run_tx(&mut txn_data, &transfer(1), 42_000)?;
        txn_data.trace_end_block(&header(1))?;
        txn_data.trace_start_block(&header(2))?;
        run_tx(&mut txn_data, &transfer(2), 21_000)?;
        txn_data.trace_end_block(&header(2))?;

        // 8, then 8 + 1 closing the first block, then 8 + 1.
        assert_eq!(txn_data.line_count(), 26);
        let trace = txn_data.commit()?;
        assert_eq!(trace.line_count(), 26);

        assert_eq!(trace.cell("txndata.ABS_TX_NUM", 0), Some(&[0, 1][..]));
        assert_eq!(trace.cell("txndata.ABS_TX_NUM_MAX", 0), Some(&[0, 3][..]));
        assert_eq!(trace.cell("txndata.REL_TX_NUM", 8), Some(&[0, 2][..]));
        assert_eq!(trace.cell("txndata.REL_TX_NUM_MAX", 8), Some(&[0, 2][..]));
        assert_eq!(trace.cell("txndata.IS_LAST_TX_OF_BLOCK", 7), Some(&[0][..]));
        assert_eq!(trace.cell("txndata.IS_LAST_TX_OF_BLOCK", 8), Some(&[1][..]));
        assert_eq!(trace.cell("txndata.INST", 16), Some(&[crate::helpers::LEQ][..]));
        assert_eq!(trace.cell("txndata.REL_BLOCK", 17), Some(&[0, 2][..]));
        assert_eq!(trace.cell("txndata.REL_TX_NUM_MAX", 17), Some(&[0, 1][..]));
        assert_eq!(trace.cell("txndata.EUC_FLAG", 3), Some(&[1][..]));
        assert_eq!(trace.cell("txndata.RES", 3), Some(&4_200u64.to_be_bytes()[..]));
        assert_eq!(trace.cell("txndata.PHASE_RLP_TXN", 2), Some(&[3][..]));
        assert_eq!(trace.cell("txndata.PHASE_RLP_TXNRCPT", 1), Some(&[2][..]));
        Ok(())
    }

    #[test]
    fn popped_transactions_leave_no_trace() -> Result<(), TraceError> {
        let mut txn_data = TxnData::default();
        txn_data.trace_start_block(&header(1))?;
        run_tx(&mut txn_data, &transfer(0), 21_000)?;
        txn_data.enter_scope();
        txn_data.trace_start_tx(&transfer(1))?;
        txn_data.trace_end_tx(&outcome(42_000))?;
        txn_data.pop_scope()?;
        txn_data.trace_end_block(&header(1))?;

        assert_eq!(txn_data.snapshots().count(), 1);
        assert_eq!(txn_data.line_count(), NB_ROWS_TYPE_0 + 1);
        // Five comparisons for the kept transaction, plus the block closing one.
        assert_eq!(txn_data.wcp().operations().count(), 6);
        assert_eq!(txn_data.euc().operations().count(), 1);
        Ok(())
    }

    #[test]
    fn unfinished_transactions_cannot_be_committed() -> Result<(), TraceError> {
        let mut txn_data = TxnData::default();
        txn_data.trace_start_block(&header(1))?;
        txn_data.trace_start_tx(&transfer(0))?;
        assert!(matches!(
            txn_data.commit(),
            Err(TraceError::MissingField(_))
        ));
        Ok(())
    }
}
