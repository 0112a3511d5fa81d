//! Memory expansion.
//!
//! One operation per memory-touching opcode. Each classifies the access,
//! derives the expansion and its gas cost, and emits 1, 4 or 17 rows
//! depending on its path.

mod columns;
mod operation;

use evm_tracer_common::{u256_hi_lo, u256_to_be_bytes};

pub use self::columns::MxpColumn;
pub use self::operation::{memory_cost, BillingRate, MxpOperands, MxpOperation, MxpPath, MxpType};
use crate::error::TraceError;
use crate::ledger::StackedList;
use crate::module::{emit_operations, Module, ModuleKind, RowCount};
use crate::trace::{ModuleTrace, TraceWriter};
use crate::witness::{Instruction, OpcodeEvent};

#[derive(Clone, Debug, Default)]
pub struct Mxp {
    operations: StackedList<MxpOperation>,
}

impl Mxp {
    pub fn operations(&self) -> impl Iterator<Item = &MxpOperation> + '_ {
        self.operations.iter()
    }
}

impl Module for Mxp {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Mxp
    }

    fn enter_scope(&mut self) {
        self.operations.enter();
    }

    fn exit_scope(&mut self) -> Result<(), TraceError> {
        self.operations.exit()
    }

    fn pop_scope(&mut self) -> Result<(), TraceError> {
        self.operations.pop()
    }

    fn trace_pre_opcode(&mut self, frame: &OpcodeEvent) -> Result<(), TraceError> {
        if Instruction::from_opcode(frame.opcode).is_some() {
            self.operations.add(MxpOperation::from_frame(frame)?);
        }
        Ok(())
    }

    fn line_count(&self) -> usize {
        self.operations.iter().map(RowCount::row_count).sum()
    }

    fn commit(&self) -> Result<ModuleTrace, TraceError> {
        emit_operations(self.operations.iter(), trace_operation)
    }
}

fn trace_operation(
    op: &MxpOperation,
    stamp: usize,
    trace: &mut TraceWriter<MxpColumn>,
) -> Result<(), TraceError> {
    let max_ct = op.row_count();
    let complement = 32 - max_ct;
    let [acc_1, acc_2, acc_3, acc_4, acc_a, acc_w, acc_q] =
        [op.acc_1, op.acc_2, op.acc_3, op.acc_4, op.acc_a, op.acc_w, op.acc_q]
            .map(u256_to_be_bytes);
    let mxp_type = op.instruction.mxp_type();
    let billing = op.instruction.billing();
    let (offset_1_hi, offset_1_lo) = u256_hi_lo(op.operands.offset1);
    let (offset_2_hi, offset_2_lo) = u256_hi_lo(op.operands.offset2);
    let (size_1_hi, size_1_lo) = u256_hi_lo(op.operands.size1);
    let (size_2_hi, size_2_lo) = u256_hi_lo(op.operands.size2);

    for i in 0..max_ct {
        let prefix = complement..complement + i + 1;
        let at = complement + i;
        trace
            .set_u64(MxpColumn::Stamp, stamp as u64)?
            .set_u64(MxpColumn::Cn, op.context_number.into())?
            .set_u64(MxpColumn::Ct, i as u64)?
            .set_bool(MxpColumn::Roob, op.roob)?
            .set_bool(MxpColumn::Noop, op.noop)?
            .set_bool(MxpColumn::Mxpx, op.mxpx)?
            .set_u64(MxpColumn::Inst, op.instruction.opcode().into())?
            .set_bool(MxpColumn::MxpType1, mxp_type == MxpType::Type1)?
            .set_bool(MxpColumn::MxpType2, mxp_type == MxpType::Type2)?
            .set_bool(MxpColumn::MxpType3, mxp_type == MxpType::Type3)?
            .set_bool(MxpColumn::MxpType4, mxp_type == MxpType::Type4)?
            .set_bool(MxpColumn::MxpType5, mxp_type == MxpType::Type5)?
            .set_u64(MxpColumn::Gword, billing.per_word())?
            .set_u64(MxpColumn::Gbyte, billing.per_byte())?
            .set_bool(MxpColumn::Deploys, op.deploys)?
            .set_u128(MxpColumn::Offset1Hi, offset_1_hi)?
            .set_u128(MxpColumn::Offset1Lo, offset_1_lo)?
            .set_u128(MxpColumn::Offset2Hi, offset_2_hi)?
            .set_u128(MxpColumn::Offset2Lo, offset_2_lo)?
            .set_u128(MxpColumn::Size1Hi, size_1_hi)?
            .set_u128(MxpColumn::Size1Lo, size_1_lo)?
            .set_u128(MxpColumn::Size2Hi, size_2_hi)?
            .set_u128(MxpColumn::Size2Lo, size_2_lo)?
            .set_bool(MxpColumn::Size1NonzeroNoMxpx, op.size_1_nonzero_no_mxpx())?
            .set_bool(MxpColumn::Size2NonzeroNoMxpx, op.size_2_nonzero_no_mxpx())?
            .set_bool(MxpColumn::Mtntop, op.mtntop())?
            .set_u256(MxpColumn::MaxOffset1, op.max_offset_1)?
            .set_u256(MxpColumn::MaxOffset2, op.max_offset_2)?
            .set_u256(MxpColumn::MaxOffset, op.max_offset)?
            .set_bool(MxpColumn::Comp, op.comp)?
            .set_bytes(MxpColumn::Acc1, &acc_1[prefix.clone()])?
            .set_bytes(MxpColumn::Acc2, &acc_2[prefix.clone()])?
            .set_bytes(MxpColumn::Acc3, &acc_3[prefix.clone()])?
            .set_bytes(MxpColumn::Acc4, &acc_4[prefix.clone()])?
            .set_bytes(MxpColumn::AccA, &acc_a[prefix.clone()])?
            .set_bytes(MxpColumn::AccW, &acc_w[prefix.clone()])?
            .set_bytes(MxpColumn::AccQ, &acc_q[prefix])?
            .set_u64(MxpColumn::Byte1, acc_1[at].into())?
            .set_u64(MxpColumn::Byte2, acc_2[at].into())?
            .set_u64(MxpColumn::Byte3, acc_3[at].into())?
            .set_u64(MxpColumn::Byte4, acc_4[at].into())?
            .set_u64(MxpColumn::ByteA, acc_a[at].into())?
            .set_u64(MxpColumn::ByteW, acc_w[at].into())?
            .set_u64(MxpColumn::ByteQ, acc_q[at].into())?
            .set_u64(MxpColumn::ByteQq, op.byte_qq.get(i).copied().unwrap_or(0).into())?
            .set_u64(MxpColumn::ByteR, op.byte_r.get(i).copied().unwrap_or(0).into())?
            .set_u64(MxpColumn::Words, op.words)?
            .set_u64(MxpColumn::WordsNew, op.words_new)?
            .set_u64(MxpColumn::CMem, op.c_mem)?
            .set_u64(MxpColumn::CMemNew, op.c_mem_new)?
            .set_u64(MxpColumn::QuadCost, op.quad_cost)?
            .set_u64(MxpColumn::LinCost, op.lin_cost)?
            .set_u64(MxpColumn::GasMxp, op.gas_mxp())?
            .set_bool(MxpColumn::Expands, op.expands)?;
        trace.validate_row()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use ethereum_types::U256;

    use super::*;
    use crate::trace::ColumnSet;

    fn mload(offset: u64, memory_words: u64) -> OpcodeEvent {
        OpcodeEvent {
            opcode: 0x51,
            context_number: 1,
            memory_words,
            stack: vec![offset.into()],
            ..Default::default()
        }
    }

    #[test]
    fn non_memory_opcodes_are_ignored() -> Result<(), TraceError> {
        let mut mxp = Mxp::default();
        mxp.trace_pre_opcode(&OpcodeEvent {
            opcode: 0x01,
            ..Default::default()
        })?;
        assert_eq!(mxp.line_count(), 0);
        assert_eq!(mxp.commit()?.line_count(), 0);
        Ok(())
    }

    #[test]
    fn mload_rows() -> Result<(), TraceError> {
        let mut mxp = Mxp::default();
        mxp.trace_pre_opcode(&mload(0, 0))?;
        mxp.trace_pre_opcode(&OpcodeEvent {
            opcode: 0x59,
            ..Default::default()
        })?;
        assert_eq!(mxp.line_count(), 5);

        let trace = mxp.commit()?;
        assert_eq!(trace.headers.len(), MxpColumn::DEFS.len());
        assert_eq!(trace.line_count(), 5);
        assert_eq!(trace.cell("mxp.STAMP", 3), Some(&[0, 0, 0, 1][..]));
        assert_eq!(trace.cell("mxp.STAMP", 4), Some(&[0, 0, 0, 2][..]));
        assert_eq!(trace.cell("mxp.CT", 3), Some(&[3][..]));
        assert_eq!(trace.cell("mxp.BYTE_R", 0), Some(&[224][..]));
        assert_eq!(trace.cell("mxp.BYTE_A", 3), Some(&[1][..]));
        assert_eq!(trace.cell("mxp.NOOP", 4), Some(&[1][..]));

        // ACC_A grows one byte per row: 0, 0, 0, 1.
        let acc_a = trace.column("mxp.ACC_A").unwrap_or_default();
        assert!(acc_a[..3 * 17].iter().all(|b| *b == 0));
        assert_eq!(acc_a[4 * 17 - 1], 1);

        let gas = trace.cell("mxp.GAS_MXP", 0).unwrap_or_default();
        assert_eq!(gas, &3u64.to_be_bytes()[..]);
        Ok(())
    }

    #[test]
    fn reverted_frames_are_not_traced() -> Result<(), TraceError> {
        let mut mxp = Mxp::default();
        mxp.enter_scope();
        mxp.trace_pre_opcode(&mload(0, 0))?;
        mxp.enter_scope();
        mxp.trace_pre_opcode(&mload(64, 1))?;
        mxp.pop_scope()?;
        mxp.exit_scope()?;
        assert_eq!(mxp.operations().count(), 1);
        assert_eq!(mxp.line_count(), 4);
        Ok(())
    }

    #[test]
    fn overflowing_offsets_fill_seventeen_rows() -> Result<(), TraceError> {
        let mut mxp = Mxp::default();
        mxp.trace_pre_opcode(&OpcodeEvent {
            opcode: 0x20,
            stack: vec![(U256::one() << 40) + 2, U256::one()],
            ..Default::default()
        })?;
        let trace = mxp.commit()?;
        assert_eq!(trace.line_count(), 17);
        // acc_1 = 2^40 + 2 - 2^32 spans 6 bytes, the last row carries all 17.
        let last = trace.cell("mxp.ACC_1", 16).unwrap_or_default();
        let expected = u256_to_be_bytes((U256::one() << 40) + 2 - (U256::one() << 32));
        assert_eq!(last, &expected[15..]);
        assert_eq!(trace.cell("mxp.MXPX", 0), Some(&[1][..]));
        Ok(())
    }

    fn max_below_two_pow_128() -> U256 {
        (U256::one() << 128) - 1
    }

    #[test]
    fn largest_non_roob_pair_fits_the_offset_columns() -> Result<(), TraceError> {
        let mut mxp = Mxp::default();
        mxp.trace_pre_opcode(&OpcodeEvent {
            opcode: 0x20,
            stack: vec![max_below_two_pow_128(), max_below_two_pow_128()],
            ..Default::default()
        })?;
        let op = mxp.operations().next().map(|op| (op.roob, op.mxpx));
        assert_eq!(op, Some((false, true)));

        let trace = mxp.commit()?;
        assert_eq!(trace.line_count(), 17);
        // offset + size - 1 = 2^129 - 2 takes 129 bits.
        let max = u256_to_be_bytes((U256::one() << 129) - 2);
        assert_eq!(trace.cell("mxp.MAX_OFFSET_1", 0), Some(&max[15..]));
        assert_eq!(trace.cell("mxp.MAX_OFFSET", 16), Some(&max[15..]));
        Ok(())
    }

    #[test]
    fn call_return_area_at_the_roob_bound() -> Result<(), TraceError> {
        let mut mxp = Mxp::default();
        // gas, to, value, args offset, args size, return offset, return size
        mxp.trace_pre_opcode(&OpcodeEvent {
            opcode: 0xf1,
            stack: vec![
                21_000.into(),
                U256::one(),
                U256::zero(),
                U256::zero(),
                U256::zero(),
                max_below_two_pow_128(),
                max_below_two_pow_128(),
            ],
            ..Default::default()
        })?;
        let trace = mxp.commit()?;
        assert_eq!(trace.line_count(), 17);
        assert_eq!(trace.cell("mxp.MXPX", 0), Some(&[1][..]));
        assert_eq!(trace.cell("mxp.ROOB", 0), Some(&[0][..]));
        let max = u256_to_be_bytes((U256::one() << 129) - 2);
        assert_eq!(trace.cell("mxp.MAX_OFFSET_2", 0), Some(&max[15..]));
        assert_eq!(trace.cell("mxp.MAX_OFFSET_1", 0), Some(&[0; 17][..]));
        Ok(())
    }
}
