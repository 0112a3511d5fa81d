//! Contract address derivation for `CREATE`, `CREATE2` and deployment
//! transactions.

mod chunk;
mod columns;

use ethereum_types::U256;
use evm_tracer_common::{address_hi_lo, u256_hi_lo};
use keccak_hash::keccak;

pub use self::chunk::{AddressRecipe, RlpAddrChunk, CREATE2_ROWS, CREATE_ROWS, NONCE_BYTES};
pub use self::columns::RlpAddrColumn;
use crate::codec::{self, bit_decomposition, byte_counting};
use crate::error::TraceError;
use crate::ledger::StackedList;
use crate::module::{emit_operations, Module, ModuleKind, RowCount};
use crate::trace::{ModuleTrace, TraceWriter};
use crate::witness::{OpcodeEvent, Transaction};

const CREATE: u8 = 0xf0;
const CREATE2: u8 = 0xf5;

#[derive(Clone, Debug, Default)]
pub struct RlpAddr {
    chunks: StackedList<RlpAddrChunk>,
}

impl RlpAddr {
    pub fn chunks(&self) -> impl Iterator<Item = &RlpAddrChunk> + '_ {
        self.chunks.iter()
    }

    fn add(&mut self, chunk: RlpAddrChunk) {
        log::debug!(
            "rlpaddr recipe {} from {:?}: {:?}",
            chunk.recipe.id(),
            chunk.deployer,
            chunk.address()
        );
        self.chunks.add(chunk);
    }
}

impl Module for RlpAddr {
    fn kind(&self) -> ModuleKind {
        ModuleKind::RlpAddr
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
        if tx.is_deployment() {
            self.add(RlpAddrChunk::create(tx.from, tx.nonce)?);
        }
        Ok(())
    }

    fn trace_pre_opcode(&mut self, frame: &OpcodeEvent) -> Result<(), TraceError> {
        match frame.opcode {
            CREATE => self.add(RlpAddrChunk::create(
                frame.contract_address,
                frame.contract_nonce,
            )?),
            CREATE2 => {
                let init_code = frame.read_memory(frame.stack_item(1)?, frame.stack_item(2)?)?;
                let salt = codec::word_to_h256(frame.stack_item(3)?);
                self.add(RlpAddrChunk::create2(
                    frame.contract_address,
                    salt,
                    keccak(init_code),
                )?)
            }
            _ => {}
        }
        Ok(())
    }

    fn line_count(&self) -> usize {
        self.chunks.iter().map(RowCount::row_count).sum()
    }

    fn commit(&self) -> Result<ModuleTrace, TraceError> {
        emit_operations(self.chunks.iter(), trace_chunk)
    }
}

fn trace_chunk(
    chunk: &RlpAddrChunk,
    stamp: usize,
    trace: &mut TraceWriter<RlpAddrColumn>,
) -> Result<(), TraceError> {
    let (dep_hi, dep_lo) = address_hi_lo(&chunk.deployer);
    let (addr_hi, addr_lo) = address_hi_lo(&chunk.address());
    let (salt, kec) = match chunk.recipe {
        AddressRecipe::Create { .. } => (U256::zero(), U256::zero()),
        AddressRecipe::Create2 {
            salt,
            init_code_hash,
        } => (
            U256::from_big_endian(salt.as_bytes()),
            U256::from_big_endian(init_code_hash.as_bytes()),
        ),
    };
    let (salt_hi, salt_lo) = u256_hi_lo(salt);
    let (kec_hi, kec_lo) = u256_hi_lo(kec);
    let (raw_addr_hi, _) = u256_hi_lo(U256::from_big_endian(chunk.hash.as_bytes()));
    let recipe = chunk.recipe.id();
    let rows = chunk.row_count();
    // Limbs take the last rows of the chunk.
    let first_limb = rows - chunk.limbs.len();

    let nonce = chunk.padded_nonce();
    let (counting, bits) = match chunk.recipe {
        AddressRecipe::Create { .. } => (
            byte_counting(
                evm_tracer_common::integer_bytes(chunk.nonce().into()).len(),
                NONCE_BYTES,
            ),
            bit_decomposition(nonce[NONCE_BYTES - 1], NONCE_BYTES),
        ),
        AddressRecipe::Create2 { .. } => (Vec::new(), Vec::new()),
    };

    for ct in 0..rows {
        trace
            .set_u64(RlpAddrColumn::Stamp, stamp as u64)?
            .set_u64(RlpAddrColumn::Counter, ct as u64)?
            .set_u64(RlpAddrColumn::Recipe, recipe.into())?
            .set_bool(RlpAddrColumn::Recipe1, recipe == 1)?
            .set_bool(RlpAddrColumn::Recipe2, recipe == 2)?
            .set_u64(RlpAddrColumn::DepAddrHi, dep_hi.into())?
            .set_u128(RlpAddrColumn::DepAddrLo, dep_lo)?
            .set_u64(RlpAddrColumn::Nonce, chunk.nonce())?
            .set_u128(RlpAddrColumn::SaltHi, salt_hi)?
            .set_u128(RlpAddrColumn::SaltLo, salt_lo)?
            .set_u128(RlpAddrColumn::KecHi, kec_hi)?
            .set_u128(RlpAddrColumn::KecLo, kec_lo)?
            .set_u128(RlpAddrColumn::RawAddrHi, raw_addr_hi)?
            .set_u64(RlpAddrColumn::AddrHi, addr_hi.into())?
            .set_u128(RlpAddrColumn::AddrLo, addr_lo)?
            .set_bool(RlpAddrColumn::SelectorKeccakRes, ct == 0)?
            .set_bool(RlpAddrColumn::TinyNonZeroNonce, chunk.tiny_non_zero_nonce())?;

        match (counting.get(ct), bits.get(ct)) {
            (Some(count), Some(bit)) => trace
                .set_bytes(RlpAddrColumn::Acc, &nonce[..ct + 1])?
                .set_u64(RlpAddrColumn::Byte1, nonce[ct].into())?
                .set_u64(RlpAddrColumn::AccBytesize, count.acc_bytesize.into())?
                .set_u256(RlpAddrColumn::Power, count.power)?
                .set_bool(RlpAddrColumn::Bit1, bit.bit)?
                .set_u64(RlpAddrColumn::BitAcc, bit.bit_acc.into())?,
            _ => trace
                .set_u64(RlpAddrColumn::Acc, 0)?
                .set_u64(RlpAddrColumn::Byte1, 0)?
                .set_u64(RlpAddrColumn::AccBytesize, 0)?
                .set_u64(RlpAddrColumn::Power, 0)?
                .set_bool(RlpAddrColumn::Bit1, false)?
                .set_u64(RlpAddrColumn::BitAcc, 0)?,
        };

        match ct.checked_sub(first_limb).and_then(|i| chunk.limbs.get(i).map(|l| (i, l))) {
            Some((index, limb)) => trace
                .set_bool(RlpAddrColumn::Lc, true)?
                .set_u64(RlpAddrColumn::Index, index as u64)?
                .set_limb(RlpAddrColumn::Limb, limb)?
                .set_u64(RlpAddrColumn::NBytes, limb.len() as u64)?,
            None => trace
                .set_bool(RlpAddrColumn::Lc, false)?
                .set_u64(RlpAddrColumn::Index, 0)?
                .set_u64(RlpAddrColumn::Limb, 0)?
                .set_u64(RlpAddrColumn::NBytes, 0)?,
        };
        trace.validate_row()?;
    }
    Ok(())
}
