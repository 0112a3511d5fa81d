use ethereum_types::{Address, H256, U256};
use evm_tracer_common::{
    gas::{G_TX_DATA_NONZERO, G_TX_DATA_ZERO},
    integer_bytes, left_pad, minimal_bytes, right_pad, u256_to_be_bytes,
};

use super::chunk::{Phase, RlpTxnChunk};
use super::columns::RlpTxnColumn;
use crate::codec::{
    self, bit_decomposition, byte_counting, inner_rlp_size, outer_rlp_size, LLARGE,
    RLP_PREFIX_INT_LONG, RLP_PREFIX_INT_SHORT, RLP_PREFIX_LIST_LONG, RLP_PREFIX_LIST_SHORT,
};
use crate::error::TraceError;
use crate::trace::TraceWriter;
use crate::witness::TransactionType;

/// `0x80 + 20`, the prefix of an address.
const ADDRESS_PREFIX: u8 = RLP_PREFIX_INT_SHORT + 20;

/// `0x80 + 32`, the prefix of a storage key.
const STORAGE_KEY_PREFIX: u8 = RLP_PREFIX_INT_SHORT + 32;

/// Values of one row. Every row is built fresh from its routine's base row.
#[derive(Clone, Debug, Default)]
struct Row {
    phase: Phase,
    n_step: usize,
    counter: usize,
    /// Whether the limb belongs to the signing pre-image.
    lt: bool,
    /// Whether the limb belongs to the signed payload.
    lx: bool,
    limb_constructed: bool,
    limb: Vec<u8>,
    n_bytes: usize,
    is_prefix: bool,
    depth1: bool,
    depth2: bool,
    phase_end: bool,
    lc_correction: bool,
    acc1: Vec<u8>,
    acc2: Vec<u8>,
    byte1: u8,
    byte2: u8,
    acc_bytesize: u8,
    power: U256,
    bit: bool,
    bit_acc: u8,
    input1: Vec<u8>,
    input2: Vec<u8>,
}

impl Row {
    fn new(phase: Phase, n_step: usize, lt: bool, lx: bool) -> Self {
        Self {
            phase,
            n_step,
            lt,
            lx,
            ..Default::default()
        }
    }

    /// The same row, carrying the first `n_bytes` bytes of `limb`.
    fn with_limb(self, limb: Vec<u8>, n_bytes: usize) -> Self {
        Self {
            limb_constructed: true,
            limb,
            n_bytes,
            ..self
        }
    }
}

fn decrement(counter: &mut usize, by: usize, name: &'static str) -> Result<(), TraceError> {
    *counter = counter
        .checked_sub(by)
        .ok_or(TraceError::InconsistentByteSize { counter: name })?;
    Ok(())
}

fn word(bytes: &[u8]) -> U256 {
    U256::from_big_endian(bytes)
}

/// Emits the rows of one transaction, rebuilding both encodings as it goes.
pub(super) struct Emitter<'t> {
    trace: &'t mut TraceWriter<RlpTxnColumn>,
    abs_tx_num: usize,
    abs_tx_num_infiny: usize,
    tx_type: u8,
    requires_evm_execution: bool,
    code_fragment_index: u32,
    data_hi: U256,
    data_lo: U256,
    addr_hi: U256,
    addr_lo: U256,
    rlp_lt_bytesize: usize,
    rlp_lx_bytesize: usize,
    index_lt: usize,
    index_lx: usize,
    index_data: usize,
    phase_size: usize,
    data_gas_cost: u64,
    access_tuple_bytesize: usize,
    n_addr: usize,
    n_keys: usize,
    n_keys_per_addr: usize,
    lt_bytes: Vec<u8>,
    lx_bytes: Vec<u8>,
}

impl<'t> Emitter<'t> {
    pub(super) fn new(
        trace: &'t mut TraceWriter<RlpTxnColumn>,
        chunk: &RlpTxnChunk,
        abs_tx_num: usize,
        abs_tx_num_infiny: usize,
    ) -> Self {
        Self {
            trace,
            abs_tx_num,
            abs_tx_num_infiny,
            tx_type: chunk.tx_type.as_u8(),
            requires_evm_execution: chunk.requires_evm_execution,
            code_fragment_index: chunk.tx.code_fragment_index,
            data_hi: U256::zero(),
            data_lo: U256::zero(),
            addr_hi: U256::zero(),
            addr_lo: U256::zero(),
            rlp_lt_bytesize: 0,
            rlp_lx_bytesize: 0,
            index_lt: 0,
            index_lx: 0,
            index_data: 0,
            phase_size: 0,
            data_gas_cost: 0,
            access_tuple_bytesize: 0,
            n_addr: 0,
            n_keys: 0,
            n_keys_per_addr: 0,
            lt_bytes: Vec::new(),
            lx_bytes: Vec::new(),
        }
    }

    /// Traces every phase of `chunk` and checks the rebuilt encodings.
    pub(super) fn run(mut self, chunk: &RlpTxnChunk) -> Result<(), TraceError> {
        let tx = &chunk.tx;
        let preimage = codec::signing_preimage(tx)?;
        let payload = codec::signed_payload(tx)?;
        let type_bytes = usize::from(chunk.tx_type != TransactionType::Frontier);
        self.rlp_lt_bytesize = inner_rlp_size(preimage.get(type_bytes..).unwrap_or_default())?;
        self.rlp_lx_bytesize = inner_rlp_size(payload.get(type_bytes..).unwrap_or_default())?;

        for (phase, rows) in &chunk.phase_rows {
            let before = self.trace.size()?;
            self.trace_phase(chunk, *phase)?;
            let written = self.trace.size()? - before;
            if written != *rows {
                log::debug!("rlptxn {}: phase {} wrote {written} rows", self.abs_tx_num, phase.name());
                return Err(TraceError::LineCountMismatch {
                    module: "rlptxn",
                    expected: *rows,
                    actual: written,
                });
            }
        }

        if self.lt_bytes != preimage {
            return Err(TraceError::RlpMismatch {
                which: "signing pre-image",
                expected: hex::encode(&preimage),
                actual: hex::encode(&self.lt_bytes),
            });
        }
        if self.lx_bytes != payload {
            return Err(TraceError::RlpMismatch {
                which: "signed transaction",
                expected: hex::encode(&payload),
                actual: hex::encode(&self.lx_bytes),
            });
        }
        if self.rlp_lt_bytesize != 0 {
            return Err(TraceError::InconsistentByteSize {
                counter: "RLP_LT_BYTESIZE",
            });
        }
        if self.rlp_lx_bytesize != 0 {
            return Err(TraceError::InconsistentByteSize {
                counter: "RLP_LX_BYTESIZE",
            });
        }
        Ok(())
    }

    fn trace_phase(&mut self, chunk: &RlpTxnChunk, phase: Phase) -> Result<(), TraceError> {
        let tx = &chunk.tx;
        match phase {
            Phase::Prefix => {
                self.data_lo = chunk.tx_type.as_u8().into();
                self.global_prefix(chunk.tx_type != TransactionType::Frontier)
            }
            Phase::ChainId => self.integer(phase, tx.typed_chain_id()?.into(), 8),
            Phase::Nonce => {
                self.data_lo = tx.nonce.into();
                self.integer(phase, tx.nonce.into(), 8)
            }
            Phase::GasPrice => {
                self.data_lo = tx.gas_price()?;
                self.integer(phase, tx.gas_price()?, 8)
            }
            Phase::MaxPriorityFee => self.integer(phase, tx.max_priority_fee()?, 8),
            Phase::MaxFee => {
                self.data_hi = tx.max_priority_fee()?;
                self.data_lo = tx.max_fee()?;
                self.integer(phase, tx.max_fee()?, 8)
            }
            Phase::GasLimit => {
                self.data_lo = tx.gas_limit.into();
                self.integer(phase, tx.gas_limit.into(), 8)
            }
            Phase::To => match tx.to {
                Some(to) => {
                    self.data_hi = word(&to.as_bytes()[..4]);
                    self.data_lo = word(&to.as_bytes()[4..]);
                    self.address(phase, &to)
                }
                None => self.zero_int(phase, true, true, true),
            },
            Phase::Value => {
                self.data_hi = u8::from(tx.is_deployment()).into();
                self.data_lo = tx.value;
                self.integer(phase, tx.value, LLARGE)
            }
            Phase::Data => self.data(&tx.payload, tx.data_cost()),
            Phase::AccessList => self.access_list(chunk),
            Phase::Beta => self.beta(tx.v, chunk.eip155_chain_id),
            Phase::Y => {
                let limb = codec::rlp_integer(tx.v.into());
                let n_bytes = limb.len();
                let row = Row {
                    input1: integer_bytes(tx.v.into()),
                    phase_end: true,
                    ..Row::new(phase, 1, false, true)
                };
                self.emit(row.with_limb(limb, n_bytes))
            }
            Phase::R => self.word_integer(phase, tx.r),
            Phase::S => self.word_integer(phase, tx.s),
        }
    }

    /// The type byte, then the prefixes of both lists.
    fn global_prefix(&mut self, typed: bool) -> Result<(), TraceError> {
        let base = Row::new(Phase::Prefix, 1, true, true);
        let row = match typed {
            true => base.with_limb(vec![self.tx_type], 1),
            false => Row {
                lc_correction: true,
                ..base
            },
        };
        self.emit(row)?;

        let (lt_size, lx_size) = (self.rlp_lt_bytesize, self.rlp_lx_bytesize);
        self.byte_string(Phase::Prefix, lt_size, true, (true, false), false, (false, false), false)?;
        self.byte_string(Phase::Prefix, lx_size, true, (false, true), false, (false, false), true)
    }

    fn integer(&mut self, phase: Phase, input: U256, n_step: usize) -> Result<(), TraceError> {
        if input.is_zero() {
            self.zero_int(phase, true, true, true)
        } else {
            self.int(phase, &minimal_bytes(input), n_step, (true, true), false, true, false)
        }
    }

    /// The prefix announcing a `length` bytes long string or list, over 8
    /// rows.
    #[allow(clippy::too_many_arguments)]
    fn byte_string(
        &mut self,
        phase: Phase,
        length: usize,
        is_list: bool,
        (lt, lx): (bool, bool),
        is_prefix: bool,
        (depth1, depth2): (bool, bool),
        end_phase: bool,
    ) -> Result<(), TraceError> {
        let length_bytes = integer_bytes(length.into());
        let length_size = length_bytes.len();
        let counting = byte_counting(length_size, 8);

        let base = Row {
            input1: length_bytes.clone(),
            is_prefix,
            depth1,
            depth2,
            ..Row::new(phase, 8, lt, lx)
        };

        let shifted = left_pad(&length_bytes, 8);
        let acc2_last = if length >= 56 { length - 56 } else { 55 - length };
        let acc2_shifted = left_pad(&integer_bytes(acc2_last.into()), 8);
        let (short, long) = match is_list {
            true => (RLP_PREFIX_LIST_SHORT, RLP_PREFIX_LIST_LONG),
            false => (RLP_PREFIX_INT_SHORT, RLP_PREFIX_INT_LONG),
        };

        for (ct, count) in counting.iter().enumerate() {
            let row = Row {
                counter: ct,
                acc_bytesize: count.acc_bytesize,
                power: count.power,
                byte1: shifted[ct],
                acc1: shifted[..=ct].to_vec(),
                byte2: acc2_shifted[ct],
                acc2: acc2_shifted[..=ct].to_vec(),
                ..base.clone()
            };
            let row = match (length >= 56, ct) {
                (true, 6) => row.with_limb(vec![long + length_size as u8], 1),
                (true, 7) => Row {
                    bit: true,
                    bit_acc: 1,
                    phase_end: end_phase,
                    ..row.with_limb(length_bytes.clone(), length_size)
                },
                (false, 7) => Row {
                    phase_end: end_phase,
                    ..row.with_limb(vec![short + length as u8], 1)
                },
                _ => row,
            };
            self.emit(row)?;
        }
        Ok(())
    }

    /// An integer of at most `n_step` bytes, given by its minimal big-endian
    /// bytes. Zero is encoded as the empty string.
    ///
    /// With `only_prefix`, the last row carries no limb: the integer itself is
    /// traced by the rows that follow.
    #[allow(clippy::too_many_arguments)]
    fn int(
        &mut self,
        phase: Phase,
        input: &[u8],
        n_step: usize,
        (lt, lx): (bool, bool),
        is_prefix: bool,
        end_phase: bool,
        only_prefix: bool,
    ) -> Result<(), TraceError> {
        if input.len() > n_step {
            return Err(TraceError::ValueTooLarge {
                field: phase.name(),
                max_bytes: n_step,
            });
        }
        let base = Row {
            is_prefix,
            input1: input.to_vec(),
            ..Row::new(phase, n_step, lt, lx)
        };

        let counting = byte_counting(input.len(), n_step);
        let padded = left_pad(input, n_step);
        let bits = bit_decomposition(padded[n_step - 1], n_step);
        let needs_prefix = input.len() > 1 || input.first().is_some_and(|b| *b >= 0x80);
        let value_limb = match input.is_empty() {
            true => vec![RLP_PREFIX_INT_SHORT],
            false => input.to_vec(),
        };

        for ct in 0..n_step {
            let row = Row {
                counter: ct,
                byte1: padded[ct],
                acc1: padded[..=ct].to_vec(),
                power: counting[ct].power,
                acc_bytesize: counting[ct].acc_bytesize,
                bit: bits[ct].bit,
                bit_acc: bits[ct].bit_acc,
                ..base.clone()
            };
            let row = match ct + 1 == n_step {
                true if only_prefix => Row {
                    lc_correction: true,
                    ..row
                },
                true => Row {
                    phase_end: end_phase,
                    ..row.with_limb(value_limb.clone(), value_limb.len())
                },
                false if needs_prefix && ct + 2 == n_step => {
                    row.with_limb(vec![RLP_PREFIX_INT_SHORT + input.len() as u8], 1)
                }
                false => row,
            };
            self.emit(row)?;
        }
        Ok(())
    }

    /// A signature component, up to 32 bytes long, over 16 rows.
    fn word_integer(&mut self, phase: Phase, input: U256) -> Result<(), TraceError> {
        if input.is_zero() {
            return self.zero_int(phase, false, true, true);
        }
        let bytes = minimal_bytes(input);
        let len = bytes.len();
        let be = u256_to_be_bytes(input);
        let (hi, lo) = be.split_at(LLARGE);

        let base = Row {
            input1: hi.to_vec(),
            input2: lo.to_vec(),
            ..Row::new(phase, LLARGE, false, true)
        };

        if len <= LLARGE {
            let counting = byte_counting(len, LLARGE);
            let bits = bit_decomposition(bytes.last().copied().unwrap_or(0), LLARGE);
            for ct in 0..LLARGE {
                let row = Row {
                    counter: ct,
                    byte2: lo[ct],
                    acc2: lo[..=ct].to_vec(),
                    acc_bytesize: counting[ct].acc_bytesize,
                    power: counting[ct].power,
                    bit: bits[ct].bit,
                    bit_acc: bits[ct].bit_acc,
                    ..base.clone()
                };
                let row = match ct {
                    _ if ct == LLARGE - 1 => Row {
                        phase_end: true,
                        ..row.with_limb(lo[LLARGE - len..].to_vec(), len)
                    },
                    _ if ct == LLARGE - 2 && input >= U256::from(RLP_PREFIX_INT_SHORT) => {
                        row.with_limb(vec![RLP_PREFIX_INT_SHORT + len as u8], 1)
                    }
                    _ => row,
                };
                self.emit(row)?;
            }
        } else {
            let len_hi = len - LLARGE;
            let counting = byte_counting(len_hi, LLARGE);
            for ct in 0..LLARGE {
                let row = Row {
                    counter: ct,
                    byte1: hi[ct],
                    acc1: hi[..=ct].to_vec(),
                    byte2: lo[ct],
                    acc2: lo[..=ct].to_vec(),
                    acc_bytesize: counting[ct].acc_bytesize,
                    power: counting[ct].power,
                    ..base.clone()
                };
                let row = match ct {
                    13 => row.with_limb(vec![RLP_PREFIX_INT_SHORT + len as u8], 1),
                    14 => row.with_limb(hi[LLARGE - len_hi..].to_vec(), len_hi),
                    15 => Row {
                        phase_end: true,
                        ..row.with_limb(lo.to_vec(), LLARGE)
                    },
                    _ => row,
                };
                self.emit(row)?;
            }
        }
        Ok(())
    }

    fn address(&mut self, phase: Phase, address: &Address) -> Result<(), TraceError> {
        let bytes = address.as_bytes();
        let hi = left_pad(&bytes[..4], LLARGE);
        let lo = &bytes[4..];
        let base = Row {
            input1: hi.clone(),
            input2: lo.to_vec(),
            depth1: phase == Phase::AccessList,
            ..Row::new(phase, LLARGE, true, true)
        };

        for ct in 0..LLARGE {
            let row = Row {
                counter: ct,
                byte1: hi[ct],
                acc1: hi[..=ct].to_vec(),
                byte2: lo[ct],
                acc2: lo[..=ct].to_vec(),
                ..base.clone()
            };
            let row = match ct {
                13 => row.with_limb(vec![ADDRESS_PREFIX], 1),
                14 => row.with_limb(bytes[..4].to_vec(), 4),
                15 => Row {
                    phase_end: phase == Phase::To,
                    ..row.with_limb(lo.to_vec(), LLARGE)
                },
                _ => row,
            };
            self.emit(row)?;
        }
        Ok(())
    }

    fn storage_key(&mut self, key: &H256, end_phase: bool) -> Result<(), TraceError> {
        let (hi, lo) = key.as_bytes().split_at(LLARGE);
        let base = Row {
            depth1: true,
            depth2: true,
            input1: hi.to_vec(),
            input2: lo.to_vec(),
            ..Row::new(Phase::AccessList, LLARGE, true, true)
        };

        for ct in 0..LLARGE {
            let row = Row {
                counter: ct,
                byte1: hi[ct],
                acc1: hi[..=ct].to_vec(),
                byte2: lo[ct],
                acc2: lo[..=ct].to_vec(),
                ..base.clone()
            };
            let row = match ct {
                13 => row.with_limb(vec![STORAGE_KEY_PREFIX], 1),
                14 => row.with_limb(hi.to_vec(), LLARGE),
                15 => Row {
                    phase_end: end_phase,
                    ..row.with_limb(lo.to_vec(), LLARGE)
                },
                _ => row,
            };
            self.emit(row)?;
        }
        Ok(())
    }

    fn zero_int(&mut self, phase: Phase, lt: bool, lx: bool, phase_end: bool) -> Result<(), TraceError> {
        let row = Row {
            is_prefix: true,
            phase_end,
            ..Row::new(phase, 1, lt, lx)
        };
        self.emit(row.with_limb(vec![RLP_PREFIX_INT_SHORT], 1))
    }

    fn void_list(
        &mut self,
        (depth1, depth2): (bool, bool),
        phase_end: bool,
    ) -> Result<(), TraceError> {
        let row = Row {
            is_prefix: true,
            depth1,
            depth2,
            phase_end,
            ..Row::new(Phase::AccessList, 1, true, true)
        };
        self.emit(row.with_limb(vec![RLP_PREFIX_LIST_SHORT], 1))
    }

    fn data(&mut self, payload: &[u8], data_cost: u64) -> Result<(), TraceError> {
        let phase = Phase::Data;
        if payload.is_empty() {
            self.zero_int(phase, true, true, false)?;
            self.emit(Row {
                lc_correction: true,
                phase_end: true,
                ..Row::new(phase, 1, true, true)
            })?;
            self.index_data = 0;
            return Ok(());
        }

        self.phase_size = payload.len();
        self.data_gas_cost = data_cost;
        self.data_hi = data_cost.into();
        self.data_lo = payload.len().into();

        if payload.len() == 1 {
            self.int(phase, payload, 8, (true, true), true, false, true)?;
        } else {
            self.byte_string(phase, payload.len(), false, (true, true), true, (false, false), false)?;
        }

        let padded = right_pad(payload, payload.len().div_ceil(LLARGE) * LLARGE);
        for input in padded.chunks(LLARGE) {
            let base = Row {
                input1: input.to_vec(),
                ..Row::new(phase, LLARGE, true, true)
            };
            let mut acc_bytesize = 0u8;
            for ct in 0..LLARGE {
                if self.phase_size != 0 {
                    acc_bytesize += 1;
                }
                let row = Row {
                    counter: ct,
                    byte1: input[ct],
                    acc1: input[..=ct].to_vec(),
                    acc_bytesize,
                    ..base.clone()
                };
                let row = match ct == LLARGE - 1 {
                    true => row.with_limb(input.to_vec(), acc_bytesize.into()),
                    false => row,
                };
                self.emit(row)?;
            }
        }

        let closing = Row {
            lc_correction: true,
            ..Row::new(phase, 2, true, true)
        };
        self.emit(closing.clone())?;
        self.emit(Row {
            counter: 1,
            phase_end: true,
            ..closing
        })?;
        self.index_data = 0;
        Ok(())
    }

    fn access_list(&mut self, chunk: &RlpTxnChunk) -> Result<(), TraceError> {
        let phase = Phase::AccessList;
        let access_list = &chunk.tx.access_list;
        if access_list.is_empty() {
            return self.void_list((false, false), true);
        }

        let tuple_sizes: Vec<usize> = access_list
            .iter()
            .map(|item| 21 + outer_rlp_size(33 * item.storage_keys.len()))
            .collect();
        let (addresses, keys) = chunk.tx.access_list_counts();
        self.n_addr = addresses;
        self.n_keys = keys;
        self.data_lo = addresses.into();
        self.data_hi = keys.into();
        self.phase_size = tuple_sizes.iter().copied().map(outer_rlp_size).sum();

        let phase_size = self.phase_size;
        self.byte_string(phase, phase_size, true, (true, true), true, (false, false), false)?;

        for (item, tuple_size) in access_list.iter().zip(tuple_sizes) {
            self.n_addr -= 1;
            self.n_keys_per_addr = item.storage_keys.len();
            self.addr_hi = word(&item.address.as_bytes()[..4]);
            self.addr_lo = word(&item.address.as_bytes()[4..]);
            self.access_tuple_bytesize = tuple_size;

            self.byte_string(phase, tuple_size, true, (true, true), true, (true, false), false)?;
            self.address(phase, &item.address)?;

            if item.storage_keys.is_empty() {
                let end = self.n_keys == 0 && self.n_addr == 0;
                self.void_list((true, true), end)?;
            } else {
                let size = 33 * item.storage_keys.len();
                self.byte_string(phase, size, true, (true, true), true, (true, true), false)?;
                for key in &item.storage_keys {
                    self.n_keys -= 1;
                    self.n_keys_per_addr -= 1;
                    let end = self.n_keys == 0 && self.n_addr == 0;
                    self.storage_key(key, end)?;
                }
            }
            self.addr_hi = U256::zero();
            self.addr_lo = U256::zero();
        }
        Ok(())
    }

    /// `V`, then for EIP-155 transactions the `(chain_id, 0, 0)` tail of the
    /// signing pre-image.
    fn beta(&mut self, v: u64, chain_id: Option<u64>) -> Result<(), TraceError> {
        let phase = Phase::Beta;
        let v_bytes = minimal_bytes(v.into());
        self.int(phase, &v_bytes, 8, (false, true), false, chain_id.is_none(), false)?;

        if let Some(chain_id) = chain_id {
            let beta = minimal_bytes(chain_id.into());
            self.int(phase, &beta, 8, (true, false), true, false, false)?;
            let tail = Row {
                phase_end: true,
                ..Row::new(phase, 1, true, false)
            };
            self.emit(tail.with_limb(vec![RLP_PREFIX_INT_SHORT, RLP_PREFIX_INT_SHORT], 2))?;
        }
        Ok(())
    }

    fn emit(&mut self, row: Row) -> Result<(), TraceError> {
        if row.phase != Phase::Prefix && row.limb_constructed {
            if row.lt {
                decrement(&mut self.rlp_lt_bytesize, row.n_bytes, "RLP_LT_BYTESIZE")?;
            }
            if row.lx {
                decrement(&mut self.rlp_lx_bytesize, row.n_bytes, "RLP_LX_BYTESIZE")?;
            }
        }
        if row.phase == Phase::AccessList && row.depth1 && row.limb_constructed {
            decrement(&mut self.phase_size, row.n_bytes, "PHASE_SIZE")?;
            if !(row.is_prefix && !row.depth2) {
                decrement(
                    &mut self.access_tuple_bytesize,
                    row.n_bytes,
                    "ACCESS_TUPLE_BYTESIZE",
                )?;
            }
        }

        let limb = row
            .limb
            .get(..row.n_bytes)
            .ok_or(TraceError::InconsistentByteSize { counter: "nBYTES" })?;

        self.trace
            .set_u64(RlpTxnColumn::AbsTxNum, self.abs_tx_num as u64)?
            .set_u64(RlpTxnColumn::AbsTxNumInfiny, self.abs_tx_num_infiny as u64)?
            .set_bytes(RlpTxnColumn::Acc1, &row.acc1)?
            .set_bytes(RlpTxnColumn::Acc2, &row.acc2)?
            .set_u64(RlpTxnColumn::AccBytesize, row.acc_bytesize.into())?
            .set_u64(
                RlpTxnColumn::AccessTupleBytesize,
                self.access_tuple_bytesize as u64,
            )?
            .set_u256(RlpTxnColumn::AddrHi, self.addr_hi)?
            .set_u256(RlpTxnColumn::AddrLo, self.addr_lo)?
            .set_bool(RlpTxnColumn::Bit, row.bit)?
            .set_u64(RlpTxnColumn::BitAcc, row.bit_acc.into())?
            .set_u64(RlpTxnColumn::Byte1, row.byte1.into())?
            .set_u64(RlpTxnColumn::Byte2, row.byte2.into())?
            .set_u64(
                RlpTxnColumn::CodeFragmentIndex,
                self.code_fragment_index.into(),
            )?
            .set_u64(RlpTxnColumn::Counter, row.counter as u64)?
            .set_u256(RlpTxnColumn::DataHi, self.data_hi)?
            .set_u256(RlpTxnColumn::DataLo, self.data_lo)?
            .set_u64(RlpTxnColumn::DataGasCost, self.data_gas_cost)?
            .set_bool(RlpTxnColumn::Depth1, row.depth1)?
            .set_bool(RlpTxnColumn::Depth2, row.depth2)?
            .set_bool(RlpTxnColumn::Done, row.counter + 1 == row.n_step)?
            .set_bool(RlpTxnColumn::PhaseEnd, row.phase_end)?
            .set_u64(RlpTxnColumn::IndexData, self.index_data as u64)?
            .set_u64(RlpTxnColumn::IndexLt, self.index_lt as u64)?
            .set_u64(RlpTxnColumn::IndexLx, self.index_lx as u64)?
            .set_bytes(RlpTxnColumn::Input1, &row.input1)?
            .set_bytes(RlpTxnColumn::Input2, &row.input2)?
            .set_bool(RlpTxnColumn::LcCorrection, row.lc_correction)?
            .set_bool(RlpTxnColumn::IsPrefix, row.is_prefix)?
            // Limbs are left-aligned on 16 bytes.
            .set_bytes(RlpTxnColumn::Limb, &right_pad(&row.limb, LLARGE))?
            .set_bool(RlpTxnColumn::LimbConstructed, row.limb_constructed)?
            .set_bool(RlpTxnColumn::Lt, row.lt)?
            .set_bool(RlpTxnColumn::Lx, row.lx)?
            .set_u64(RlpTxnColumn::NBytes, row.n_bytes as u64)?
            .set_u64(RlpTxnColumn::NAddr, self.n_addr as u64)?
            .set_u64(RlpTxnColumn::NKeys, self.n_keys as u64)?
            .set_u64(RlpTxnColumn::NKeysPerAddr, self.n_keys_per_addr as u64)?
            .set_u64(RlpTxnColumn::NStep, row.n_step as u64)?
            .set_u64(RlpTxnColumn::PhaseId, row.phase.id().into())?
            .set_u64(RlpTxnColumn::PhaseSize, self.phase_size as u64)?
            .set_u256(RlpTxnColumn::Power, row.power)?
            .set_bool(
                RlpTxnColumn::RequiresEvmExecution,
                self.requires_evm_execution,
            )?
            .set_u64(RlpTxnColumn::RlpLtBytesize, self.rlp_lt_bytesize as u64)?
            .set_u64(RlpTxnColumn::RlpLxBytesize, self.rlp_lx_bytesize as u64)?
            .set_u64(RlpTxnColumn::Type, self.tx_type.into())?;
        for (i, column) in RlpTxnColumn::PHASES.iter().enumerate() {
            self.trace
                .set_bool(*column, usize::from(row.phase.id()) == i + 1)?;
        }
        self.trace.validate_row()?;

        if row.limb_constructed && row.lt {
            self.index_lt += 1;
            self.lt_bytes.extend_from_slice(limb);
        }
        if row.limb_constructed && row.lx {
            self.index_lx += 1;
            self.lx_bytes.extend_from_slice(limb);
        }
        if row.phase == Phase::Data && !row.is_prefix {
            if row.limb_constructed || row.lc_correction {
                self.index_data += 1;
            }
            if self.phase_size != 0 {
                self.phase_size -= 1;
                let cost = match row.byte1 {
                    0 => G_TX_DATA_ZERO,
                    _ => G_TX_DATA_NONZERO,
                };
                self.data_gas_cost = self
                    .data_gas_cost
                    .checked_sub(cost)
                    .ok_or(TraceError::InconsistentByteSize {
                        counter: "DATA_GAS_COST",
                    })?;
            }
        }
        if row.phase_end {
            self.data_hi = U256::zero();
            self.data_lo = U256::zero();
        }
        Ok(())
    }
}
