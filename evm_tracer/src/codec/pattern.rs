use ethereum_types::U256;
use evm_tracer_common::integer_bytes;

use crate::error::TraceError;

/// Number of bytes in a large limb.
pub const LLARGE: usize = 16;

pub const RLP_PREFIX_INT_SHORT: u8 = 0x80;
pub const RLP_PREFIX_INT_LONG: u8 = 0xb7;
pub const RLP_PREFIX_LIST_SHORT: u8 = 0xc0;
pub const RLP_PREFIX_LIST_LONG: u8 = 0xf7;

/// One row of the byte-counting side channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ByteCount {
    pub power: U256,
    pub acc_bytesize: u8,
}

/// Running byte count and power of 256 over `n_step` rows for a `len`-byte
/// integer left-padded to `n_step` bytes.
///
/// `acc_bytesize` starts counting on the first significant byte, while
/// `power` on the last row is the factor that left-aligns the integer in a
/// 16-byte limb.
pub fn byte_counting(len: usize, n_step: usize) -> Vec<ByteCount> {
    debug_assert!(n_step <= LLARGE);
    let base = LLARGE - n_step;
    let (mut power, mut acc) = if len == n_step {
        (U256::one() << (8 * base), 1u8)
    } else {
        (U256::one() << (8 * (base + 1)), 0u8)
    };

    let mut out = Vec::with_capacity(n_step);
    out.push(ByteCount {
        power,
        acc_bytesize: acc,
    });
    for i in 1..n_step {
        if len + i < n_step {
            power <<= 8;
        } else {
            acc += 1;
        }
        out.push(ByteCount {
            power,
            acc_bytesize: acc,
        });
    }
    out
}

/// One row of the bit decomposition side channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BitStep {
    pub bit: bool,
    pub bit_acc: u8,
}

/// Decomposes `byte` over the last 8 of `n_step` rows, most significant bit
/// first, with the running accumulator of the bits seen so far.
pub fn bit_decomposition(byte: u8, n_step: usize) -> Vec<BitStep> {
    let mut acc = 0u8;
    (0..n_step)
        .map(|i| {
            let bit = i + 8 >= n_step && (byte >> (n_step - 1 - i)) & 1 == 1;
            acc = acc.wrapping_shl(1) | bit as u8;
            BitStep { bit, bit_acc: acc }
        })
        .collect()
}

/// The prefix of a byte string or list whose payload is `length` bytes long.
pub fn length_prefix(length: usize, is_list: bool) -> Vec<u8> {
    let (short, long) = match is_list {
        true => (RLP_PREFIX_LIST_SHORT, RLP_PREFIX_LIST_LONG),
        false => (RLP_PREFIX_INT_SHORT, RLP_PREFIX_INT_LONG),
    };
    if length < 56 {
        return vec![short + length as u8];
    }
    let length_bytes = integer_bytes(U256::from(length));
    let mut prefix = vec![long + length_bytes.len() as u8];
    prefix.extend(length_bytes);
    prefix
}

/// RLP encoding of an unsigned integer.
pub fn rlp_integer(value: U256) -> Vec<u8> {
    if value.is_zero() {
        return vec![RLP_PREFIX_INT_SHORT];
    }
    if value < U256::from(RLP_PREFIX_INT_SHORT) {
        return vec![value.low_u32() as u8];
    }
    let bytes = integer_bytes(value);
    let mut out = length_prefix(bytes.len(), false);
    out.extend(bytes);
    out
}

/// Length of the payload of an RLP item, prefix excluded.
pub fn inner_rlp_size(encoding: &[u8]) -> Result<usize, TraceError> {
    Ok(rlp::Rlp::new(encoding).payload_info()?.value_len)
}

/// Length of an RLP item whose payload is `n` bytes long.
pub fn outer_rlp_size(n: usize) -> usize {
    match n {
        0..=55 => n + 1,
        _ => n + 1 + integer_bytes(U256::from(n)).len(),
    }
}
