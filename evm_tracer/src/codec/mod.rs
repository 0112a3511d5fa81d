//! RLP building blocks shared by the modules that reconstruct encodings.

mod pattern;
mod reference;

pub use pattern::{
    bit_decomposition, byte_counting, inner_rlp_size, length_prefix, outer_rlp_size, rlp_integer,
    BitStep, ByteCount, LLARGE, RLP_PREFIX_INT_LONG, RLP_PREFIX_INT_SHORT, RLP_PREFIX_LIST_LONG,
    RLP_PREFIX_LIST_SHORT,
};
pub use reference::{
    address_of_hash, create2_address, create2_preimage, create_address, create_preimage,
    signed_payload, signing_preimage, word_to_h256,
};
