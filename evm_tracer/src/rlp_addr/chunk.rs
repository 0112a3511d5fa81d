use ethereum_types::{Address, H256, U256};
use evm_tracer_common::{integer_bytes, left_pad};
use keccak_hash::keccak;

use crate::codec::{self, RLP_PREFIX_LIST_SHORT};
use crate::error::TraceError;
use crate::module::RowCount;

/// `0x80 + 20`, the prefix of the deployer address in a `CREATE` pre-image.
pub const ADDRESS_PREFIX: u8 = 0x94;

/// Marker byte of a `CREATE2` pre-image.
pub const CREATE2_SHIFT: u8 = 0xff;

pub const CREATE_ROWS: usize = 8;
pub const CREATE2_ROWS: usize = 6;

/// Width in bytes of the nonce decomposition.
pub const NONCE_BYTES: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressRecipe {
    Create { nonce: u64 },
    Create2 { salt: H256, init_code_hash: H256 },
}

impl AddressRecipe {
    pub const fn id(&self) -> u8 {
        match self {
            Self::Create { .. } => 1,
            Self::Create2 { .. } => 2,
        }
    }
}

/// One contract address derivation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RlpAddrChunk {
    pub deployer: Address,
    pub recipe: AddressRecipe,
    /// Hash of the pre-image, the derived address being its last 20 bytes.
    pub hash: H256,
    /// The pre-image split in limbs, left-aligned, with their byte length.
    pub limbs: Vec<Vec<u8>>,
}

impl RlpAddrChunk {
    pub fn create(deployer: Address, nonce: u64) -> Result<Self, TraceError> {
        let rlp_nonce = codec::rlp_integer(nonce.into());
        let list_prefix = RLP_PREFIX_LIST_SHORT + 21 + rlp_nonce.len() as u8;
        let mut head = vec![ADDRESS_PREFIX];
        head.extend_from_slice(&deployer.as_bytes()[..4]);
        let limbs = vec![
            vec![list_prefix],
            head,
            deployer.as_bytes()[4..].to_vec(),
            rlp_nonce,
        ];
        Self::checked(
            deployer,
            AddressRecipe::Create { nonce },
            limbs,
            codec::create_preimage(&deployer, nonce),
        )
    }

    pub fn create2(deployer: Address, salt: H256, init_code_hash: H256) -> Result<Self, TraceError> {
        let mut head = vec![CREATE2_SHIFT];
        head.extend_from_slice(&deployer.as_bytes()[..4]);
        let limbs = vec![
            head,
            deployer.as_bytes()[4..].to_vec(),
            salt.as_bytes()[..16].to_vec(),
            salt.as_bytes()[16..].to_vec(),
            init_code_hash.as_bytes()[..16].to_vec(),
            init_code_hash.as_bytes()[16..].to_vec(),
        ];
        Self::checked(
            deployer,
            AddressRecipe::Create2 {
                salt,
                init_code_hash,
            },
            limbs,
            codec::create2_preimage(&deployer, salt, init_code_hash),
        )
    }

    /// Checks the limbs against the reference pre-image and the derived
    /// address against the reference derivation.
    fn checked(
        deployer: Address,
        recipe: AddressRecipe,
        limbs: Vec<Vec<u8>>,
        preimage: Vec<u8>,
    ) -> Result<Self, TraceError> {
        let reconstructed = limbs.concat();
        if reconstructed != preimage {
            return Err(TraceError::RlpMismatch {
                which: "address pre-image",
                expected: hex::encode(&preimage),
                actual: hex::encode(&reconstructed),
            });
        }
        let hash = keccak(&reconstructed);
        let chunk = Self {
            deployer,
            recipe,
            hash,
            limbs,
        };
        let expected = match recipe {
            AddressRecipe::Create { nonce } => codec::create_address(&deployer, nonce),
            AddressRecipe::Create2 {
                salt,
                init_code_hash,
            } => codec::create2_address(&deployer, salt, init_code_hash),
        };
        if chunk.address() != expected {
            return Err(TraceError::AddressMismatch {
                expected,
                actual: chunk.address(),
            });
        }
        Ok(chunk)
    }

    pub fn address(&self) -> Address {
        codec::address_of_hash(self.hash)
    }

    pub fn nonce(&self) -> u64 {
        match self.recipe {
            AddressRecipe::Create { nonce } => nonce,
            AddressRecipe::Create2 { .. } => 0,
        }
    }

    /// The nonce left-padded to [`NONCE_BYTES`].
    pub fn padded_nonce(&self) -> Vec<u8> {
        left_pad(&integer_bytes(U256::from(self.nonce())), NONCE_BYTES)
    }

    pub fn tiny_non_zero_nonce(&self) -> bool {
        matches!(self.recipe, AddressRecipe::Create { nonce } if nonce > 0 && nonce < 128)
    }
}

impl RowCount for RlpAddrChunk {
    fn row_count(&self) -> usize {
        match self.recipe {
            AddressRecipe::Create { .. } => CREATE_ROWS,
            AddressRecipe::Create2 { .. } => CREATE2_ROWS,
        }
    }
}
