use ethereum_types::{Address, U256};

/// Gas schedule constants shared by the trace modules.
pub mod gas {
    pub const G_MEMORY: u64 = 3;
    pub const G_COPY: u64 = 3;
    pub const G_KECCAK256_WORD: u64 = 6;
    pub const G_LOG_DATA: u64 = 8;
    pub const G_CODE_DEPOSIT: u64 = 200;

    pub const G_TRANSACTION: u64 = 21_000;
    pub const G_TX_CREATE: u64 = 32_000;
    pub const G_TX_DATA_ZERO: u64 = 4;
    pub const G_TX_DATA_NONZERO: u64 = 16;
    pub const G_ACCESS_LIST_ADDRESS: u64 = 2_400;
    pub const G_ACCESS_LIST_STORAGE: u64 = 1_900;

    /// Denominator of the refund cap introduced by EIP-3529.
    pub const MAX_REFUND_QUOTIENT: u64 = 5;
}

/// Returns the big-endian 32-byte representation of a word.
pub fn u256_to_be_bytes(value: U256) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    bytes
}

/// Minimal big-endian bytes of a word. Zero maps to an empty vector.
pub fn minimal_bytes(value: U256) -> Vec<u8> {
    let bytes = u256_to_be_bytes(value);
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(32);
    bytes[start..].to_vec()
}

/// Minimal big-endian bytes of a word, where zero is a single `0x00` byte.
pub fn integer_bytes(value: U256) -> Vec<u8> {
    match minimal_bytes(value) {
        bytes if bytes.is_empty() => vec![0],
        bytes => bytes,
    }
}

/// Left pads `bytes` with zeros up to `len`. Longer inputs are returned as is.
pub fn left_pad(bytes: &[u8], len: usize) -> Vec<u8> {
    if bytes.len() >= len {
        return bytes.to_vec();
    }
    let mut padded = vec![0u8; len - bytes.len()];
    padded.extend_from_slice(bytes);
    padded
}

/// Right pads `bytes` with zeros up to `len`. Longer inputs are returned as is.
pub fn right_pad(bytes: &[u8], len: usize) -> Vec<u8> {
    let mut padded = bytes.to_vec();
    if padded.len() < len {
        padded.resize(len, 0);
    }
    padded
}

/// Splits a word into its high and low 128-bit halves.
pub fn u256_hi_lo(value: U256) -> (u128, u128) {
    let lo = value.low_u128();
    let hi = (value >> 128).low_u128();
    (hi, lo)
}

/// Splits an address into its 4-byte high part and 16-byte low part.
pub fn address_hi_lo(address: &Address) -> (u32, u128) {
    let bytes = address.as_bytes();
    let mut hi = [0u8; 4];
    hi.copy_from_slice(&bytes[..4]);
    let mut lo = [0u8; 16];
    lo.copy_from_slice(&bytes[4..]);
    (u32::from_be_bytes(hi), u128::from_be_bytes(lo))
}

/// Like `#[serde(with = "::hex")]`, but tolerates and emits leading `0x`
/// prefixes
pub mod hex {
    use serde::{de::Error as _, Deserialize as _, Deserializer, Serializer};

    pub fn serialize<S: Serializer, T>(data: T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: hex::ToHex,
    {
        let s = data.encode_hex::<String>();
        serializer.serialize_str(&format!("0x{}", s))
    }

    pub fn deserialize<'de, D: Deserializer<'de>, T>(deserializer: D) -> Result<T, D::Error>
    where
        T: hex::FromHex,
        T::Error: std::fmt::Display,
    {
        let s = String::deserialize(deserializer)?;
        match s.strip_prefix("0x") {
            Some(rest) => T::from_hex(rest),
            None => T::from_hex(&*s),
        }
        .map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;
    use serde::{Deserialize, Serialize};

    use super::*;

    #[test]
    fn integer_bytes_of_zero_is_one_byte() {
        assert_eq!(minimal_bytes(U256::zero()), Vec::<u8>::new());
        assert_eq!(integer_bytes(U256::zero()), vec![0]);
        assert_eq!(integer_bytes(U256::from(200)), vec![0xc8]);
        assert_eq!(integer_bytes(U256::from(0x0102)), vec![1, 2]);
    }

    #[test]
    fn integer_bytes_match_rlp_payload() {
        let value = U256::from(0x0123_4567_89abu64);
        let encoded = rlp::encode(&value);
        assert_eq!(&encoded[1..], integer_bytes(value).as_slice());
    }

    #[test]
    fn padding() {
        assert_eq!(left_pad(&[1, 2], 4), vec![0, 0, 1, 2]);
        assert_eq!(right_pad(&[1, 2], 4), vec![1, 2, 0, 0]);
        assert_eq!(left_pad(&[1, 2, 3], 2), vec![1, 2, 3]);
    }

    #[test]
    fn address_split() {
        let address = Address::from(hex!("0102030405060708090a0b0c0d0e0f1011121314"));
        let (hi, lo) = address_hi_lo(&address);
        assert_eq!(hi, 0x01020304);
        assert_eq!(lo, 0x05060708090a0b0c0d0e0f1011121314);
    }

    #[test]
    fn word_split() {
        let value = (U256::from(7) << 128) + U256::from(9);
        assert_eq!(u256_hi_lo(value), (7, 9));
    }

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Payload {
        #[serde(with = "crate::hex")]
        data: Vec<u8>,
    }

    #[test]
    fn hex_serde_accepts_both_forms() {
        let with_prefix: Payload = serde_json::from_str(r#"{"data":"0xdeadbeef"}"#).unwrap();
        let without_prefix: Payload = serde_json::from_str(r#"{"data":"deadbeef"}"#).unwrap();
        assert_eq!(with_prefix, without_prefix);
        assert_eq!(
            serde_json::to_string(&with_prefix).unwrap(),
            r#"{"data":"0xdeadbeef"}"#
        );
    }
}
