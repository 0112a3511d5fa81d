//! Canonical encodings built with the `rlp` crate. The trace modules rebuild
//! these byte strings limb by limb and compare against them.

use ethereum_types::{Address, H256, U256};
use keccak_hash::keccak;
use rlp::RlpStream;

use crate::error::TraceError;
use crate::witness::{AccessListItem, Transaction, TransactionType};

fn append_to(stream: &mut RlpStream, to: &Option<Address>) {
    match to {
        Some(to) => stream.append(to),
        None => stream.append_empty_data(),
    };
}

fn append_access_list(stream: &mut RlpStream, access_list: &[AccessListItem]) {
    stream.begin_list(access_list.len());
    for item in access_list {
        stream.begin_list(2);
        stream.append(&item.address);
        stream.append_list::<H256, H256>(&item.storage_keys);
    }
}

/// Appends the common fields of a transaction, shared by the signing
/// pre-image and the signed payload.
fn append_fields(stream: &mut RlpStream, tx: &Transaction) -> Result<(), TraceError> {
    match tx.tx_type()? {
        TransactionType::Frontier => {
            stream
                .append(&tx.nonce)
                .append(&tx.gas_price()?)
                .append(&tx.gas_limit);
            append_to(stream, &tx.to);
            stream.append(&tx.value).append(&tx.payload);
        }
        TransactionType::AccessList => {
            stream
                .append(&tx.typed_chain_id()?)
                .append(&tx.nonce)
                .append(&tx.gas_price()?)
                .append(&tx.gas_limit);
            append_to(stream, &tx.to);
            stream.append(&tx.value).append(&tx.payload);
            append_access_list(stream, &tx.access_list);
        }
        TransactionType::Eip1559 => {
            stream
                .append(&tx.typed_chain_id()?)
                .append(&tx.nonce)
                .append(&tx.max_priority_fee()?)
                .append(&tx.max_fee()?)
                .append(&tx.gas_limit);
            append_to(stream, &tx.to);
            stream.append(&tx.value).append(&tx.payload);
            append_access_list(stream, &tx.access_list);
        }
    }
    Ok(())
}

fn with_type_byte(tx_type: TransactionType, list: &[u8]) -> Vec<u8> {
    match tx_type {
        TransactionType::Frontier => list.to_vec(),
        typed => {
            let mut out = Vec::with_capacity(list.len() + 1);
            out.push(typed.as_u8());
            out.extend_from_slice(list);
            out
        }
    }
}

/// The bytes whose hash the sender signed.
pub fn signing_preimage(tx: &Transaction) -> Result<Vec<u8>, TraceError> {
    let tx_type = tx.tx_type()?;
    let mut stream = RlpStream::new();
    let chain_id = match tx_type {
        TransactionType::Frontier => tx.legacy_chain_id(),
        _ => None,
    };
    let fields = match (tx_type, chain_id) {
        (TransactionType::Frontier, None) => 6,
        (TransactionType::Frontier, Some(_)) => 9,
        (TransactionType::AccessList, _) => 8,
        (TransactionType::Eip1559, _) => 9,
    };
    stream.begin_list(fields);
    append_fields(&mut stream, tx)?;
    if let Some(chain_id) = chain_id {
        stream
            .append(&chain_id)
            .append_empty_data()
            .append_empty_data();
    }
    Ok(with_type_byte(tx_type, &stream.out()))
}

/// The signed transaction as broadcast.
pub fn signed_payload(tx: &Transaction) -> Result<Vec<u8>, TraceError> {
    let tx_type = tx.tx_type()?;
    let mut stream = RlpStream::new();
    let fields = match tx_type {
        TransactionType::Frontier => 9,
        TransactionType::AccessList => 11,
        TransactionType::Eip1559 => 12,
    };
    stream.begin_list(fields);
    append_fields(&mut stream, tx)?;
    stream.append(&tx.v).append(&tx.r).append(&tx.s);
    Ok(with_type_byte(tx_type, &stream.out()))
}

/// `rlp([sender, nonce])`, the pre-image of a `CREATE` address.
pub fn create_preimage(sender: &Address, nonce: u64) -> Vec<u8> {
    let mut stream = RlpStream::new_list(2);
    stream.append(sender).append(&nonce);
    stream.out().to_vec()
}

pub fn create_address(sender: &Address, nonce: u64) -> Address {
    address_of_hash(keccak(create_preimage(sender, nonce)))
}

/// `0xff ++ sender ++ salt ++ keccak(init_code)`, the pre-image of a
/// `CREATE2` address.
pub fn create2_preimage(sender: &Address, salt: H256, init_code_hash: H256) -> Vec<u8> {
    let mut out = Vec::with_capacity(85);
    out.push(0xff);
    out.extend_from_slice(sender.as_bytes());
    out.extend_from_slice(salt.as_bytes());
    out.extend_from_slice(init_code_hash.as_bytes());
    out
}

pub fn create2_address(sender: &Address, salt: H256, init_code_hash: H256) -> Address {
    address_of_hash(keccak(create2_preimage(sender, salt, init_code_hash)))
}

/// The last 20 bytes of a hash.
pub fn address_of_hash(hash: H256) -> Address {
    Address::from_slice(&hash.as_bytes()[12..])
}

/// Interprets the 32 bytes of a word as a hash.
pub fn word_to_h256(word: U256) -> H256 {
    H256(evm_tracer_common::u256_to_be_bytes(word))
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    fn eip155_example() -> Transaction {
        Transaction {
            tx_type: 0,
            nonce: 9,
            gas_price: Some(20_000_000_000u64.into()),
            gas_limit: 21_000,
            to: Some(Address::repeat_byte(0x35)),
            value: U256::exp10(18),
            v: 37,
            r: U256::from_big_endian(&hex!(
                "28ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276"
            )),
            s: U256::from_big_endian(&hex!(
                "67cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
            )),
            ..Default::default()
        }
    }

    #[test]
    fn eip155_signing_data() -> Result<(), TraceError> {
        assert_eq!(
            signing_preimage(&eip155_example())?,
            hex!("ec098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a764000080018080")
        );
        Ok(())
    }

    #[test]
    fn eip155_signed_transaction() -> Result<(), TraceError> {
        assert_eq!(
            signed_payload(&eip155_example())?,
            hex!("f86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83")
        );
        Ok(())
    }

    #[test]
    fn typed_payloads_start_with_type_byte() -> Result<(), TraceError> {
        let tx = Transaction {
            tx_type: 2,
            chain_id: Some(1),
            max_priority_fee_per_gas: Some(1.into()),
            max_fee_per_gas: Some(2.into()),
            to: None,
            access_list: vec![AccessListItem {
                address: Address::repeat_byte(1),
                storage_keys: vec![H256::repeat_byte(2)],
            }],
            v: 1,
            ..eip155_example()
        };
        let preimage = signing_preimage(&tx)?;
        let signed = signed_payload(&tx)?;
        assert_eq!(preimage[0], 0x02);
        assert_eq!(signed[0], 0x02);
        assert_eq!(rlp::Rlp::new(&preimage[1..]).item_count()?, 9);
        assert_eq!(rlp::Rlp::new(&signed[1..]).item_count()?, 12);
        Ok(())
    }

    #[test]
    fn create_addresses() {
        let sender = Address::from(hex!("6ac7ea33f8831ea9dcc53393aaa88b25a785dbf0"));
        assert_eq!(
            create_address(&sender, 0),
            Address::from(hex!("cd234a471b72ba2f1ccf0a70fcaba648a5eecd8d"))
        );
        assert_eq!(
            create_address(&sender, 1),
            Address::from(hex!("343c43a37d37dff08ae8c4a11544c718abb4fcf8"))
        );
    }

    #[test]
    fn create2_address_of_zero_deployer() {
        let init_code_hash = keccak([0u8]);
        assert_eq!(
            create2_address(&Address::zero(), H256::zero(), init_code_hash),
            Address::from(hex!("4d1a2e2bb4f88f0250f26ffff098b0b30b26bf38"))
        );
        assert_eq!(create2_preimage(&Address::zero(), H256::zero(), init_code_hash).len(), 85);
    }
}
