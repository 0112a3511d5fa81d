use ethereum_types::{Address, H256, U256};
use evm_tracer_common::gas::{
    G_ACCESS_LIST_ADDRESS, G_ACCESS_LIST_STORAGE, G_TRANSACTION, G_TX_CREATE, G_TX_DATA_NONZERO,
    G_TX_DATA_ZERO,
};
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::TraceError;

/// The transaction envelopes that can be traced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransactionType {
    Frontier,
    AccessList,
    Eip1559,
}

impl TransactionType {
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Frontier => 0,
            Self::AccessList => 1,
            Self::Eip1559 => 2,
        }
    }
}

impl TryFrom<u8> for TransactionType {
    type Error = TraceError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Frontier),
            1 => Ok(Self::AccessList),
            2 => Ok(Self::Eip1559),
            other => Err(TraceError::UnsupportedTransactionType(other)),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessListItem {
    pub address: Address,
    #[serde(default)]
    pub storage_keys: Vec<H256>,
}

/// A signed transaction as seen at the start of its execution, together with
/// the bits of world state the trace modules need.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub tx_type: u8,
    #[serde(default)]
    pub chain_id: Option<u64>,
    pub nonce: u64,
    #[serde(default)]
    pub gas_price: Option<U256>,
    #[serde(default)]
    pub max_priority_fee_per_gas: Option<U256>,
    #[serde(default)]
    pub max_fee_per_gas: Option<U256>,
    pub gas_limit: u64,
    pub from: Address,
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(default)]
    pub value: U256,
    #[serde(default, with = "evm_tracer_common::hex")]
    pub payload: Vec<u8>,
    #[serde(default)]
    pub access_list: Vec<AccessListItem>,
    /// `V` for legacy transactions, the y parity otherwise.
    pub v: u64,
    pub r: U256,
    pub s: U256,
    /// Balance of the sender before the transaction.
    #[serde(default)]
    pub sender_balance: U256,
    /// Whether the recipient holds code.
    #[serde(default)]
    pub to_has_code: bool,
    #[serde(default)]
    pub code_fragment_index: u32,
}

impl Transaction {
    pub fn tx_type(&self) -> Result<TransactionType, TraceError> {
        TransactionType::try_from(self.tx_type)
    }

    pub fn is_deployment(&self) -> bool {
        self.to.is_none()
    }

    pub fn gas_price(&self) -> Result<U256, TraceError> {
        self.gas_price.ok_or(TraceError::MissingField("gas_price"))
    }

    pub fn max_priority_fee(&self) -> Result<U256, TraceError> {
        self.max_priority_fee_per_gas
            .ok_or(TraceError::MissingField("max_priority_fee_per_gas"))
    }

    pub fn max_fee(&self) -> Result<U256, TraceError> {
        self.max_fee_per_gas
            .ok_or(TraceError::MissingField("max_fee_per_gas"))
    }

    /// Chain id of a typed transaction.
    pub fn typed_chain_id(&self) -> Result<u64, TraceError> {
        self.chain_id.ok_or(TraceError::MissingField("chain_id"))
    }

    /// Chain id replay protection of a legacy transaction, EIP-155
    /// `V = 2 * chain_id + 35 + y`.
    pub fn legacy_chain_id(&self) -> Option<u64> {
        (self.v >= 35).then(|| (self.v - 35) / 2)
    }

    /// The price per gas the sender commits to: the gas price, or the fee cap
    /// of an EIP-1559 transaction.
    pub fn max_fee_shorthand(&self) -> Result<U256, TraceError> {
        match self.tx_type()? {
            TransactionType::Frontier | TransactionType::AccessList => self.gas_price(),
            TransactionType::Eip1559 => self.max_fee(),
        }
    }

    pub fn effective_gas_price(&self, base_fee: U256) -> Result<U256, TraceError> {
        match self.tx_type()? {
            TransactionType::Frontier | TransactionType::AccessList => self.gas_price(),
            TransactionType::Eip1559 => Ok(self
                .max_fee()?
                .min(base_fee.saturating_add(self.max_priority_fee()?))),
        }
    }

    pub fn data_cost(&self) -> u64 {
        self.payload
            .iter()
            .map(|byte| match byte {
                0 => G_TX_DATA_ZERO,
                _ => G_TX_DATA_NONZERO,
            })
            .fold(0, u64::saturating_add)
    }

    /// Number of pre-warmed addresses and storage keys.
    pub fn access_list_counts(&self) -> (usize, usize) {
        let keys = self
            .access_list
            .iter()
            .map(|item| item.storage_keys.len())
            .sum();
        (self.access_list.len(), keys)
    }

    /// Intrinsic gas charged before execution starts.
    pub fn upfront_gas_cost(&self) -> u64 {
        let (addresses, keys) = self.access_list_counts();
        intrinsic_gas(self.data_cost(), self.is_deployment(), addresses, keys)
    }

    /// The recipient, or the address of the contract being deployed.
    pub fn effective_recipient(&self) -> Address {
        match self.to {
            Some(to) => to,
            None => codec::create_address(&self.from, self.nonce),
        }
    }

    pub fn requires_evm_execution(&self) -> bool {
        match self.to {
            Some(_) => self.to_has_code,
            None => !self.payload.is_empty(),
        }
    }
}

/// Saturates at `u64::MAX`, which no gas limit can cover.
fn intrinsic_gas(data_cost: u64, deployment: bool, addresses: usize, keys: usize) -> u64 {
    let create = if deployment { G_TX_CREATE } else { 0 };
    let per_item = |count: usize, cost: u64| (count as u64).saturating_mul(cost);
    data_cost
        .saturating_add(create)
        .saturating_add(G_TRANSACTION)
        .saturating_add(per_item(addresses, G_ACCESS_LIST_ADDRESS))
        .saturating_add(per_item(keys, G_ACCESS_LIST_STORAGE))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frontier(payload: Vec<u8>) -> Transaction {
        Transaction {
            tx_type: 0,
            gas_price: Some(10.into()),
            gas_limit: 100_000,
            to: Some(Address::repeat_byte(0x11)),
            payload,
            v: 27,
            r: U256::one(),
            s: U256::one(),
            ..Default::default()
        }
    }

    #[test]
    fn three_zero_bytes_cost_three_zero_data_units() {
        let tx = frontier(vec![0, 0, 0]);
        assert_eq!(tx.data_cost(), 3 * G_TX_DATA_ZERO);
        assert_eq!(tx.upfront_gas_cost(), G_TRANSACTION + 3 * G_TX_DATA_ZERO);
    }

    #[test]
    fn deployment_and_access_list_add_to_upfront_cost() {
        let tx = Transaction {
            tx_type: 1,
            to: None,
            payload: vec![1],
            access_list: vec![AccessListItem {
                address: Address::zero(),
                storage_keys: vec![H256::zero(); 2],
            }],
            ..frontier(vec![])
        };
        assert_eq!(
            tx.upfront_gas_cost(),
            G_TX_DATA_NONZERO
                + G_TX_CREATE
                + G_TRANSACTION
                + G_ACCESS_LIST_ADDRESS
                + 2 * G_ACCESS_LIST_STORAGE
        );
        assert!(tx.requires_evm_execution());
    }

    #[test]
    fn oversized_access_lists_saturate_the_upfront_cost() {
        assert_eq!(intrinsic_gas(0, false, usize::MAX, 0), u64::MAX);
        assert_eq!(intrinsic_gas(u64::MAX - 1, true, 0, 0), u64::MAX);
        assert_eq!(intrinsic_gas(0, false, 1, usize::MAX), u64::MAX);
        assert_eq!(
            intrinsic_gas(16, false, 1, 1),
            16 + G_TRANSACTION + G_ACCESS_LIST_ADDRESS + G_ACCESS_LIST_STORAGE
        );
    }

    #[test]
    fn eip1559_effective_price_is_capped() -> Result<(), TraceError> {
        let tx = Transaction {
            tx_type: 2,
            max_fee_per_gas: Some(100.into()),
            max_priority_fee_per_gas: Some(5.into()),
            ..frontier(vec![])
        };
        assert_eq!(tx.effective_gas_price(90.into())?, U256::from(95));
        assert_eq!(tx.effective_gas_price(99.into())?, U256::from(100));
        assert_eq!(tx.max_fee_shorthand()?, U256::from(100));
        Ok(())
    }

    #[test]
    fn unknown_type_is_rejected() {
        let tx = Transaction {
            tx_type: 3,
            ..frontier(vec![])
        };
        assert!(matches!(
            tx.tx_type(),
            Err(TraceError::UnsupportedTransactionType(3))
        ));
    }

    #[test]
    fn legacy_chain_id_from_v() {
        assert_eq!(frontier(vec![]).legacy_chain_id(), None);
        let tx = Transaction {
            v: 2 * 59144 + 36,
            ..frontier(vec![])
        };
        assert_eq!(tx.legacy_chain_id(), Some(59144));
    }
}
