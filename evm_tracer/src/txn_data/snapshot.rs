use ethereum_types::{Address, U256};
use evm_tracer_common::gas::MAX_REFUND_QUOTIENT;

use crate::error::TraceError;
use crate::helpers::{EucOperation, EuclideanDivision, WcpInstruction, WcpOperation, WordComparison};
use crate::module::RowCount;
use crate::witness::{BlockHeader, Transaction, TransactionOutcome, TransactionType};

pub const NB_ROWS_TYPE_0: usize = 8;
pub const NB_ROWS_TYPE_1: usize = 9;
pub const NB_ROWS_TYPE_2: usize = 9;

/// EIP-2681 nonce upper bound.
pub const MAX_NONCE: u64 = u64::MAX;

/// The lookup call carried by one TXNDATA row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparison {
    Wcp(WcpOperation),
    Euc(EucOperation),
    Empty,
}

impl Comparison {
    /// The instruction column value. The Euclidean division has none.
    pub fn inst(&self) -> u8 {
        match self {
            Self::Wcp(op) => op.instruction.opcode(),
            Self::Euc(_) | Self::Empty => 0,
        }
    }

    pub fn args(&self) -> (U256, U256) {
        match self {
            Self::Wcp(op) => (op.arg1, op.arg2),
            Self::Euc(op) => (op.dividend, op.divisor),
            Self::Empty => (U256::zero(), U256::zero()),
        }
    }

    /// The boolean result, or the quotient of a division.
    pub fn result(&self) -> U256 {
        match self {
            Self::Wcp(op) => U256::from(u8::from(op.result)),
            Self::Euc(op) => op.quotient,
            Self::Empty => U256::zero(),
        }
    }

    pub fn is_wcp(&self) -> bool {
        matches!(self, Self::Wcp(_))
    }

    pub fn is_euc(&self) -> bool {
        matches!(self, Self::Euc(_))
    }
}

fn lt(wcp: &mut impl WordComparison, arg1: U256, arg2: U256) -> Comparison {
    let result = wcp.lt(arg1, arg2);
    Comparison::Wcp(WcpOperation {
        instruction: WcpInstruction::Lt,
        arg1,
        arg2,
        result,
    })
}

/// A transaction as TXNDATA sees it: its fields, the block it belongs to and,
/// once executed, its outcome and the comparisons justifying it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxnSnapshot {
    pub tx: Transaction,
    pub tx_type: TransactionType,
    /// 1-based index of the block within the conflation.
    pub rel_block: usize,
    pub base_fee: U256,
    pub coinbase: Address,
    pub block_gas_limit: u64,
    pub upfront_gas_cost: u64,
    pub data_cost: u64,
    pub effective_gas_price: U256,
    pub max_fee_shorthand: U256,
    pub outcome: Option<TransactionOutcome>,
    pub refund_limit: U256,
    pub comparisons: Vec<Comparison>,
    pub is_last_of_block: bool,
}

impl TxnSnapshot {
    pub fn new(tx: &Transaction, rel_block: usize, header: &BlockHeader) -> Result<Self, TraceError> {
        Ok(Self {
            tx_type: tx.tx_type()?,
            rel_block,
            base_fee: header.base_fee,
            coinbase: header.coinbase,
            block_gas_limit: header.gas_limit,
            upfront_gas_cost: tx.upfront_gas_cost(),
            data_cost: tx.data_cost(),
            effective_gas_price: tx.effective_gas_price(header.base_fee)?,
            max_fee_shorthand: tx.max_fee_shorthand()?,
            outcome: None,
            refund_limit: U256::zero(),
            comparisons: Vec::new(),
            is_last_of_block: false,
            tx: tx.clone(),
        })
    }

    /// Rows of the transaction before the block closing row.
    pub fn base_rows(&self) -> usize {
        match self.tx_type {
            TransactionType::Frontier => NB_ROWS_TYPE_0,
            TransactionType::AccessList => NB_ROWS_TYPE_1,
            TransactionType::Eip1559 => NB_ROWS_TYPE_2,
        }
    }

    pub fn outcome(&self) -> Result<&TransactionOutcome, TraceError> {
        self.outcome
            .as_ref()
            .ok_or(TraceError::MissingField("transaction outcome"))
    }

    /// Records the outcome of the transaction and the comparisons of its
    /// rows against the helpers.
    pub fn finalize(
        &mut self,
        outcome: &TransactionOutcome,
        wcp: &mut impl WordComparison,
        euc: &mut impl EuclideanDivision,
    ) -> Result<(), TraceError> {
        let tx = &self.tx;
        let gas_limit = U256::from(tx.gas_limit);
        let mut comparisons = Vec::with_capacity(self.base_rows() + 1);

        comparisons.push(lt(wcp, tx.nonce.into(), MAX_NONCE.into()));
        let max_cost = tx
            .value
            .saturating_add(self.max_fee_shorthand.saturating_mul(gas_limit));
        comparisons.push(lt(wcp, tx.sender_balance, max_cost));
        comparisons.push(lt(wcp, gas_limit, self.upfront_gas_cost.into()));

        let consumed = U256::from(tx.gas_limit.saturating_sub(outcome.leftover_gas));
        let divisor = U256::from(MAX_REFUND_QUOTIENT);
        let (quotient, remainder) = euc.divide(consumed, divisor)?;
        comparisons.push(Comparison::Euc(EucOperation {
            dividend: consumed,
            divisor,
            quotient,
            remainder,
        }));
        comparisons.push(lt(wcp, outcome.refund_counter.into(), quotient));

        let size = U256::from(tx.payload.len());
        let result = wcp.is_zero(size);
        comparisons.push(Comparison::Wcp(WcpOperation {
            instruction: WcpInstruction::IsZero,
            arg1: size,
            arg2: U256::zero(),
            result,
        }));

        match self.tx_type {
            TransactionType::Frontier | TransactionType::AccessList => {
                comparisons.resize(self.base_rows(), Comparison::Empty);
            }
            TransactionType::Eip1559 => {
                let max_fee = tx.max_fee()?;
                let max_priority = tx.max_priority_fee()?;
                comparisons.push(lt(wcp, max_fee, self.base_fee));
                comparisons.push(lt(wcp, max_fee, max_priority));
                comparisons.push(lt(
                    wcp,
                    max_fee,
                    max_priority.saturating_add(self.base_fee),
                ));
            }
        }
        debug_assert_eq!(comparisons.len(), self.base_rows());

        self.refund_limit = quotient;
        self.comparisons = comparisons;
        self.outcome = Some(outcome.clone());
        Ok(())
    }

    /// Flags the transaction as the last of its block and checks the gas
    /// used by the block against its limit.
    pub fn close_block(&mut self, wcp: &mut impl WordComparison) -> Result<(), TraceError> {
        let cumulative = U256::from(self.outcome()?.gas_used);
        let limit = U256::from(self.block_gas_limit);
        let result = wcp.leq(cumulative, limit);
        self.comparisons.push(Comparison::Wcp(WcpOperation {
            instruction: WcpInstruction::Leq,
            arg1: cumulative,
            arg2: limit,
            result,
        }));
        self.is_last_of_block = true;
        Ok(())
    }

    pub fn gas_initially_available(&self) -> u64 {
        self.tx.gas_limit.saturating_sub(self.upfront_gas_cost)
    }

    pub fn priority_fee_per_gas(&self) -> U256 {
        self.effective_gas_price.saturating_sub(self.base_fee)
    }

    pub fn call_data_size(&self) -> usize {
        if self.tx.is_deployment() {
            0
        } else {
            self.tx.payload.len()
        }
    }

    pub fn init_code_size(&self) -> usize {
        if self.tx.is_deployment() {
            self.tx.payload.len()
        } else {
            0
        }
    }

    pub fn copy_txcd(&self) -> bool {
        self.tx.requires_evm_execution() && !self.tx.is_deployment() && self.call_data_size() > 0
    }

    /// Leftover gas plus the capped refund.
    pub fn refund_effective(&self) -> Result<U256, TraceError> {
        let outcome = self.outcome()?;
        let refund = U256::from(outcome.refund_counter).min(self.refund_limit);
        Ok(U256::from(outcome.leftover_gas) + refund)
    }

    /// Data sent to RLPTXN at counter `ct`, as `(phase, hi, lo)`.
    pub fn outgoing_rlp_txn(&self, ct: usize) -> Result<(u8, U256, U256), TraceError> {
        let tx = &self.tx;
        let (addresses, keys) = tx.access_list_counts();
        let zero = U256::zero();
        let out = match (ct, self.tx_type) {
            (0, _) => (1, zero, U256::from(self.tx_type.as_u8())),
            (1, _) => match tx.to {
                Some(to) => {
                    let (hi, lo) = evm_tracer_common::address_hi_lo(&to);
                    (8, U256::from(hi), U256::from(lo))
                }
                None => (8, zero, zero),
            },
            (2, _) => (3, zero, tx.nonce.into()),
            (3, _) => (9, U256::from(u8::from(tx.is_deployment())), tx.value),
            (4, _) => (10, self.data_cost.into(), tx.payload.len().into()),
            (5, _) => (7, zero, tx.gas_limit.into()),
            (6, TransactionType::Frontier | TransactionType::AccessList) => {
                (4, zero, tx.gas_price()?)
            }
            (6, TransactionType::Eip1559) => (6, tx.max_priority_fee()?, tx.max_fee()?),
            (7, TransactionType::AccessList | TransactionType::Eip1559) => (11, keys.into(), addresses.into()),
            _ => (0, zero, zero),
        };
        Ok(out)
    }

    /// Data sent to the receipt module at counter `ct`, as `(subphase, value)`.
    pub fn outgoing_rlp_receipt(&self, ct: usize) -> Result<(u8, U256), TraceError> {
        let outcome = self.outcome()?;
        let out = match ct {
            0 => (7, U256::from(self.tx_type.as_u8())),
            1 => (2, U256::from(u8::from(outcome.success))),
            2 => (3, U256::from(outcome.gas_used)),
            _ => (0, U256::zero()),
        };
        Ok(out)
    }
}

impl RowCount for TxnSnapshot {
    fn row_count(&self) -> usize {
        self.base_rows() + usize::from(self.is_last_of_block)
    }
}
