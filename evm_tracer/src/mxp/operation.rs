use ethereum_types::U256;
use evm_tracer_common::gas::{G_CODE_DEPOSIT, G_COPY, G_KECCAK256_WORD, G_LOG_DATA, G_MEMORY};

use crate::error::TraceError;
use crate::module::RowCount;
use crate::witness::{Instruction, OpcodeEvent};

/// How an instruction addresses memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MxpType {
    /// `MSIZE`: reads the memory size only.
    Type1,
    /// A full word at an offset.
    Type2,
    /// A single byte at an offset.
    Type3,
    /// One offset and size pair.
    Type4,
    /// Two offset and size pairs.
    Type5,
}

/// Per-unit price of the memory range an instruction touches, on top of the
/// expansion cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BillingRate {
    None,
    ByWord(u64),
    ByByte(u64),
}

impl BillingRate {
    pub const fn per_word(self) -> u64 {
        match self {
            Self::ByWord(cost) => cost,
            Self::None | Self::ByByte(_) => 0,
        }
    }

    pub const fn per_byte(self) -> u64 {
        match self {
            Self::ByByte(cost) => cost,
            Self::None | Self::ByWord(_) => 0,
        }
    }

    fn cost(self, size_in_bytes: u64) -> u64 {
        match self {
            Self::None => 0,
            Self::ByByte(cost) => cost.saturating_mul(size_in_bytes),
            Self::ByWord(cost) => cost.saturating_mul(size_in_bytes.saturating_add(31) / 32),
        }
    }
}

impl Instruction {
    pub const fn mxp_type(self) -> MxpType {
        match self {
            Self::Msize => MxpType::Type1,
            Self::Mload | Self::Mstore => MxpType::Type2,
            Self::Mstore8 => MxpType::Type3,
            Self::Sha3
            | Self::Log0
            | Self::Log1
            | Self::Log2
            | Self::Log3
            | Self::Log4
            | Self::Return
            | Self::Revert
            | Self::CallDataCopy
            | Self::CodeCopy
            | Self::ReturnDataCopy
            | Self::ExtCodeCopy
            | Self::Create
            | Self::Create2 => MxpType::Type4,
            Self::Call | Self::CallCode | Self::DelegateCall | Self::StaticCall => MxpType::Type5,
        }
    }

    pub const fn billing(self) -> BillingRate {
        match self {
            Self::Sha3 | Self::Create2 => BillingRate::ByWord(G_KECCAK256_WORD),
            Self::CallDataCopy | Self::CodeCopy | Self::ReturnDataCopy | Self::ExtCodeCopy => {
                BillingRate::ByWord(G_COPY)
            }
            Self::Log0 | Self::Log1 | Self::Log2 | Self::Log3 | Self::Log4 => {
                BillingRate::ByByte(G_LOG_DATA)
            }
            Self::Return => BillingRate::ByByte(G_CODE_DEPOSIT),
            Self::Mload
            | Self::Mstore
            | Self::Mstore8
            | Self::Msize
            | Self::Create
            | Self::Call
            | Self::CallCode
            | Self::DelegateCall
            | Self::StaticCall
            | Self::Revert => BillingRate::None,
        }
    }
}

/// The three mutually exclusive ways a memory expansion is traced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MxpPath {
    Trivial,
    NonTrivialButMxpx,
    NonTrivial,
}

impl MxpPath {
    pub const fn row_count(self) -> usize {
        match self {
            Self::Trivial => 1,
            Self::NonTrivialButMxpx => 17,
            Self::NonTrivial => 4,
        }
    }
}

/// The memory operands of an instruction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MxpOperands {
    pub offset1: U256,
    pub size1: U256,
    pub offset2: U256,
    pub size2: U256,
}

impl MxpOperands {
    pub fn from_frame(instruction: Instruction, frame: &OpcodeEvent) -> Result<Self, TraceError> {
        let item = |n| frame.stack_item(n);
        let operands = match instruction {
            Instruction::Sha3
            | Instruction::Log0
            | Instruction::Log1
            | Instruction::Log2
            | Instruction::Log3
            | Instruction::Log4
            | Instruction::Return
            | Instruction::Revert => Self {
                offset1: item(0)?,
                size1: item(1)?,
                ..Default::default()
            },
            Instruction::Msize => Self::default(),
            Instruction::CallDataCopy | Instruction::CodeCopy | Instruction::ReturnDataCopy => {
                Self {
                    offset1: item(0)?,
                    size1: item(2)?,
                    ..Default::default()
                }
            }
            Instruction::ExtCodeCopy => Self {
                offset1: item(1)?,
                size1: item(3)?,
                ..Default::default()
            },
            Instruction::Mload | Instruction::Mstore | Instruction::Mstore8 => Self {
                offset1: item(0)?,
                ..Default::default()
            },
            Instruction::Create | Instruction::Create2 => Self {
                offset1: item(1)?,
                size1: item(2)?,
                ..Default::default()
            },
            Instruction::Call | Instruction::CallCode => Self {
                offset1: item(3)?,
                size1: item(4)?,
                offset2: item(5)?,
                size2: item(6)?,
            },
            Instruction::DelegateCall | Instruction::StaticCall => Self {
                offset1: item(2)?,
                size1: item(3)?,
                offset2: item(4)?,
                size2: item(5)?,
            },
        };
        Ok(operands)
    }
}

/// Gas cost of a memory of `words` words.
pub fn memory_cost(words: u64) -> u64 {
    let square = words.saturating_mul(words);
    let quadratic = if square == u64::MAX {
        (words / 512).saturating_mul(words)
    } else {
        square / 512
    };
    G_MEMORY.saturating_mul(words).saturating_add(quadratic)
}

/// Memory size in words after touching `length` bytes at `offset`.
fn expanded_words(words: u64, offset: U256, length: U256) -> u64 {
    if length.is_zero() {
        return words;
    }
    let end = offset.saturating_add(length);
    let needed = end.saturating_add(31.into()) / 32;
    words.max(needed.low_u64())
}

fn two_pow_32() -> U256 {
    U256::one() << 32
}

fn two_pow_128() -> U256 {
    U256::one() << 128
}

/// One memory expansion, fully computed at capture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MxpOperation {
    pub instruction: Instruction,
    pub context_number: u32,
    pub deploys: bool,
    pub operands: MxpOperands,
    pub roob: bool,
    pub noop: bool,
    pub mxpx: bool,
    pub path: MxpPath,
    pub max_offset_1: U256,
    pub max_offset_2: U256,
    pub max_offset: U256,
    pub comp: bool,
    pub acc_1: U256,
    pub acc_2: U256,
    pub acc_3: U256,
    pub acc_4: U256,
    pub acc_a: U256,
    pub acc_w: U256,
    pub acc_q: U256,
    pub byte_qq: [u8; 4],
    pub byte_r: [u8; 4],
    pub expands: bool,
    pub words: u64,
    pub words_new: u64,
    pub c_mem: u64,
    pub c_mem_new: u64,
    pub quad_cost: u64,
    pub lin_cost: u64,
}

impl MxpOperation {
    /// Captures the memory expansion of the opcode about to run in `frame`.
    pub fn from_frame(frame: &OpcodeEvent) -> Result<Self, TraceError> {
        let instruction =
            Instruction::from_opcode(frame.opcode).ok_or(TraceError::UnexpectedOpcode {
                module: "mxp",
                opcode: frame.opcode,
            })?;
        let operands = MxpOperands::from_frame(instruction, frame)?;
        Ok(Self::new(
            instruction,
            operands,
            frame.memory_words,
            frame.context_number,
            frame.deploys,
        ))
    }

    pub fn new(
        instruction: Instruction,
        operands: MxpOperands,
        words: u64,
        context_number: u32,
        deploys: bool,
    ) -> Self {
        let MxpOperands {
            offset1,
            size1,
            offset2,
            size2,
        } = operands;
        let mxp_type = instruction.mxp_type();
        let huge = two_pow_128();
        let pair_roob =
            |offset: U256, size: U256| size >= huge || (offset >= huge && !size.is_zero());

        let roob = match mxp_type {
            MxpType::Type1 => false,
            MxpType::Type2 | MxpType::Type3 => offset1 >= huge,
            MxpType::Type4 => pair_roob(offset1, size1),
            MxpType::Type5 => pair_roob(offset1, size1) || pair_roob(offset2, size2),
        };
        let noop = match mxp_type {
            MxpType::Type1 => true,
            MxpType::Type4 => size1.is_zero(),
            MxpType::Type5 => size1.is_zero() && size2.is_zero(),
            MxpType::Type2 | MxpType::Type3 => false,
        };

        // Operands are below 2^128 here, so the sums cannot overflow.
        let pair_max = |offset: U256, size: U256| match size.is_zero() {
            true => U256::zero(),
            false => offset + size - 1,
        };
        let (max_offset_1, max_offset_2) = match (roob || noop, mxp_type) {
            (true, _) | (false, MxpType::Type1) => (U256::zero(), U256::zero()),
            (false, MxpType::Type2) => (offset1 + 31, U256::zero()),
            (false, MxpType::Type3) => (offset1, U256::zero()),
            (false, MxpType::Type4) => (pair_max(offset1, size1), U256::zero()),
            (false, MxpType::Type5) => (pair_max(offset1, size1), pair_max(offset2, size2)),
        };

        let (max_offset, mxpx) = match roob || noop {
            true => (U256::zero(), roob),
            false => {
                let max = max_offset_1.max(max_offset_2);
                (max, max >= two_pow_32())
            }
        };
        let path = match (roob || noop, mxpx) {
            (true, _) => MxpPath::Trivial,
            (false, true) => MxpPath::NonTrivialButMxpx,
            (false, false) => MxpPath::NonTrivial,
        };
        let non_trivial = path == MxpPath::NonTrivial;

        let mut byte_r = [0u8; 4];
        let mut acc_a = U256::zero();
        if non_trivial {
            let end = max_offset.low_u64() + 1;
            let words_a = end.div_ceil(32);
            let r = (words_a * 32 - end) as u8;
            acc_a = words_a.into();
            byte_r[0] = r + 224;
            byte_r[1] = r;
        }

        let expands = non_trivial && acc_a > U256::from(words);
        let words_new = match (non_trivial && expands, mxp_type) {
            (false, _) | (true, MxpType::Type1) => words,
            (true, MxpType::Type2) => expanded_words(words, offset1, 32.into()),
            (true, MxpType::Type3) => expanded_words(words, offset1, U256::one()),
            (true, MxpType::Type4) => expanded_words(words, offset1, size1),
            (true, MxpType::Type5) => expanded_words(words, offset1, size1)
                .max(expanded_words(words, offset2, size2)),
        };
        let c_mem = memory_cost(words);
        let c_mem_new = match non_trivial && expands {
            true => memory_cost(words_new),
            false => c_mem,
        };

        let comp = max_offset_1 >= max_offset_2;
        let (acc_1, acc_2) = match (roob, mxpx) {
            (true, _) => (U256::zero(), U256::zero()),
            (false, true) if max_offset_1 >= two_pow_32() => {
                (max_offset_1 - two_pow_32(), U256::zero())
            }
            (false, true) => (U256::zero(), max_offset_2 - two_pow_32()),
            (false, false) => (max_offset_1, max_offset_2),
        };
        let acc_3 = match comp {
            true => max_offset_1 - max_offset_2,
            false => max_offset_2 - max_offset_1 - 1,
        };
        let acc_4 = match (non_trivial, expands) {
            (false, _) => U256::zero(),
            (true, true) => acc_a - (words + 1),
            (true, false) => U256::from(words) - acc_a,
        };

        let mut acc_w = U256::zero();
        if non_trivial && mxp_type == MxpType::Type4 {
            let size = size1.low_u64();
            let words_w = size.div_ceil(32);
            let r = (words_w * 32 - size) as u8;
            acc_w = words_w.into();
            byte_r[2] = r + 224;
            byte_r[3] = r;
        }

        let mut acc_q = U256::zero();
        let mut byte_qq = [0u8; 4];
        if non_trivial {
            let square = words_new.saturating_mul(words_new);
            let (quotient, remainder) = (square / 512, square % 512);
            acc_q = (quotient % (1 << 32)).into();
            let [.., q26, q27, _, _, _, _] = quotient.to_be_bytes();
            let [.., r30, r31] = remainder.to_be_bytes();
            byte_qq = [q26, q27, r30, r31];
        }

        let (quad_cost, lin_cost) = match non_trivial {
            true => (
                c_mem_new - c_mem,
                instruction.billing().cost(size1.low_u64()),
            ),
            false => (0, 0),
        };

        let op = Self {
            instruction,
            context_number,
            deploys,
            operands,
            roob,
            noop,
            mxpx,
            path,
            max_offset_1,
            max_offset_2,
            max_offset,
            comp,
            acc_1,
            acc_2,
            acc_3,
            acc_4,
            acc_a,
            acc_w,
            acc_q,
            byte_qq,
            byte_r,
            expands,
            words,
            words_new,
            c_mem,
            c_mem_new,
            quad_cost,
            lin_cost,
        };
        log::debug!(
            "mxp {:?}: {:?}, gas {}",
            op.instruction,
            op.path,
            op.gas_mxp()
        );
        op
    }

    /// The linear cost actually charged. `RETURN` only pays the code deposit
    /// when it returns deployed code.
    pub fn effective_lin_cost(&self) -> u64 {
        match (self.instruction, self.deploys) {
            (Instruction::Return, false) => 0,
            _ => self.lin_cost,
        }
    }

    pub fn gas_mxp(&self) -> u64 {
        self.quad_cost + self.effective_lin_cost()
    }

    pub fn size_1_nonzero_no_mxpx(&self) -> bool {
        !self.mxpx && !self.operands.size1.is_zero()
    }

    pub fn size_2_nonzero_no_mxpx(&self) -> bool {
        !self.mxpx && !self.operands.size2.is_zero()
    }

    /// Whether the instruction touches a non-empty memory range.
    pub fn mtntop(&self) -> bool {
        matches!(self.instruction.mxp_type(), MxpType::Type4 | MxpType::Type5)
            && (self.size_1_nonzero_no_mxpx() || self.size_2_nonzero_no_mxpx())
    }
}

impl RowCount for MxpOperation {
    fn row_count(&self) -> usize {
        self.path.row_count()
    }
}
