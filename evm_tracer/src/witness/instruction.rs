/// The opcodes that touch memory, the only ones the memory-expansion module
/// is interested in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Instruction {
    Sha3,
    CallDataCopy,
    CodeCopy,
    ExtCodeCopy,
    ReturnDataCopy,
    Mload,
    Mstore,
    Mstore8,
    Msize,
    Log0,
    Log1,
    Log2,
    Log3,
    Log4,
    Create,
    Call,
    CallCode,
    Return,
    DelegateCall,
    Create2,
    StaticCall,
    Revert,
}

impl Instruction {
    pub const fn from_opcode(opcode: u8) -> Option<Self> {
        Some(match opcode {
            0x20 => Self::Sha3,
            0x37 => Self::CallDataCopy,
            0x39 => Self::CodeCopy,
            0x3c => Self::ExtCodeCopy,
            0x3e => Self::ReturnDataCopy,
            0x51 => Self::Mload,
            0x52 => Self::Mstore,
            0x53 => Self::Mstore8,
            0x59 => Self::Msize,
            0xa0 => Self::Log0,
            0xa1 => Self::Log1,
            0xa2 => Self::Log2,
            0xa3 => Self::Log3,
            0xa4 => Self::Log4,
            0xf0 => Self::Create,
            0xf1 => Self::Call,
            0xf2 => Self::CallCode,
            0xf3 => Self::Return,
            0xf4 => Self::DelegateCall,
            0xf5 => Self::Create2,
            0xfa => Self::StaticCall,
            0xfd => Self::Revert,
            _ => return None,
        })
    }

    pub const fn opcode(self) -> u8 {
        match self {
            Self::Sha3 => 0x20,
            Self::CallDataCopy => 0x37,
            Self::CodeCopy => 0x39,
            Self::ExtCodeCopy => 0x3c,
            Self::ReturnDataCopy => 0x3e,
            Self::Mload => 0x51,
            Self::Mstore => 0x52,
            Self::Mstore8 => 0x53,
            Self::Msize => 0x59,
            Self::Log0 => 0xa0,
            Self::Log1 => 0xa1,
            Self::Log2 => 0xa2,
            Self::Log3 => 0xa3,
            Self::Log4 => 0xa4,
            Self::Create => 0xf0,
            Self::Call => 0xf1,
            Self::CallCode => 0xf2,
            Self::Return => 0xf3,
            Self::DelegateCall => 0xf4,
            Self::Create2 => 0xf5,
            Self::StaticCall => 0xfa,
            Self::Revert => 0xfd,
        }
    }
}
