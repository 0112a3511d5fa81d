crate::declare_columns! {
    /// Columns of the contract address derivation trace.
    pub enum RlpAddrColumn in "rlpaddr" {
        Acc => "ACC": 8,
        AccBytesize => "ACC_BYTESIZE": 1,
        AddrHi => "ADDR_HI": 4,
        AddrLo => "ADDR_LO": 16,
        Bit1 => "BIT1": 1,
        BitAcc => "BIT_ACC": 1,
        Byte1 => "BYTE1": 1,
        Counter => "COUNTER": 1,
        DepAddrHi => "DEP_ADDR_HI": 4,
        DepAddrLo => "DEP_ADDR_LO": 16,
        Index => "INDEX": 1,
        KecHi => "KEC_HI": 16,
        KecLo => "KEC_LO": 16,
        Lc => "LC": 1,
        Limb => "LIMB": 16,
        NBytes => "nBYTES": 1,
        Nonce => "NONCE": 8,
        Power => "POWER": 16,
        RawAddrHi => "RAW_ADDR_HI": 16,
        Recipe => "RECIPE": 1,
        Recipe1 => "RECIPE_1": 1,
        Recipe2 => "RECIPE_2": 1,
        SaltHi => "SALT_HI": 16,
        SaltLo => "SALT_LO": 16,
        SelectorKeccakRes => "SELECTOR_KECCAK_RES": 1,
        Stamp => "STAMP": 3,
        TinyNonZeroNonce => "TINY_NON_ZERO_NONCE": 1,
    }
}
