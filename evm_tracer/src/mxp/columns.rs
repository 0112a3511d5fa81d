crate::declare_columns! {
    /// Columns of the memory-expansion trace.
    pub enum MxpColumn in "mxp" {
        Acc1 => "ACC_1": 17,
        Acc2 => "ACC_2": 17,
        Acc3 => "ACC_3": 17,
        Acc4 => "ACC_4": 17,
        AccA => "ACC_A": 17,
        AccQ => "ACC_Q": 17,
        AccW => "ACC_W": 17,
        Byte1 => "BYTE_1": 1,
        Byte2 => "BYTE_2": 1,
        Byte3 => "BYTE_3": 1,
        Byte4 => "BYTE_4": 1,
        ByteA => "BYTE_A": 1,
        ByteQ => "BYTE_Q": 1,
        ByteQq => "BYTE_QQ": 1,
        ByteR => "BYTE_R": 1,
        ByteW => "BYTE_W": 1,
        CMem => "C_MEM": 8,
        CMemNew => "C_MEM_NEW": 8,
        Cn => "CN": 8,
        Comp => "COMP": 1,
        Ct => "CT": 1,
        Deploys => "DEPLOYS": 1,
        Expands => "EXPANDS": 1,
        GasMxp => "GAS_MXP": 8,
        Gbyte => "GBYTE": 8,
        Gword => "GWORD": 8,
        Inst => "INST": 1,
        LinCost => "LIN_COST": 8,
        MaxOffset => "MAX_OFFSET": 17,
        MaxOffset1 => "MAX_OFFSET_1": 17,
        MaxOffset2 => "MAX_OFFSET_2": 17,
        Mtntop => "MTNTOP": 1,
        MxpType1 => "MXP_TYPE_1": 1,
        MxpType2 => "MXP_TYPE_2": 1,
        MxpType3 => "MXP_TYPE_3": 1,
        MxpType4 => "MXP_TYPE_4": 1,
        MxpType5 => "MXP_TYPE_5": 1,
        Mxpx => "MXPX": 1,
        Noop => "NOOP": 1,
        Offset1Hi => "OFFSET_1_HI": 16,
        Offset1Lo => "OFFSET_1_LO": 16,
        Offset2Hi => "OFFSET_2_HI": 16,
        Offset2Lo => "OFFSET_2_LO": 16,
        QuadCost => "QUAD_COST": 8,
        Roob => "ROOB": 1,
        Size1Hi => "SIZE_1_HI": 16,
        Size1Lo => "SIZE_1_LO": 16,
        Size1NonzeroNoMxpx => "SIZE_1_NONZERO_NO_MXPX": 1,
        Size2Hi => "SIZE_2_HI": 16,
        Size2Lo => "SIZE_2_LO": 16,
        Size2NonzeroNoMxpx => "SIZE_2_NONZERO_NO_MXPX": 1,
        Stamp => "STAMP": 4,
        Words => "WORDS": 8,
        WordsNew => "WORDS_NEW": 8,
    }
}
