crate::declare_columns! {
    /// Columns of the transaction RLP trace.
    pub enum RlpTxnColumn in "rlptxn" {
        AbsTxNum => "ABS_TX_NUM": 8,
        AbsTxNumInfiny => "ABS_TX_NUM_INFINY": 4,
        Acc1 => "ACC_1": 32,
        Acc2 => "ACC_2": 32,
        AccBytesize => "ACC_BYTESIZE": 2,
        AccessTupleBytesize => "ACCESS_TUPLE_BYTESIZE": 4,
        AddrHi => "ADDR_HI": 8,
        AddrLo => "ADDR_LO": 32,
        Bit => "BIT": 1,
        BitAcc => "BIT_ACC": 1,
        Byte1 => "BYTE_1": 1,
        Byte2 => "BYTE_2": 1,
        CodeFragmentIndex => "CODE_FRAGMENT_INDEX": 8,
        Counter => "COUNTER": 2,
        DataGasCost => "DATA_GAS_COST": 8,
        DataHi => "DATA_HI": 32,
        DataLo => "DATA_LO": 32,
        Depth1 => "DEPTH_1": 1,
        Depth2 => "DEPTH_2": 1,
        Done => "DONE": 1,
        IndexData => "INDEX_DATA": 8,
        IndexLt => "INDEX_LT": 8,
        IndexLx => "INDEX_LX": 8,
        Input1 => "INPUT_1": 32,
        Input2 => "INPUT_2": 32,
        IsPrefix => "IS_PREFIX": 1,
        LcCorrection => "LC_CORRECTION": 1,
        Limb => "LIMB": 32,
        LimbConstructed => "LIMB_CONSTRUCTED": 1,
        Lt => "LT": 1,
        Lx => "LX": 1,
        NAddr => "nADDR": 4,
        NBytes => "nBYTES": 2,
        NKeys => "nKEYS": 4,
        NKeysPerAddr => "nKEYS_PER_ADDR": 4,
        NStep => "nSTEP": 2,
        Phase1 => "PHASE_1": 1,
        Phase10 => "PHASE_10": 1,
        Phase11 => "PHASE_11": 1,
        Phase12 => "PHASE_12": 1,
        Phase13 => "PHASE_13": 1,
        Phase14 => "PHASE_14": 1,
        Phase15 => "PHASE_15": 1,
        Phase2 => "PHASE_2": 1,
        Phase3 => "PHASE_3": 1,
        Phase4 => "PHASE_4": 1,
        Phase5 => "PHASE_5": 1,
        Phase6 => "PHASE_6": 1,
        Phase7 => "PHASE_7": 1,
        Phase8 => "PHASE_8": 1,
        Phase9 => "PHASE_9": 1,
        PhaseEnd => "PHASE_END": 1,
        PhaseId => "PHASE_ID": 2,
        PhaseSize => "PHASE_SIZE": 8,
        Power => "POWER": 32,
        RequiresEvmExecution => "REQUIRES_EVM_EXECUTION": 1,
        RlpLtBytesize => "RLP_LT_BYTESIZE": 4,
        RlpLxBytesize => "RLP_LX_BYTESIZE": 4,
        Type => "TYPE": 2,
    }
}

impl RlpTxnColumn {
    /// The one-hot selector column of `phase`, numbered from 1.
    pub(crate) const PHASES: [RlpTxnColumn; 15] = [
        Self::Phase1,
        Self::Phase2,
        Self::Phase3,
        Self::Phase4,
        Self::Phase5,
        Self::Phase6,
        Self::Phase7,
        Self::Phase8,
        Self::Phase9,
        Self::Phase10,
        Self::Phase11,
        Self::Phase12,
        Self::Phase13,
        Self::Phase14,
        Self::Phase15,
    ];
}
