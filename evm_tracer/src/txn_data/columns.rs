crate::declare_columns! {
    /// Columns of the transaction metadata trace.
    pub enum TxnDataColumn in "txndata" {
        AbsTxNum => "ABS_TX_NUM": 2,
        AbsTxNumMax => "ABS_TX_NUM_MAX": 2,
        ArgOneLo => "ARG_ONE_LO": 16,
        ArgTwoLo => "ARG_TWO_LO": 16,
        Basefee => "BASEFEE": 16,
        BlockGasLimit => "BLOCK_GAS_LIMIT": 8,
        CallDataSize => "CALL_DATA_SIZE": 4,
        CodeFragmentIndex => "CODE_FRAGMENT_INDEX": 4,
        CoinbaseHi => "COINBASE_HI": 4,
        CoinbaseLo => "COINBASE_LO": 16,
        CopyTxcd => "COPY_TXCD": 1,
        Ct => "CT": 1,
        EucFlag => "EUC_FLAG": 1,
        FromHi => "FROM_HI": 4,
        FromLo => "FROM_LO": 16,
        GasCumulative => "GAS_CUMULATIVE": 16,
        GasInitiallyAvailable => "GAS_INITIALLY_AVAILABLE": 16,
        GasLeftover => "GAS_LEFTOVER": 16,
        GasLimit => "GAS_LIMIT": 8,
        GasPrice => "GAS_PRICE": 8,
        InitCodeSize => "INIT_CODE_SIZE": 4,
        InitialBalance => "INITIAL_BALANCE": 16,
        Inst => "INST": 1,
        IsDep => "IS_DEP": 1,
        IsLastTxOfBlock => "IS_LAST_TX_OF_BLOCK": 1,
        Nonce => "NONCE": 8,
        OutgoingHi => "OUTGOING_HI": 8,
        OutgoingLo => "OUTGOING_LO": 16,
        OutgoingRlpTxnrcpt => "OUTGOING_RLP_TXNRCPT": 16,
        PhaseRlpTxn => "PHASE_RLP_TXN": 1,
        PhaseRlpTxnrcpt => "PHASE_RLP_TXNRCPT": 1,
        PriorityFeePerGas => "PRIORITY_FEE_PER_GAS": 16,
        RefundCounter => "REFUND_COUNTER": 16,
        RefundEffective => "REFUND_EFFECTIVE": 16,
        RelBlock => "REL_BLOCK": 2,
        RelTxNum => "REL_TX_NUM": 2,
        RelTxNumMax => "REL_TX_NUM_MAX": 2,
        RequiresEvmExecution => "REQUIRES_EVM_EXECUTION": 1,
        Res => "RES": 8,
        StatusCode => "STATUS_CODE": 1,
        ToHi => "TO_HI": 4,
        ToLo => "TO_LO": 16,
        Type0 => "TYPE0": 1,
        Type1 => "TYPE1": 1,
        Type2 => "TYPE2": 1,
        Value => "VALUE": 16,
        WcpFlag => "WCP_FLAG": 1,
    }
}
