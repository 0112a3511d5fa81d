//! The module registry, driven by the replayed execution events.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::TraceError;
use crate::helpers::{Euc, Wcp};
use crate::module::{Module, ModuleKind};
use crate::mxp::Mxp;
use crate::rlp_addr::RlpAddr;
use crate::rlp_txn::RlpTxn;
use crate::trace::ModuleTrace;
use crate::txn_data::TxnData;
use crate::witness::{BlockHeader, Conflation, ExecutionEvent};

/// File holding the per-module line counts next to the traces.
pub const LINE_COUNTS_FILE: &str = "line_counts.json";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracerConfig {
    /// Chain the signed transactions must commit to. Unprotected legacy
    /// transactions are accepted on any chain.
    pub chain_id: Option<u64>,
    /// Modules to trace.
    pub modules: Vec<ModuleKind>,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            chain_id: None,
            modules: ModuleKind::ALL.to_vec(),
        }
    }
}

impl TracerConfig {
    pub fn is_enabled(&self, kind: ModuleKind) -> bool {
        self.modules.contains(&kind)
    }
}

/// Per-module line counts, keyed by module.
pub type LineCounts = BTreeMap<ModuleKind, usize>;

#[derive(Debug)]
pub struct ZkTracer {
    config: TracerConfig,
    mxp: Mxp,
    rlp_addr: RlpAddr,
    txn_data: TxnData,
    rlp_txn: RlpTxn,
    current_block: Option<BlockHeader>,
    /// Whether the last transaction's scope is still open, waiting for a
    /// possible `PopTransaction`.
    pending_tx: bool,
}

impl Default for ZkTracer {
    fn default() -> Self {
        Self::new(TracerConfig::default())
    }
}

impl ZkTracer {
    pub fn new(config: TracerConfig) -> Self {
        Self {
            rlp_txn: RlpTxn::new(config.chain_id),
            config,
            mxp: Mxp::default(),
            rlp_addr: RlpAddr::default(),
            txn_data: TxnData::default(),
            current_block: None,
            pending_tx: false,
        }
    }

    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    pub fn mxp(&self) -> &Mxp {
        &self.mxp
    }

    pub fn rlp_addr(&self) -> &RlpAddr {
        &self.rlp_addr
    }

    pub fn txn_data(&self) -> &TxnData {
        &self.txn_data
    }

    pub fn rlp_txn(&self) -> &RlpTxn {
        &self.rlp_txn
    }

    /// Word comparisons requested by the traced modules.
    pub fn wcp(&self) -> &Wcp {
        self.txn_data.wcp()
    }

    /// Euclidean divisions requested by the traced modules.
    pub fn euc(&self) -> &Euc {
        self.txn_data.euc()
    }

    fn modules(&self) -> impl Iterator<Item = &dyn Module> + '_ {
        let modules: [&dyn Module; 4] = [&self.mxp, &self.rlp_addr, &self.txn_data, &self.rlp_txn];
        modules
            .into_iter()
            .filter(move |module| self.config.is_enabled(module.kind()))
    }

    fn dispatch(
        &mut self,
        mut hook: impl FnMut(&mut dyn Module) -> Result<(), TraceError>,
    ) -> Result<(), TraceError> {
        let modules: [&mut dyn Module; 4] = [
            &mut self.mxp,
            &mut self.rlp_addr,
            &mut self.txn_data,
            &mut self.rlp_txn,
        ];
        for module in modules {
            if self.config.is_enabled(module.kind()) {
                hook(module)?;
            }
        }
        Ok(())
    }

    fn close_pending_tx(&mut self) -> Result<(), TraceError> {
        if self.pending_tx {
            self.dispatch(|module| module.exit_scope())?;
            self.pending_tx = false;
        }
        Ok(())
    }

    /// Feeds one execution event to every enabled module.
    pub fn apply(&mut self, event: &ExecutionEvent) -> Result<(), TraceError> {
        match event {
            ExecutionEvent::BlockStart(header) => {
                info!(block = header.number, "tracing block");
                self.current_block = Some(header.clone());
                self.dispatch(|module| module.trace_start_block(header))
            }
            ExecutionEvent::BlockEnd(header) => {
                self.current_block.take().ok_or(TraceError::NoOpenBlock)?;
                self.close_pending_tx()?;
                self.dispatch(|module| module.trace_end_block(header))
            }
            ExecutionEvent::TransactionStart(tx) => {
                if self.current_block.is_none() {
                    return Err(TraceError::NoOpenBlock);
                }
                debug!(from = ?tx.from, nonce = tx.nonce, "tracing transaction");
                self.close_pending_tx()?;
                self.dispatch(|module| {
                    module.enter_scope();
                    Ok(())
                })?;
                self.pending_tx = true;
                self.dispatch(|module| module.trace_start_tx(tx))
            }
            ExecutionEvent::TransactionEnd(outcome) => {
                self.dispatch(|module| module.trace_end_tx(outcome))
            }
            ExecutionEvent::PopTransaction => {
                if !self.pending_tx {
                    return Err(TraceError::NoOpenTransaction);
                }
                debug!("dropping the last transaction");
                self.dispatch(|module| module.pop_scope())?;
                self.pending_tx = false;
                Ok(())
            }
            ExecutionEvent::Opcode(frame) => self.dispatch(|module| module.trace_pre_opcode(frame)),
            ExecutionEvent::EnterScope => self.dispatch(|module| {
                module.enter_scope();
                Ok(())
            }),
            ExecutionEvent::ExitScope { reverted: false } => {
                self.dispatch(|module| module.exit_scope())
            }
            ExecutionEvent::ExitScope { reverted: true } => {
                self.dispatch(|module| module.pop_scope())
            }
        }
    }

    /// Feeds every event of `conflation`, in order.
    pub fn replay(&mut self, conflation: &Conflation) -> Result<(), TraceError> {
        conflation.events.iter().try_for_each(|event| self.apply(event))
    }

    /// Rows each enabled module will emit.
    pub fn line_counts(&self) -> LineCounts {
        self.modules()
            .map(|module| (module.kind(), module.line_count()))
            .collect()
    }

    /// Emits the trace of every enabled module.
    pub fn commit(&self) -> Result<Vec<ModuleTrace>, TraceError> {
        self.modules()
            .map(|module| {
                let expected = module.line_count();
                let trace = module.commit()?;
                if trace.line_count() != expected {
                    return Err(TraceError::LineCountMismatch {
                        module: module.kind().key(),
                        expected,
                        actual: trace.line_count(),
                    });
                }
                log::info!("{}: {} rows", module.kind(), expected);
                Ok(trace)
            })
            .collect()
    }

    /// Writes every module trace and the line counts into `dir`.
    pub fn write_to(&self, dir: &Path) -> Result<LineCounts, TraceError> {
        fs::create_dir_all(dir)?;
        for trace in self.commit()? {
            trace.write_to(dir)?;
        }
        let line_counts = self.line_counts();
        let file = fs::File::create(dir.join(LINE_COUNTS_FILE))?;
        serde_json::to_writer_pretty(file, &line_counts)?;
        Ok(line_counts)
    }
}
