//! Prometheus metrics for the overlay node.
//!
//! [`NodeMetrics`] owns a dedicated [`Registry`]; [`NodeMetrics::encode`]
//! renders it in the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, Histogram, HistogramOpts, IntCounter, IntGauge,
    Opts, Registry, TextEncoder,
};
use tint_ledger::BlockReceipt;

use crate::NodeError;

pub struct NodeMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    pub txs_accepted: IntCounter,
    pub txs_rejected: IntCounter,
    /// Transactions seen again after they were finalized.
    pub txs_duplicate: IntCounter,
    pub blocks_applied: IntCounter,
    pub blocks_rolled_back: IntCounter,
    /// Blocks aborted by a fatal ledger error.
    pub blocks_failed: IntCounter,
    pub conserved_issued: IntCounter,
    pub conserved_forfeited: IntCounter,
    pub conserved_burnt: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    pub finalized_outputs: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    pub block_apply_time_ms: Histogram,
}

fn counter(registry: &Registry, name: &str, help: &str) -> IntCounter {
    register_int_counter_with_registry!(Opts::new(name, help), registry)
        .unwrap_or_else(|e| panic!("failed to register {name} counter: {e}"))
}

impl NodeMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let txs_accepted = counter(&registry, "tint_txs_accepted_total", "Transactions finalized");
        let txs_rejected = counter(&registry, "tint_txs_rejected_total", "Transactions rejected");
        let txs_duplicate = counter(
            &registry,
            "tint_txs_duplicate_total",
            "Transactions that were already finalized",
        );
        let blocks_applied = counter(&registry, "tint_blocks_applied_total", "Blocks applied");
        let blocks_rolled_back =
            counter(&registry, "tint_blocks_rolled_back_total", "Blocks rolled back");
        let blocks_failed = counter(
            &registry,
            "tint_blocks_failed_total",
            "Blocks aborted by a fatal ledger error",
        );
        let conserved_issued = counter(
            &registry,
            "tint_conserved_issued_total",
            "Conserved value created by genesis",
        );
        let conserved_forfeited = counter(
            &registry,
            "tint_conserved_forfeited_total",
            "Conserved value left unassigned by accepted transactions",
        );
        let conserved_burnt = counter(
            &registry,
            "tint_conserved_burnt_total",
            "Conserved value burnt by proposal fees",
        );

        let finalized_outputs = register_int_gauge_with_registry!(
            Opts::new("tint_finalized_outputs", "Finalized outputs in the ledger"),
            registry
        )
        .expect("failed to register finalized_outputs gauge");

        let block_apply_time_ms = register_histogram_with_registry!(
            HistogramOpts::new("tint_block_apply_time_ms", "Block application time in milliseconds")
                .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0]),
            registry
        )
        .expect("failed to register block_apply_time_ms histogram");

        Self {
            registry,
            txs_accepted,
            txs_rejected,
            txs_duplicate,
            blocks_applied,
            blocks_rolled_back,
            blocks_failed,
            conserved_issued,
            conserved_forfeited,
            conserved_burnt,
            finalized_outputs,
            block_apply_time_ms,
        }
    }

    pub fn record_block(&self, receipt: &BlockReceipt, elapsed_ms: f64) {
        self.blocks_applied.inc();
        self.txs_accepted.inc_by(receipt.accepted as u64);
        self.txs_rejected.inc_by(receipt.rejected as u64);
        self.txs_duplicate.inc_by(receipt.already_finalized as u64);
        self.conserved_issued.inc_by(receipt.issued);
        self.conserved_forfeited.inc_by(receipt.forfeited);
        self.conserved_burnt.inc_by(receipt.burnt);
        self.block_apply_time_ms.observe(elapsed_ms);
    }

    pub fn record_rollback(&self) {
        self.blocks_rolled_back.inc();
    }

    /// Render every metric in the text exposition format.
    pub fn encode(&self) -> Result<String, NodeError> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buf)
            .map_err(|e| NodeError::Metrics(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| NodeError::Metrics(e.to_string()))
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}
