//! The overlay node: one ledger store, the block applier, and metrics.

use std::sync::Arc;
use std::time::Instant;

use rayon::{ThreadPool, ThreadPoolBuilder};
use tint_ledger::{
    check_spend, ledger_digest, summarize, Block, BlockApplier, BlockReceipt, LedgerSummary,
    RollbackReceipt, Spendability,
};
use tint_store::OutputStore;
use tint_store_memory::MemoryOutputStore;
use tint_types::{BlockHeight, ChainParams, FinalizedOutput, OutputKey};

use crate::{NodeConfig, NodeError, NodeMetrics};

pub struct OverlayNode {
    pub config: NodeConfig,
    store: Arc<dyn OutputStore>,
    applier: BlockApplier,
    pool: ThreadPool,
    pub metrics: Arc<NodeMetrics>,
}

impl OverlayNode {
    /// Create a node backed by an in-memory store.
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        Self::with_store(config, Arc::new(MemoryOutputStore::new()))
    }

    pub fn with_store(config: NodeConfig, store: Arc<dyn OutputStore>) -> Result<Self, NodeError> {
        let params = config.chain_params();
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.classification_threads)
            .thread_name(|i| format!("tint-classify-{i}"))
            .build()
            .map_err(|e| NodeError::Config(format!("classification pool: {e}")))?;

        tracing::info!(
            network = config.network.as_str(),
            genesis_tx = %params.genesis_tx_id,
            genesis_height = params.genesis_height,
            rule_sets = params.rules.sets().len(),
            threads = pool.current_num_threads(),
            "overlay node initialised"
        );

        let node = Self {
            config,
            store,
            applier: BlockApplier::new(params),
            pool,
            metrics: Arc::new(NodeMetrics::new()),
        };
        node.refresh_gauges()?;
        Ok(node)
    }

    pub fn params(&self) -> &ChainParams {
        self.applier.params()
    }

    pub fn store(&self) -> &Arc<dyn OutputStore> {
        &self.store
    }

    /// Apply one block. Blocks must arrive in height order.
    pub fn apply_block(&self, block: &Block) -> Result<BlockReceipt, NodeError> {
        if let Some(tip) = self.store.tip_height()? {
            if block.height < tip {
                tracing::warn!(height = block.height, tip, "applying a block below the tip");
            }
        }

        let started = Instant::now();
        let result = self.pool.install(|| self.applier.apply(self.store.as_ref(), block));
        let receipt = match result {
            Ok(receipt) => receipt,
            Err(e) => {
                self.metrics.blocks_failed.inc();
                self.refresh_gauges()?;
                return Err(e.into());
            }
        };

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.metrics.record_block(&receipt, elapsed_ms);
        self.refresh_gauges()?;
        for tx in &receipt.txs {
            tracing::trace!(tx_id = %tx.tx_id, outcome = ?tx.outcome, "transaction processed");
        }
        Ok(receipt)
    }

    /// Apply blocks in order, stopping at the first fatal error.
    pub fn apply_blocks<'a, I>(&self, blocks: I) -> Result<Vec<BlockReceipt>, NodeError>
    where
        I: IntoIterator<Item = &'a Block>,
    {
        blocks.into_iter().map(|b| self.apply_block(b)).collect()
    }

    pub fn rollback_block(&self, height: BlockHeight) -> Result<RollbackReceipt, NodeError> {
        let receipt = self.applier.rollback(self.store.as_ref(), height)?;
        self.metrics.record_rollback();
        self.refresh_gauges()?;
        Ok(receipt)
    }

    /// Whether `key` may be spent by a transaction at `height`.
    pub fn check_spend(&self, key: &OutputKey, height: BlockHeight) -> Result<Spendability, NodeError> {
        Ok(check_spend(self.store.as_ref(), key, height)?)
    }

    pub fn output(&self, key: &OutputKey) -> Result<Option<FinalizedOutput>, NodeError> {
        Ok(self.store.get_output(key)?)
    }

    pub fn summary(&self) -> Result<LedgerSummary, NodeError> {
        Ok(summarize(self.store.as_ref())?)
    }

    pub fn digest(&self) -> Result<[u8; 32], NodeError> {
        Ok(ledger_digest(self.store.as_ref())?)
    }

    fn refresh_gauges(&self) -> Result<(), NodeError> {
        let count = self.store.output_count()?;
        self.metrics
            .finalized_outputs
            .set(i64::try_from(count).unwrap_or(i64::MAX));
        Ok(())
    }
}
