//! Block fixtures in JSON, as produced by the base-chain decoder.

use std::path::Path;

use tint_ledger::Block;

use crate::NodeError;

/// Read a JSON array of blocks.
pub fn load_blocks(path: &Path) -> Result<Vec<Block>, NodeError> {
    let content = std::fs::read_to_string(path)?;
    parse_blocks(&content)
        .map_err(|e| NodeError::BlockFile(format!("{}: {e}", path.display())))
}

/// Parse a JSON array of blocks, which must be in non-decreasing height order.
pub fn parse_blocks(json: &str) -> Result<Vec<Block>, NodeError> {
    let blocks: Vec<Block> =
        serde_json::from_str(json).map_err(|e| NodeError::BlockFile(e.to_string()))?;
    if let Some(pair) = blocks.windows(2).find(|w| w[1].height < w[0].height) {
        return Err(NodeError::BlockFile(format!(
            "block at height {} follows height {}",
            pair[1].height, pair[0].height
        )));
    }
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_block() {
        let json = format!(
            r#"[{{"height": 111, "txs": [{{"tx_id": "{id}", "outputs": [
                {{"index": 0, "value": 10, "tx_id": "{id}", "block_height": 111, "metadata": "0101000a"}}
            ]}}]}}]"#,
            id = "00".repeat(32)
        );
        let blocks = parse_blocks(&json).unwrap();
        assert_eq!(blocks.len(), 1);
        let tx = &blocks[0].txs[0];
        assert!(tx.script_valid);
        assert!(tx.spends.is_empty());
        assert_eq!(tx.outputs[0].metadata.as_deref(), Some(&[1u8, 1, 0, 10][..]));
    }

    #[test]
    fn rejects_out_of_order_heights() {
        let json = r#"[{"height": 5, "txs": []}, {"height": 4, "txs": []}]"#;
        assert!(matches!(parse_blocks(json), Err(NodeError::BlockFile(_))));
    }
}
