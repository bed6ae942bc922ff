//! Text and JSON rendering of decoded records.

use anyhow::Result;
use chainfmt_core::{BlockIndexRecord, BlockUndo, Coin};
use serde_json::{json, Map, Value};

pub fn index_record_json(pos: u32, version: Option<i32>, record: &BlockIndexRecord) -> Result<Value> {
    let mut map = Map::new();
    map.insert("pos".into(), json!(pos));
    if let Some(version) = version {
        map.insert("client_version".into(), json!(version));
    }
    for (name, value) in record.field_values()? {
        map.insert(name.into(), Value::String(value));
    }
    map.insert("block_hash".into(), json!(record.header.hash().to_string()));
    Ok(Value::Object(map))
}

pub fn index_record_text(pos: u32, version: Option<i32>, record: &BlockIndexRecord) -> Result<String> {
    let mut out = format!("record @ {pos}\n");
    if let Some(version) = version {
        out.push_str(&format!("  {:<14} {version}\n", "client_version"));
    }
    for (name, value) in record.field_values()? {
        out.push_str(&format!("  {name:<14} {value}\n"));
    }
    out.push_str(&format!("  {:<14} {}\n", "block_hash", record.header.hash()));
    Ok(out)
}

fn coin_json(coin: &Coin) -> Value {
    json!({
        "height": coin.height,
        "coinbase": coin.is_coinbase,
        "value": coin.out.value,
        "script_pubkey": hex::encode(&coin.out.script_pubkey),
    })
}

pub fn undo_json(pos: u32, undo: &BlockUndo) -> Result<Value> {
    let txs: Vec<Value> = undo
        .tx_undo()
        .iter()
        .map(|tu| Value::Array(tu.undo_coins().iter().map(coin_json).collect()))
        .collect();
    Ok(json!({
        "pos": pos,
        "size": undo.serialize_size()?,
        "txs": undo.len(),
        "coins": undo.coin_count(),
        "tx_undo": txs,
    }))
}

pub fn undo_text(pos: u32, undo: &BlockUndo) -> Result<String> {
    let mut out = format!(
        "block undo @ {pos}: {} bytes, {} txs, {} coins\n",
        undo.serialize_size()?,
        undo.len(),
        undo.coin_count()
    );
    for (i, tu) in undo.tx_undo().iter().enumerate() {
        out.push_str(&format!("  tx {i}: {} coins\n", tu.len()));
        for coin in tu.undo_coins() {
            out.push_str(&format!(
                "    height={} coinbase={} value={} script={}\n",
                coin.height,
                coin.is_coinbase,
                coin.out.value,
                hex::encode(&coin.out.script_pubkey)
            ));
        }
    }
    Ok(out)
}
