//! End-to-end flow: write undo data for connected blocks, record its position
//! in the block index, restart, then disconnect the blocks from the stored
//! data.

use std::collections::HashMap;

use chainfmt_core::{BlockHeader, BlockIndexRecord, BlockUndo, Coin, FormatConfig, Hash256, TxOut, TxUndo};
use chainfmt_store::{disconnect_block, DisconnectResult, IndexFile, UndoFile};

type OutPoint = (Hash256, u32);

fn outpoint(seed: u8, index: u32) -> OutPoint {
    (Hash256([seed; 32]), index)
}

fn coin(value: u64, height: u32) -> Coin {
    Coin::new(TxOut { value, script_pubkey: vec![0x00, 0x14, 0xAA, 0xBB] }, height, false)
}

/// Undo data and spent outpoints for a block whose non-coinbase
/// transactions each spend `inputs_per_tx` coins.
fn make_block_undo(height: u32, txs: u8, inputs_per_tx: u32) -> (BlockUndo, Vec<Vec<OutPoint>>) {
    let mut undo = BlockUndo::with_capacity(txs as usize);
    let mut spent = Vec::new();
    for t in 0..txs {
        let seed = (height as u8).wrapping_mul(16).wrapping_add(t);
        let coins = (0..inputs_per_tx).map(|i| coin(u64::from(i) + 1, height - 1)).collect::<Vec<_>>();
        spent.push((0..inputs_per_tx).map(|i| outpoint(seed, i)).collect());
        undo.add_tx_undo(TxUndo::from(coins));
    }
    (undo, spent)
}

fn make_record(height: i32, undo_pos: u32) -> BlockIndexRecord {
    BlockIndexRecord {
        height,
        status: 0x1D,
        tx_count: 4,
        file: 0,
        data_pos: 8 + 1_000 * height as u32,
        undo_pos,
        header: BlockHeader { version: 4, time: 1_600_000_000 + height as u32, ..Default::default() },
    }
}

#[test]
fn undo_survives_restart_and_disconnects_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = FormatConfig::default();
    let undo_path = dir.path().join("rev00000.dat");
    let index_path = dir.path().join("index.dat");

    let mut expected_spent = Vec::new();
    {
        let undo_file = UndoFile::open(&undo_path, cfg).unwrap();
        let index_file = IndexFile::open(&index_path, cfg).unwrap();
        for height in 1..=3u32 {
            let (undo, spent) = make_block_undo(height, 3, height);
            let pos = undo_file.append(&undo).unwrap();
            index_file.append(&make_record(height as i32, pos)).unwrap();
            expected_spent.push(spent);
        }
        undo_file.sync().unwrap();
        index_file.sync().unwrap();
    }

    let undo_file = UndoFile::open(&undo_path, cfg).unwrap();
    let index_file = IndexFile::open(&index_path, cfg).unwrap();
    let index = index_file.load_all::<BlockHeader>().unwrap();
    assert_eq!(index.len(), 3);

    let mut view: HashMap<OutPoint, Coin> = HashMap::new();
    for (_, record) in index.iter().rev() {
        let undo: BlockUndo = undo_file.read_for(record).unwrap().expect("undo written for every block");
        let spent = &expected_spent[record.height as usize - 1];
        assert_eq!(undo.coin_count(), 3 * record.height as usize);
        assert_eq!(disconnect_block(undo, spent, &mut view), DisconnectResult::Ok);
    }
    assert_eq!(view.len(), 3 + 6 + 9);
}

#[test]
fn replaying_disconnect_is_unclean() {
    let dir = tempfile::tempdir().unwrap();
    let undo_file = UndoFile::open(dir.path().join("rev.dat"), FormatConfig::default()).unwrap();
    let (undo, spent) = make_block_undo(5, 2, 2);
    let pos = undo_file.append(&undo).unwrap();

    let mut view: HashMap<OutPoint, Coin> = HashMap::new();
    let first: BlockUndo = undo_file.read_at(pos).unwrap();
    assert_eq!(disconnect_block(first, &spent, &mut view), DisconnectResult::Ok);
    let again: BlockUndo = undo_file.read_at(pos).unwrap();
    assert_eq!(disconnect_block(again, &spent, &mut view), DisconnectResult::Unclean);
}

#[test]
fn tighter_input_bound_rejects_stored_undo() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rev.dat");
    let pos = {
        let undo_file = UndoFile::open(&path, FormatConfig::default()).unwrap();
        undo_file.append(&make_block_undo(2, 1, 5).0).unwrap()
    };

    let strict = UndoFile::open(&path, FormatConfig::default().with_max_inputs(4)).unwrap();
    let err = strict.read_at::<Coin>(pos).unwrap_err();
    assert!(err.is_corruption());
}

#[test]
fn concurrent_appends_never_overlap() {
    let dir = tempfile::tempdir().unwrap();
    let undo_file = UndoFile::open(dir.path().join("rev.dat"), FormatConfig::default()).unwrap();

    let mut written: Vec<(u32, BlockUndo)> = std::thread::scope(|s| {
        let handles: Vec<_> = (1..=8u32)
            .map(|h| {
                let undo_file = &undo_file;
                s.spawn(move || {
                    let (undo, _) = make_block_undo(h, 2, h);
                    (undo_file.append(&undo).unwrap(), undo)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    written.sort_by_key(|(pos, _)| *pos);
    for pair in written.windows(2) {
        let (pos, undo) = &pair[0];
        assert_eq!(u64::from(pair[1].0), u64::from(*pos) + undo.serialize_size().unwrap() as u64);
    }
    for (pos, undo) in &written {
        assert_eq!(&undo_file.read_at::<Coin>(*pos).unwrap(), undo);
    }
}
