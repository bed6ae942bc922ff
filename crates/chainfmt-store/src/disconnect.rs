//! Reverting a block's spends from its undo data.

use std::collections::HashMap;
use std::hash::Hash;

use chainfmt_core::BlockUndo;

/// Outcome of disconnecting a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisconnectResult {
    /// All good.
    Ok,
    /// Rolled back, but the coin set was inconsistent with the block.
    Unclean,
    /// Undo data does not line up with the block; nothing was changed.
    Failed,
}

/// Minimal write access to a UTXO set.
pub trait CoinsView {
    type OutPoint;
    type Coin;

    /// Whether an unspent coin exists at `outpoint`.
    fn have_coin(&self, outpoint: &Self::OutPoint) -> bool;

    /// Insert `coin` at `outpoint`, replacing any existing coin.
    fn add_coin(&mut self, outpoint: Self::OutPoint, coin: Self::Coin);
}

impl<K: Eq + Hash, C> CoinsView for HashMap<K, C> {
    type OutPoint = K;
    type Coin = C;

    fn have_coin(&self, outpoint: &K) -> bool {
        self.contains_key(outpoint)
    }

    fn add_coin(&mut self, outpoint: K, coin: C) {
        self.insert(outpoint, coin);
    }
}

/// Restore the coins a block spent.
///
/// `spent[i]` lists the outpoints consumed by the inputs of the transaction
/// whose undo record is `undo.tx_undo()[i]`, in input order. Transactions are
/// reverted last to first, inputs within a transaction likewise. Shape is
/// checked before anything is restored, so [`DisconnectResult::Failed`] leaves
/// `view` untouched. A restored coin that overwrites an existing one makes
/// the result [`DisconnectResult::Unclean`].
pub fn disconnect_block<V>(
    undo: BlockUndo<V::Coin>,
    spent: &[Vec<V::OutPoint>],
    view: &mut V,
) -> DisconnectResult
where
    V: CoinsView,
    V::OutPoint: Clone,
{
    if undo.len() != spent.len() {
        tracing::error!(undo_txs = undo.len(), block_txs = spent.len(), "block and undo data inconsistent");
        return DisconnectResult::Failed;
    }
    if let Some(i) = undo.tx_undo().iter().zip(spent).position(|(tu, ins)| tu.len() != ins.len()) {
        tracing::error!(tx = i, "transaction and undo data inconsistent");
        return DisconnectResult::Failed;
    }

    let mut clean = true;
    for (tx_undo, inputs) in undo.into_tx_undo().into_iter().zip(spent).rev() {
        for (coin, outpoint) in tx_undo.into_coins().into_iter().zip(inputs).rev() {
            if view.have_coin(outpoint) {
                clean = false;
            }
            view.add_coin(outpoint.clone(), coin);
        }
    }

    if clean {
        DisconnectResult::Ok
    } else {
        tracing::warn!("undo restored over unspent coins");
        DisconnectResult::Unclean
    }
}
