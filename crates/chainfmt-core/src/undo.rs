//! Undo data: the coins consumed by a block, kept so the block can be
//! disconnected again.
//!
//! ```text
//! TxUndo    = compact_size(n) || coin_0 || ... || coin_{n-1}
//! BlockUndo = compact_size(m) || tx_undo_0 || ... || tx_undo_{m-1}
//! ```
//!
//! Counts read from disk are untrusted. A coin count above
//! [`FormatConfig::max_inputs_per_tx`] is reported as
//! [`CorruptionError::TooManyInputs`] and decoding stops right after the count.
//! Any decode error discards the partially built value.

use std::io::{Read, Write};

use crate::codec;
use crate::coin::Coin;
use crate::config::FormatConfig;
use crate::constants::MAX_PREALLOC;
use crate::error::{CodecError, CorruptionError};
use crate::traits::{Deserializable, Serializable};

/// Coins spent by one transaction, in input order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxUndo<C = Coin> {
    undo_coins: Vec<C>,
}

impl<C> Default for TxUndo<C> {
    fn default() -> Self {
        Self { undo_coins: Vec::new() }
    }
}

impl<C> From<Vec<C>> for TxUndo<C> {
    fn from(undo_coins: Vec<C>) -> Self {
        Self { undo_coins }
    }
}

impl<C> TxUndo<C> {
    /// An undo record with no coins.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn undo_coins(&self) -> &[C] {
        &self.undo_coins
    }

    pub fn set_undo_coins(&mut self, coins: Vec<C>) {
        self.undo_coins = coins;
    }

    /// Append the coin consumed by the next input.
    pub fn push_coin(&mut self, coin: C) {
        self.undo_coins.push(coin);
    }

    pub fn len(&self) -> usize {
        self.undo_coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_coins.is_empty()
    }

    pub fn into_coins(self) -> Vec<C> {
        self.undo_coins
    }
}

impl<C: Serializable> Serializable for TxUndo<C> {
    /// Write the coin count followed by every coin.
    ///
    /// Stops at the first failing coin; bytes already handed to `w` are not
    /// taken back, so the destination must be discarded on error.
    fn serialize<W: Write + ?Sized>(&self, w: &mut W) -> Result<(), CodecError> {
        codec::write_compact_size(w, self.undo_coins.len() as u64)?;
        for coin in &self.undo_coins {
            coin.serialize(w)?;
        }
        Ok(())
    }
}

impl<C: Deserializable> TxUndo<C> {
    /// Read a transaction's undo record, allowing at most `max_inputs` coins.
    pub fn deserialize<R: Read + ?Sized>(r: &mut R, max_inputs: u64) -> Result<Self, CodecError> {
        let count = codec::read_compact_size(r)?;
        if count > max_inputs {
            tracing::warn!(count, max = max_inputs, "too many input undo records");
            return Err(CorruptionError::TooManyInputs { count, max: max_inputs }.into());
        }

        let mut undo_coins = Vec::with_capacity((count as usize).min(MAX_PREALLOC));
        for _ in 0..count {
            undo_coins.push(C::deserialize(r)?);
        }
        Ok(Self { undo_coins })
    }
}

/// Undo records for every transaction of a block, in block order.
///
/// By convention the coinbase contributes no entry; callers that include it
/// store an empty [`TxUndo`] in its slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockUndo<C = Coin> {
    tx_undo: Vec<TxUndo<C>>,
}

impl<C> Default for BlockUndo<C> {
    fn default() -> Self {
        Self { tx_undo: Vec::new() }
    }
}

impl<C> From<Vec<TxUndo<C>>> for BlockUndo<C> {
    fn from(tx_undo: Vec<TxUndo<C>>) -> Self {
        Self { tx_undo }
    }
}

impl<C> BlockUndo<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty block undo with room for `count` transactions.
    pub fn with_capacity(count: usize) -> Self {
        Self { tx_undo: Vec::with_capacity(count) }
    }

    /// Append the undo record of the next transaction.
    pub fn add_tx_undo(&mut self, tx_undo: TxUndo<C>) {
        self.tx_undo.push(tx_undo);
    }

    /// Replace all undo records.
    pub fn set_tx_undo(&mut self, tx_undo: Vec<TxUndo<C>>) {
        self.tx_undo = tx_undo;
    }

    pub fn tx_undo(&self) -> &[TxUndo<C>] {
        &self.tx_undo
    }

    pub fn into_tx_undo(self) -> Vec<TxUndo<C>> {
        self.tx_undo
    }

    pub fn len(&self) -> usize {
        self.tx_undo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx_undo.is_empty()
    }

    /// Total number of coins across all transactions.
    pub fn coin_count(&self) -> usize {
        self.tx_undo.iter().map(TxUndo::len).sum()
    }
}

impl<C: Serializable> BlockUndo<C> {
    /// Exact length in bytes of [`serialize`](Serializable::serialize)'s output.
    ///
    /// Encodes into a scratch buffer and measures it, so it always agrees with
    /// what gets written.
    pub fn serialize_size(&self) -> Result<usize, CodecError> {
        let mut buf = Vec::new();
        self.serialize(&mut buf)?;
        Ok(buf.len())
    }
}

impl<C: Serializable> Serializable for BlockUndo<C> {
    /// Write the transaction count followed by every [`TxUndo`].
    fn serialize<W: Write + ?Sized>(&self, w: &mut W) -> Result<(), CodecError> {
        codec::write_compact_size(w, self.tx_undo.len() as u64)?;
        for tx_undo in &self.tx_undo {
            tx_undo.serialize(w)?;
        }
        Ok(())
    }

    fn serialized_size(&self) -> Result<usize, CodecError> {
        self.serialize_size()
    }
}

impl<C: Deserializable> BlockUndo<C> {
    /// Read a block's undo data, bounding each transaction's coin count by
    /// `config.max_inputs_per_tx`.
    pub fn deserialize<R: Read + ?Sized>(r: &mut R, config: &FormatConfig) -> Result<Self, CodecError> {
        let count = codec::read_compact_size(r)?;
        let mut tx_undo = Vec::with_capacity((count as usize).min(MAX_PREALLOC));
        for _ in 0..count {
            tx_undo.push(TxUndo::deserialize(r, config.max_inputs_per_tx)?);
        }
        tracing::trace!(txs = count, "decoded block undo");
        Ok(Self { tx_undo })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coin::TxOut;
    use std::io::Cursor;

    fn coin(seed: u8) -> Coin {
        Coin::new(TxOut { value: u64::from(seed) * 1000, script_pubkey: vec![seed; 25] }, 100 + u32::from(seed), seed % 2 == 0)
    }

    fn encode<T: Serializable>(value: &T) -> Vec<u8> {
        let mut buf = Vec::new();
        value.serialize(&mut buf).unwrap();
        buf
    }

    /// Coin stand-in whose encoding always fails.
    #[derive(Debug)]
    struct BrokenCoin;

    impl Serializable for BrokenCoin {
        fn serialize<W: Write + ?Sized>(&self, _: &mut W) -> Result<(), CodecError> {
            Err(CorruptionError::Malformed { what: "coin", reason: "unencodable".into() }.into())
        }
    }

    // --- TxUndo ---

    #[test]
    fn tx_undo_layout() {
        let tu = TxUndo::from(vec![coin(1), coin(2)]);
        let mut expected = vec![0x02];
        expected.extend(encode(&coin(1)));
        expected.extend(encode(&coin(2)));
        assert_eq!(encode(&tu), expected);
    }

    #[test]
    fn tx_undo_preserves_input_order() {
        let tu = TxUndo::from(vec![coin(3), coin(1), coin(2)]);
        let decoded: TxUndo = TxUndo::deserialize(&mut Cursor::new(encode(&tu)), 10).unwrap();
        assert_eq!(decoded, tu);
    }

    #[test]
    fn tx_undo_count_at_bound_is_accepted() {
        let tu = TxUndo::from(vec![coin(1), coin(2)]);
        assert!(TxUndo::<Coin>::deserialize(&mut Cursor::new(encode(&tu)), 2).is_ok());
    }

    #[test]
    fn tx_undo_count_over_bound_is_corruption() {
        let tu = TxUndo::from(vec![coin(1), coin(2), coin(3)]);
        let bytes = encode(&tu);
        let mut cur = Cursor::new(&bytes);
        let err = TxUndo::<Coin>::deserialize(&mut cur, 2).unwrap_err();
        assert_eq!(err.corruption(), Some(&CorruptionError::TooManyInputs { count: 3, max: 2 }));
        // Only the count byte was consumed.
        assert_eq!(cur.position(), 1);
    }

    #[test]
    fn tx_undo_truncated_coin_is_eof() {
        let mut bytes = encode(&TxUndo::from(vec![coin(1), coin(2)]));
        bytes.truncate(bytes.len() - 1);
        let err = TxUndo::<Coin>::deserialize(&mut Cursor::new(bytes), 10).unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn tx_undo_serialize_stops_at_failing_coin() {
        let tu = TxUndo::from(vec![BrokenCoin, BrokenCoin]);
        let mut buf = Vec::new();
        let err = tu.serialize(&mut buf).unwrap_err();
        assert!(err.is_corruption());
        assert_eq!(buf, [0x02]);
    }

    #[test]
    fn tx_undo_accessors() {
        let mut tu = TxUndo::new();
        assert!(tu.is_empty());
        tu.push_coin(coin(1));
        tu.push_coin(coin(2));
        assert_eq!(tu.len(), 2);
        assert_eq!(tu.undo_coins()[1], coin(2));
        tu.set_undo_coins(vec![coin(9)]);
        assert_eq!(tu.into_coins(), vec![coin(9)]);
    }

    // --- BlockUndo ---

    #[test]
    fn empty_block_undo_is_single_zero_byte() {
        let bu = BlockUndo::<Coin>::new();
        assert_eq!(encode(&bu), [0x00]);
        assert_eq!(bu.serialize_size().unwrap(), 1);
        let decoded = BlockUndo::<Coin>::deserialize(&mut Cursor::new([0x00]), &FormatConfig::default()).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn block_undo_two_entry_layout() {
        let mut bu = BlockUndo::with_capacity(2);
        bu.add_tx_undo(TxUndo::from(vec![coin(7)]));
        bu.add_tx_undo(TxUndo::new());

        let mut expected = vec![0x02, 0x01];
        expected.extend(encode(&coin(7)));
        expected.push(0x00);
        assert_eq!(encode(&bu), expected);

        let decoded = BlockUndo::deserialize(&mut Cursor::new(expected), &FormatConfig::default()).unwrap();
        assert_eq!(decoded, bu);
    }

    #[test]
    fn block_undo_serializes_every_entry() {
        let bu = BlockUndo::from(vec![
            TxUndo::from(vec![coin(1)]),
            TxUndo::from(vec![coin(2), coin(3)]),
            TxUndo::from(vec![coin(4)]),
        ]);
        let decoded = BlockUndo::<Coin>::deserialize(&mut Cursor::new(encode(&bu)), &FormatConfig::default()).unwrap();
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded.coin_count(), 4);
        assert_eq!(decoded.tx_undo()[2].undo_coins(), &[coin(4)]);
    }

    #[test]
    fn serialize_size_matches_written_length() {
        let one = BlockUndo::from(vec![TxUndo::from(vec![coin(1)])]);
        let many = BlockUndo::from((0..300u16).map(|i| TxUndo::from(vec![coin(i as u8); (i % 4) as usize])).collect::<Vec<_>>());
        for bu in [BlockUndo::new(), one, many] {
            assert_eq!(bu.serialize_size().unwrap(), encode(&bu).len());
            assert_eq!(bu.serialized_size().unwrap(), encode(&bu).len());
        }
    }

    #[test]
    fn block_undo_inner_bound_applies() {
        let bu = BlockUndo::from(vec![TxUndo::new(), TxUndo::from(vec![coin(1), coin(2)])]);
        let cfg = FormatConfig::default().with_max_inputs(1);
        let err = BlockUndo::<Coin>::deserialize(&mut Cursor::new(encode(&bu)), &cfg).unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn block_undo_truncated_after_count_is_eof() {
        let bu = BlockUndo::from(vec![TxUndo::from(vec![coin(1)]), TxUndo::from(vec![coin(2)])]);
        let bytes = encode(&bu);
        for cut in 1..bytes.len() {
            let err = BlockUndo::<Coin>::deserialize(&mut Cursor::new(&bytes[..cut]), &FormatConfig::default())
                .unwrap_err();
            assert!(err.is_truncated(), "cut at {cut}: {err}");
        }
    }

    #[test]
    fn block_undo_huge_count_fails_without_huge_allocation() {
        // Claims 0x0200_0000 transactions but carries none.
        let bytes = [0xFE, 0x00, 0x00, 0x00, 0x02];
        let err = BlockUndo::<Coin>::deserialize(&mut Cursor::new(bytes), &FormatConfig::default()).unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn block_undo_mutators() {
        let mut bu = BlockUndo::new();
        bu.add_tx_undo(TxUndo::from(vec![coin(1)]));
        bu.set_tx_undo(vec![TxUndo::new(), TxUndo::from(vec![coin(2)])]);
        assert_eq!(bu.len(), 2);
        assert_eq!(bu.coin_count(), 1);
        assert_eq!(bu.into_tx_undo()[1].undo_coins(), &[coin(2)]);
    }
}
