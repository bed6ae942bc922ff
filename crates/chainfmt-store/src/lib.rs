//! # chainfmt-store
//! Positional storage for block undo data and block-index records.
//!
//! - [`UndoFile`]: back-to-back [`BlockUndo`](chainfmt_core::BlockUndo)
//!   records addressed by the `undo_pos` stored in the block index
//! - [`IndexFile`]: back-to-back [`BlockIndexRecord`](chainfmt_core::BlockIndexRecord)s
//! - [`disconnect_block`]: apply undo data to a [`CoinsView`]

pub mod disconnect;
pub mod error;
pub mod flatfile;

pub use disconnect::{disconnect_block, CoinsView, DisconnectResult};
pub use error::StoreError;
pub use flatfile::{IndexFile, UndoFile};
