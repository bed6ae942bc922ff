//! # chainfmt-core
//! On-disk formats for block-index records and block undo data.

pub mod block_index;
pub mod codec;
pub mod coin;
pub mod config;
pub mod constants;
pub mod error;
pub mod traits;
pub mod types;
pub mod undo;

pub use block_index::BlockIndexRecord;
pub use coin::{Coin, TxOut};
pub use config::FormatConfig;
pub use error::{CodecError, CorruptionError};
pub use traits::{Deserializable, Serializable};
pub use types::{BlockHeader, Hash256};
pub use undo::{BlockUndo, TxUndo};
