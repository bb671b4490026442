pub mod owned;
pub mod tx;

pub use owned::PacketBuf;
pub use tx::{TxBuf, TxCompletion};
