//! Length-prefixed RPC framing: a versioned, compressed, self-delimiting
//! binary framing for exchanging codec-serialized objects over a byte
//! stream. Logically independent of the component lifecycle subsystem.

pub mod codec;
pub mod compress;
pub mod frame;

pub use codec::{CodecError, ObjectCodec, TlvCodec, Value};
pub use compress::{CompressError, Compressor, ZlibCompressor};
pub use frame::{Framer, HEADER_SIZE, PROTOCOL_VERSION};
