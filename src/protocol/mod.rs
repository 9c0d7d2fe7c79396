//! Wire protocol framing and bridge-originated messages
//!
//! Only framing is handled here; message bodies are opaque to the bridge.

pub mod codec;
pub mod messages;

pub use codec::{encode_frame, FrameDecoder, DEFAULT_MAX_PAYLOAD_BYTES};
