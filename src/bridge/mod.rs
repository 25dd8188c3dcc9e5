//! Message bridge between the host and the embedded document.
//!
//! Both sides exchange independent JSON envelopes tagged by a `type` field.
//! Delivery is FIFO per channel with no acknowledgement; a frame that cannot
//! be decoded is logged and dropped so the reading surface stays live.

mod codec;
mod error;
mod message;
mod transport;

pub use codec::{Decoded, decode, encode};
pub use error::{BridgeError, bridge_error};
pub use message::BridgeMessage;
pub use transport::{BridgeTransport, FrameSink, LineSink, spawn_line_reader};
