//! Byte and event streaming primitives.

mod datastream;
pub use datastream::DataStream;

mod flatmap;
pub use flatmap::{
    FlatMapProcessor, FlowError, Frame, FrameDecoder, FrameEncoder, Publisher, Subscriber,
    Subscription,
};

use crate::Ref;

/// Shared handle to a stream of event frames.
pub type EventStreamRef = Ref<dyn Publisher<Frame>>;
