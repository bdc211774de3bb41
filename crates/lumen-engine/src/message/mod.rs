//! Publish/subscribe messaging.
//!
//! Components talk to each other through string-coded [`Message`]s routed by a
//! [`MessageBus`]. HIGH priority messages are delivered while `post` runs;
//! NORMAL priority messages wait in a deferred queue drained a few at a time by
//! [`MessageBus::update`] once per frame.

mod bus;
mod message;

pub use bus::{DeliveryOrder, MessageBus, MessageBusConfig, DEFAULT_NORMAL_MESSAGES_PER_UPDATE};
pub use message::{
    same_handler, HandlerRef, Message, MessageContext, MessageHandler, MessagePriority,
    MessageSender,
};
