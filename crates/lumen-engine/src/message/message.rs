use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::assets::Asset;

use super::bus::MessageBus;

/// Delivery class of a message.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum MessagePriority {
    /// Queued and delivered by a later [`MessageBus::update`].
    #[default]
    Normal,
    /// Delivered to every subscriber before [`MessageBus::post`] returns.
    High,
}

/// Who posted a message.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub enum MessageSender {
    AssetManager,
    Named(String),
    #[default]
    Anonymous,
}

/// Payload carried by a message.
///
/// The set of payloads is closed: extend it with a variant when a new kind of
/// notification starts travelling over the bus.
#[derive(Debug, Clone, Default)]
pub enum MessageContext {
    #[default]
    None,
    Asset(Rc<Asset>),
}

impl MessageContext {
    #[inline]
    pub fn as_asset(&self) -> Option<&Rc<Asset>> {
        match self {
            MessageContext::Asset(asset) => Some(asset),
            MessageContext::None => None,
        }
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, MessageContext::None)
    }
}

/// An immutable notification routed by code.
#[derive(Debug, Clone)]
pub struct Message {
    code: String,
    sender: MessageSender,
    context: MessageContext,
    priority: MessagePriority,
}

impl Message {
    pub fn new(
        code: impl Into<String>,
        sender: MessageSender,
        context: MessageContext,
        priority: MessagePriority,
    ) -> Self {
        Self {
            code: code.into(),
            sender,
            context,
            priority,
        }
    }

    #[inline]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[inline]
    pub fn sender(&self) -> &MessageSender {
        &self.sender
    }

    #[inline]
    pub fn context(&self) -> &MessageContext {
        &self.context
    }

    #[inline]
    pub fn priority(&self) -> MessagePriority {
        self.priority
    }

    /// Posts a NORMAL priority message on `bus`.
    ///
    /// ```ignore
    /// Message::send(&bus, "EXAMPLE_CODE", MessageSender::Anonymous, MessageContext::None);
    /// ```
    pub fn send(
        bus: &MessageBus,
        code: impl Into<String>,
        sender: MessageSender,
        context: MessageContext,
    ) {
        bus.post(Message::new(code, sender, context, MessagePriority::Normal));
    }

    /// Posts a HIGH priority message on `bus`.
    pub fn send_priority(
        bus: &MessageBus,
        code: impl Into<String>,
        sender: MessageSender,
        context: MessageContext,
    ) {
        bus.post(Message::new(code, sender, context, MessagePriority::High));
    }

    /// Shorthand for [`MessageBus::subscribe`].
    pub fn subscribe(bus: &MessageBus, code: &str, handler: &HandlerRef) {
        bus.subscribe(code, handler);
    }

    /// Shorthand for [`MessageBus::unsubscribe`].
    pub fn unsubscribe(bus: &MessageBus, code: &str, handler: &HandlerRef) {
        bus.unsubscribe(code, handler);
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` ({:?}, from {:?})", self.code, self.priority, self.sender)
    }
}

/// Receiver of messages for the codes it subscribed to.
pub trait MessageHandler {
    fn on_message(&mut self, message: &Message);
}

/// Shared handle to a handler.
///
/// The bus keeps only weak references, so a handler stays alive exactly as long
/// as its owners keep this handle.
pub type HandlerRef = Rc<RefCell<dyn MessageHandler>>;

/// Handler identity is the identity of the shared allocation.
#[inline]
pub fn same_handler(a: &HandlerRef, b: &HandlerRef) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}
