use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};

use super::message::{HandlerRef, Message, MessageHandler, MessagePriority};

/// Number of deferred messages delivered per [`MessageBus::update`] by default.
pub const DEFAULT_NORMAL_MESSAGES_PER_UPDATE: usize = 10;

/// Order in which the deferred queue is drained.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum DeliveryOrder {
    /// Most recently queued first. A burst larger than the per-update cap
    /// therefore reaches its oldest entries last.
    #[default]
    Lifo,
    /// Oldest first.
    Fifo,
}

/// Bus tuning.
#[derive(Debug, Clone)]
pub struct MessageBusConfig {
    /// Upper bound on deferred deliveries per `update()`.
    pub normal_messages_per_update: usize,
    pub delivery_order: DeliveryOrder,
}

impl Default for MessageBusConfig {
    fn default() -> Self {
        Self {
            normal_messages_per_update: DEFAULT_NORMAL_MESSAGES_PER_UPDATE,
            delivery_order: DeliveryOrder::default(),
        }
    }
}

type WeakHandler = Weak<RefCell<dyn MessageHandler>>;

/// A deferred delivery: one message bound to one handler.
struct SubscriptionNode {
    message: Rc<Message>,
    handler: WeakHandler,
}

/// Routes messages from senders to subscribed handlers.
///
/// All methods take `&self` so that handlers can subscribe, unsubscribe and post
/// while a delivery is in progress. No internal borrow is held across a call
/// into a handler.
///
/// The subscription table does not own its handlers. A handler dropped by its
/// owners is skipped at delivery time and pruned on the next touch of its code.
#[derive(Default)]
pub struct MessageBus {
    config: MessageBusConfig,
    subscriptions: RefCell<HashMap<String, Vec<WeakHandler>>>,
    queue: RefCell<VecDeque<SubscriptionNode>>,
}

impl MessageBus {
    pub fn new(config: MessageBusConfig) -> Self {
        if config.normal_messages_per_update == 0 {
            log::warn!("message bus configured with a zero per-update cap; NORMAL messages will never be delivered");
        }

        Self {
            config,
            subscriptions: RefCell::new(HashMap::new()),
            queue: RefCell::new(VecDeque::new()),
        }
    }

    #[inline]
    pub fn config(&self) -> &MessageBusConfig {
        &self.config
    }

    /// Registers `handler` for `code`.
    ///
    /// Subscribing the same handler twice is ignored with a warning.
    pub fn subscribe(&self, code: &str, handler: &HandlerRef) {
        let mut subscriptions = self.subscriptions.borrow_mut();
        let handlers = subscriptions.entry(code.to_owned()).or_default();
        handlers.retain(|h| h.strong_count() > 0);

        if handlers.iter().any(|h| points_to(h, handler)) {
            log::warn!("attempted to add a duplicate handler to code `{code}`; subscription not added");
            return;
        }

        handlers.push(Rc::downgrade(handler));
    }

    /// Removes `handler` from `code`.
    ///
    /// Warns when nothing is subscribed to `code` at all; a handler that is
    /// simply not among the code's subscribers is ignored.
    pub fn unsubscribe(&self, code: &str, handler: &HandlerRef) {
        let mut subscriptions = self.subscriptions.borrow_mut();
        let Some(handlers) = subscriptions.get_mut(code) else {
            log::warn!("cannot unsubscribe handler from code `{code}` because that code is not subscribed to");
            return;
        };

        handlers.retain(|h| h.strong_count() > 0 && !points_to(h, handler));
        if handlers.is_empty() {
            subscriptions.remove(code);
        }
    }

    /// Posts `message` to every handler subscribed to its code.
    ///
    /// HIGH priority: handlers run now, in subscription order.
    /// NORMAL priority: one deferred node per handler is queued for `update()`.
    pub fn post(&self, message: Message) {
        log::trace!("message posted: {message}");

        let handlers = self.live_handlers(message.code());
        if handlers.is_empty() {
            return;
        }

        match message.priority() {
            MessagePriority::High => {
                for handler in &handlers {
                    deliver(handler, &message);
                }
            }
            MessagePriority::Normal => {
                let message = Rc::new(message);
                let mut queue = self.queue.borrow_mut();
                for handler in &handlers {
                    queue.push_back(SubscriptionNode {
                        message: Rc::clone(&message),
                        handler: Rc::downgrade(handler),
                    });
                }
            }
        }
    }

    /// Delivers up to the configured cap of deferred messages.
    ///
    /// The cap is taken against the queue length at entry, and nodes are popped
    /// one at a time so handlers may post while the drain runs.
    /// Returns the number of nodes taken off the queue.
    pub fn update(&self) -> usize {
        let limit = self
            .config
            .normal_messages_per_update
            .min(self.queue.borrow().len());

        for _ in 0..limit {
            let node = {
                let mut queue = self.queue.borrow_mut();
                match self.config.delivery_order {
                    DeliveryOrder::Lifo => queue.pop_back(),
                    DeliveryOrder::Fifo => queue.pop_front(),
                }
            };
            let Some(node) = node else { break };

            match node.handler.upgrade() {
                Some(handler) => deliver(&handler, &node.message),
                None => log::trace!("handler for {} was dropped before delivery", node.message),
            }
        }

        limit
    }

    /// Number of live handlers subscribed to `code`.
    pub fn subscriber_count(&self, code: &str) -> usize {
        self.subscriptions
            .borrow()
            .get(code)
            .map_or(0, |handlers| handlers.iter().filter(|h| h.strong_count() > 0).count())
    }

    pub fn is_subscribed(&self, code: &str, handler: &HandlerRef) -> bool {
        self.subscriptions
            .borrow()
            .get(code)
            .is_some_and(|handlers| handlers.iter().any(|h| points_to(h, handler)))
    }

    /// Number of deferred nodes waiting for `update()`.
    pub fn pending_count(&self) -> usize {
        self.queue.borrow().len()
    }

    fn live_handlers(&self, code: &str) -> Vec<HandlerRef> {
        let mut subscriptions = self.subscriptions.borrow_mut();
        let Some(handlers) = subscriptions.get_mut(code) else {
            return Vec::new();
        };

        handlers.retain(|h| h.strong_count() > 0);
        handlers.iter().filter_map(Weak::upgrade).collect()
    }
}

fn points_to(weak: &WeakHandler, handler: &HandlerRef) -> bool {
    std::ptr::addr_eq(weak.as_ptr(), Rc::as_ptr(handler))
}

fn deliver(handler: &HandlerRef, message: &Message) {
    match handler.try_borrow_mut() {
        Ok(mut h) => h.on_message(message),
        // Re-entrant delivery to a handler that is still inside on_message.
        Err(_) => log::warn!("handler is busy; dropping delivery of {message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{MessageContext, MessageSender};

    struct Recorder {
        label: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl MessageHandler for Recorder {
        fn on_message(&mut self, message: &Message) {
            self.log.borrow_mut().push(format!("{}:{}", self.label, message.code()));
        }
    }

    fn recorder(label: &'static str, log: &Rc<RefCell<Vec<String>>>) -> HandlerRef {
        Rc::new(RefCell::new(Recorder { label, log: Rc::clone(log) }))
    }

    fn normal(code: &str) -> Message {
        Message::new(code, MessageSender::Anonymous, MessageContext::None, MessagePriority::Normal)
    }

    fn high(code: &str) -> Message {
        Message::new(code, MessageSender::Anonymous, MessageContext::None, MessagePriority::High)
    }

    // ── subscribe / unsubscribe ───────────────────────────────────────────

    #[test]
    fn duplicate_subscribe_keeps_one_registration() {
        let bus = MessageBus::default();
        let log = Rc::default();
        let h = recorder("a", &log);

        bus.subscribe("CODE", &h);
        bus.subscribe("CODE", &h);
        assert_eq!(bus.subscriber_count("CODE"), 1);

        Message::send_priority(&bus, "CODE", MessageSender::Anonymous, MessageContext::None);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn same_handler_may_subscribe_to_many_codes() {
        let bus = MessageBus::default();
        let log = Rc::default();
        let h = recorder("a", &log);

        bus.subscribe("ONE", &h);
        bus.subscribe("TWO", &h);
        assert!(bus.is_subscribed("ONE", &h));
        assert!(bus.is_subscribed("TWO", &h));
    }

    #[test]
    fn unsubscribe_removes_only_that_handler() {
        let bus = MessageBus::default();
        let log = Rc::default();
        let a = recorder("a", &log);
        let b = recorder("b", &log);

        bus.subscribe("CODE", &a);
        bus.subscribe("CODE", &b);
        bus.unsubscribe("CODE", &a);

        assert!(!bus.is_subscribed("CODE", &a));
        assert!(bus.is_subscribed("CODE", &b));
        bus.post(high("CODE"));
        assert_eq!(*log.borrow(), vec!["b:CODE".to_owned()]);
    }

    #[test]
    fn unsubscribe_unknown_code_or_handler_is_harmless() {
        let bus = MessageBus::default();
        let log = Rc::default();
        let a = recorder("a", &log);
        let b = recorder("b", &log);

        bus.unsubscribe("NOBODY", &a);
        bus.subscribe("CODE", &a);
        bus.unsubscribe("CODE", &b);
        assert_eq!(bus.subscriber_count("CODE"), 1);
    }

    #[test]
    fn dropped_handler_is_not_called() {
        let bus = MessageBus::default();
        let log = Rc::default();
        let h = recorder("a", &log);
        bus.subscribe("CODE", &h);
        bus.post(normal("CODE"));
        drop(h);

        assert_eq!(bus.subscriber_count("CODE"), 0);
        bus.post(high("CODE"));
        bus.update();
        assert!(log.borrow().is_empty());
    }

    // ── priority ──────────────────────────────────────────────────────────

    #[test]
    fn high_priority_delivers_before_post_returns() {
        let bus = MessageBus::default();
        let log = Rc::default();
        let a = recorder("a", &log);
        let b = recorder("b", &log);
        bus.subscribe("CODE", &a);
        bus.subscribe("CODE", &b);

        bus.post(high("CODE"));

        assert_eq!(*log.borrow(), vec!["a:CODE".to_owned(), "b:CODE".to_owned()]);
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn normal_priority_waits_for_update() {
        let bus = MessageBus::default();
        let log = Rc::default();
        let a = recorder("a", &log);
        let b = recorder("b", &log);
        bus.subscribe("CODE", &a);
        bus.subscribe("CODE", &b);

        bus.post(normal("CODE"));
        assert!(log.borrow().is_empty());
        assert_eq!(bus.pending_count(), 2); // one node per subscriber

        assert_eq!(bus.update(), 2);
        assert_eq!(log.borrow().len(), 2);
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn post_without_subscribers_queues_nothing() {
        let bus = MessageBus::default();
        bus.post(normal("CODE"));
        assert_eq!(bus.pending_count(), 0);
        assert_eq!(bus.update(), 0);
    }

    // ── update cap and ordering ───────────────────────────────────────────

    #[test]
    fn update_never_exceeds_cap() {
        let bus = MessageBus::default();
        let log = Rc::default();
        let h = recorder("a", &log);
        bus.subscribe("CODE", &h);

        for _ in 0..25 {
            bus.post(normal("CODE"));
        }

        assert_eq!(bus.update(), 10);
        assert_eq!(log.borrow().len(), 10);
        assert_eq!(bus.update(), 10);
        assert_eq!(bus.update(), 5);
        assert_eq!(bus.update(), 0);
        assert_eq!(log.borrow().len(), 25);
    }

    #[test]
    fn custom_cap_is_respected() {
        let bus = MessageBus::new(MessageBusConfig {
            normal_messages_per_update: 3,
            ..MessageBusConfig::default()
        });
        let log = Rc::default();
        let h = recorder("a", &log);
        bus.subscribe("CODE", &h);
        for _ in 0..5 {
            bus.post(normal("CODE"));
        }

        assert_eq!(bus.update(), 3);
        assert_eq!(bus.pending_count(), 2);
    }

    #[test]
    fn lifo_delivers_newest_first() {
        let bus = MessageBus::default();
        let log = Rc::default();
        let h = recorder("h", &log);
        bus.subscribe("FIRST", &h);
        bus.subscribe("SECOND", &h);

        bus.post(normal("FIRST"));
        bus.post(normal("SECOND"));
        bus.update();

        assert_eq!(*log.borrow(), vec!["h:SECOND".to_owned(), "h:FIRST".to_owned()]);
    }

    #[test]
    fn fifo_delivers_oldest_first() {
        let bus = MessageBus::new(MessageBusConfig {
            delivery_order: DeliveryOrder::Fifo,
            ..MessageBusConfig::default()
        });
        let log = Rc::default();
        let h = recorder("h", &log);
        bus.subscribe("FIRST", &h);
        bus.subscribe("SECOND", &h);

        bus.post(normal("FIRST"));
        bus.post(normal("SECOND"));
        bus.update();

        assert_eq!(*log.borrow(), vec!["h:FIRST".to_owned(), "h:SECOND".to_owned()]);
    }

    // ── reentrancy ────────────────────────────────────────────────────────

    struct Forwarder {
        bus: Rc<MessageBus>,
        seen: usize,
    }

    impl MessageHandler for Forwarder {
        fn on_message(&mut self, message: &Message) {
            self.seen += 1;
            if message.code() == "PING" {
                self.bus.post(normal("PONG"));
                // Re-entrant HIGH post to ourselves is dropped, not a panic.
                self.bus.post(high("PING"));
            }
        }
    }

    #[test]
    fn handlers_may_post_during_delivery() {
        let bus = Rc::new(MessageBus::default());
        let forwarder = Rc::new(RefCell::new(Forwarder { bus: Rc::clone(&bus), seen: 0 }));
        let handler: HandlerRef = forwarder.clone();
        let log = Rc::default();
        let pong = recorder("r", &log);
        bus.subscribe("PING", &handler);
        bus.subscribe("PONG", &pong);

        bus.post(high("PING"));
        assert_eq!(forwarder.borrow().seen, 1);
        assert_eq!(bus.pending_count(), 1);

        bus.update();
        assert_eq!(*log.borrow(), vec!["r:PONG".to_owned()]);
    }
}
