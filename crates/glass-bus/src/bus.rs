// ABOUTME: The broadcast bus itself: subscribe, unsubscribe, publish.
// ABOUTME: Handlers run synchronously on the caller's thread in registration order.

use std::cell::RefCell;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::event::BusEvent;
use crate::topic::{resolve_name, resolve_names, Topic};

/// Identifies one `subscribe` call. A handler registered under several
/// names at once shares a single id; removing the id removes all of
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Rc<RefCell<dyn FnMut(&BusEvent)>>;

struct Subscription {
    id: u64,
    handler: Handler,
}

/// Publish/subscribe hub for pixel-buffer broadcasts.
///
/// Delivery is synchronous and single-threaded: `publish` calls every
/// matching handler before returning, in registration order. The bus is
/// deliberately not `Send`; concurrent publish from multiple threads is
/// unsupported.
///
/// Unlike the event emitter this replaces, `publish` returns the number
/// of handlers invoked rather than the first handler's return value.
/// Zero is the "nothing matched" sentinel, not an error.
pub struct PixelBus {
    // namespace -> event name -> subscriptions, oldest first
    callbacks: HashMap<String, HashMap<String, Vec<Subscription>>>,
    next_id: u64,
    _single_thread: PhantomData<Rc<()>>,
}

impl Default for PixelBus {
    fn default() -> Self {
        Self::new()
    }
}

impl PixelBus {
    pub fn new() -> Self {
        Self {
            callbacks: HashMap::new(),
            next_id: 0,
            _single_thread: PhantomData,
        }
    }

    /// Register a handler under one or more names ("evt", "evt.ns", or
    /// several separated by spaces/commas). Returns `None` (after a
    /// warning) on an empty or invalid name; bad usage never panics.
    pub fn subscribe(
        &mut self,
        names: &str,
        handler: impl FnMut(&BusEvent) + 'static,
    ) -> Option<SubscriptionId> {
        let resolved = resolve_names(names);
        if resolved.is_empty() {
            tracing::warn!("subscribe: empty event name");
            return None;
        }

        let handler: Handler = Rc::new(RefCell::new(handler));
        let id = self.next_id;
        let mut registered = false;

        for name in resolved {
            let topic = resolve_name(&name);
            if topic.value.is_empty() {
                tracing::warn!(name, "subscribe: name without event value");
                continue;
            }
            self.callbacks
                .entry(topic.namespace)
                .or_default()
                .entry(topic.value)
                .or_default()
                .push(Subscription {
                    id,
                    handler: Rc::clone(&handler),
                });
            registered = true;
        }

        if !registered {
            return None;
        }
        self.next_id += 1;
        Some(SubscriptionId(id))
    }

    /// Remove handlers by name. A bare name removes that event from
    /// every namespace; "evt.ns" removes it from one namespace; ".ns"
    /// removes the whole namespace.
    pub fn unsubscribe(&mut self, names: &str) {
        let resolved = resolve_names(names);
        if resolved.is_empty() {
            tracing::warn!("unsubscribe: empty event name");
            return;
        }

        for name in resolved {
            let topic = resolve_name(&name);
            self.remove_topic(&topic);
        }
    }

    /// Remove every registration made by one `subscribe` call.
    pub fn unsubscribe_id(&mut self, id: SubscriptionId) {
        for namespace in self.callbacks.values_mut() {
            for subs in namespace.values_mut() {
                subs.retain(|s| s.id != id.0);
            }
            namespace.retain(|_, subs| !subs.is_empty());
        }
        self.callbacks.retain(|_, ns| !ns.is_empty());
    }

    /// Deliver an event to all matching handlers. A bare name matches
    /// the event under every namespace; "evt.ns" only that namespace.
    /// Returns the number of handlers invoked (0 for unknown names).
    pub fn publish(&mut self, name: &str, event: &BusEvent) -> usize {
        let resolved = resolve_names(name);
        let Some(first) = resolved.first() else {
            tracing::warn!("publish: empty event name");
            return 0;
        };

        let topic = resolve_name(first);
        if topic.value.is_empty() {
            tracing::warn!(name, "publish: name without event value");
            return 0;
        }

        // Collect handlers first so delivery does not hold a borrow of
        // the registration tables.
        let mut matched: Vec<(u64, Handler)> = Vec::new();
        if topic.has_explicit_namespace() {
            if let Some(subs) = self
                .callbacks
                .get(&topic.namespace)
                .and_then(|ns| ns.get(&topic.value))
            {
                matched.extend(subs.iter().map(|s| (s.id, Rc::clone(&s.handler))));
            }
        } else {
            for namespace in self.callbacks.values() {
                if let Some(subs) = namespace.get(&topic.value) {
                    matched.extend(subs.iter().map(|s| (s.id, Rc::clone(&s.handler))));
                }
            }
        }

        // Ids are monotonic, so this restores registration order across
        // namespaces.
        matched.sort_by_key(|(id, _)| *id);

        for (_, handler) in &matched {
            (handler.borrow_mut())(event);
        }
        matched.len()
    }

    fn remove_topic(&mut self, topic: &Topic) {
        if topic.is_namespace_only() {
            self.callbacks.remove(&topic.namespace);
        } else if topic.has_explicit_namespace() {
            if let Some(namespace) = self.callbacks.get_mut(&topic.namespace) {
                namespace.remove(&topic.value);
                if namespace.is_empty() {
                    self.callbacks.remove(&topic.namespace);
                }
            }
        } else {
            // Bare name: remove from every namespace, including default
            for namespace in self.callbacks.values_mut() {
                namespace.remove(&topic.value);
            }
            self.callbacks.retain(|_, ns| !ns.is_empty());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_handler(log: &Rc<RefCell<Vec<&'static str>>>, tag: &'static str) -> impl FnMut(&BusEvent) {
        let log = Rc::clone(log);
        move |_| log.borrow_mut().push(tag)
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let mut bus = PixelBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        bus.subscribe("evt", log_handler(&log, "a")).unwrap();
        bus.subscribe("evt", log_handler(&log, "b")).unwrap();

        let n = bus.publish("evt", &BusEvent::RedrawBackground);
        assert_eq!(n, 2);
        assert_eq!(*log.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn unsubscribe_bare_name_silences_all() {
        let mut bus = PixelBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        bus.subscribe("evt", log_handler(&log, "a"));
        bus.subscribe("evt", log_handler(&log, "b"));
        bus.unsubscribe("evt");

        assert_eq!(bus.publish("evt", &BusEvent::RedrawBackground), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn bare_publish_reaches_every_namespace_in_order() {
        let mut bus = PixelBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        bus.subscribe("evt.ns2", log_handler(&log, "ns2"));
        bus.subscribe("evt", log_handler(&log, "base"));
        bus.subscribe("evt.ns1", log_handler(&log, "ns1"));

        let n = bus.publish("evt", &BusEvent::RedrawBackground);
        assert_eq!(n, 3);
        assert_eq!(*log.borrow(), vec!["ns2", "base", "ns1"]);
    }

    #[test]
    fn removing_one_namespace_leaves_siblings() {
        let mut bus = PixelBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        bus.subscribe("evt.ns1", log_handler(&log, "ns1"));
        bus.subscribe("evt.ns2", log_handler(&log, "ns2"));

        bus.unsubscribe("evt.ns1");
        let n = bus.publish("evt", &BusEvent::RedrawBackground);
        assert_eq!(n, 1);
        assert_eq!(*log.borrow(), vec!["ns2"]);
    }

    #[test]
    fn namespace_only_form_drops_whole_namespace() {
        let mut bus = PixelBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        bus.subscribe("evt.ns1", log_handler(&log, "e1"));
        bus.subscribe("other.ns1", log_handler(&log, "o1"));
        bus.subscribe("evt.ns2", log_handler(&log, "e2"));

        bus.unsubscribe(".ns1");
        assert_eq!(bus.publish("evt", &BusEvent::RedrawBackground), 1);
        assert_eq!(bus.publish("other", &BusEvent::RedrawBackground), 0);
    }

    #[test]
    fn namespaced_publish_targets_one_namespace() {
        let mut bus = PixelBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        bus.subscribe("evt.ns1", log_handler(&log, "ns1"));
        bus.subscribe("evt.ns2", log_handler(&log, "ns2"));

        assert_eq!(bus.publish("evt.ns2", &BusEvent::RedrawBackground), 1);
        assert_eq!(*log.borrow(), vec!["ns2"]);
    }

    #[test]
    fn unknown_name_is_a_noop() {
        let mut bus = PixelBus::new();
        assert_eq!(bus.publish("nobody-home", &BusEvent::RedrawBackground), 0);
    }

    #[test]
    fn empty_name_subscribe_returns_none() {
        let mut bus = PixelBus::new();
        assert!(bus.subscribe("", |_| {}).is_none());
        assert!(bus.subscribe("!!!", |_| {}).is_none());
    }

    #[test]
    fn unsubscribe_by_id_removes_all_names() {
        let mut bus = PixelBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let id = bus.subscribe("a b", log_handler(&log, "x")).unwrap();
        bus.subscribe("a", log_handler(&log, "y"));

        bus.unsubscribe_id(id);
        assert_eq!(bus.publish("a", &BusEvent::RedrawBackground), 1);
        assert_eq!(bus.publish("b", &BusEvent::RedrawBackground), 0);
        assert_eq!(*log.borrow(), vec!["y"]);
    }

    #[test]
    fn typed_payload_reaches_handler() {
        let mut bus = PixelBus::new();
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        bus.subscribe("position-set", move |event| {
            if let BusEvent::PositionSet { x, y } = event {
                *sink.borrow_mut() = Some((*x, *y));
            }
        });

        bus.publish("position-set", &BusEvent::PositionSet { x: 3.0, y: 4.0 });
        assert_eq!(*seen.borrow(), Some((3.0, 4.0)));
    }
}
