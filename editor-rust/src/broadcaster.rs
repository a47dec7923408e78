use futures::{
    channel::mpsc::{self, UnboundedReceiver},
    Stream,
};
use portfolio_media::ReplacementEvent;
use std::{
    pin::Pin,
    sync::{Arc, Mutex, Weak},
    task::{Context, Poll},
};

use crate::caption_controller::CaptionEvent;

type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Registry<E> {
    next_id: u64,
    handlers: Vec<(u64, Handler<E>)>,
}

/// A publish/subscribe channel with fan-out delivery.
///
/// Delivery is synchronous: `publish` returns after every handler that was
/// subscribed when it was called has run. Handlers may subscribe, unsubscribe
/// or publish from inside a handler. Cloning yields another handle to the same
/// channel.
pub struct Broadcaster<E> {
    registry: Arc<Mutex<Registry<E>>>,
}

/// Announces "URL A was replaced by URL B" to every interested instance.
pub type ReplacementBroadcaster = Broadcaster<ReplacementEvent>;
/// Announces caption generation and settled manual edits.
pub type CaptionBroadcaster = Broadcaster<CaptionEvent>;

impl<E> Clone for Broadcaster<E> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
        }
    }
}

impl<E> Default for Broadcaster<E> {
    fn default() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                handlers: Vec::new(),
            })),
        }
    }
}

impl<E> Broadcaster<E> {
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.registry
            .lock()
            .expect("broadcaster poisoned")
            .handlers
            .len()
    }
}

impl<E> std::fmt::Debug for Broadcaster<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl<E> Broadcaster<E>
where
    E: 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler`. It receives every event published until the
    /// returned `Subscription` is dropped or unsubscribed.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = {
            let mut registry = self.registry.lock().expect("broadcaster poisoned");
            let id = registry.next_id;
            registry.next_id += 1;
            registry.handlers.push((id, Arc::new(handler)));
            id
        };

        let registry: Weak<Mutex<Registry<E>>> = Arc::downgrade(&self.registry);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                let mut registry = registry.lock().expect("broadcaster poisoned");
                registry.handlers.retain(|(handler_id, _)| *handler_id != id);
            }
        })
    }

    /// Deliver `event` to every current subscriber. Returns the number of
    /// handlers invoked.
    pub fn publish(&self, event: E) -> usize {
        let handlers: Vec<Handler<E>> = {
            let registry = self.registry.lock().expect("broadcaster poisoned");
            registry
                .handlers
                .iter()
                .map(|(_, handler)| handler.clone())
                .collect()
        };

        for handler in &handlers {
            handler(&event);
        }
        handlers.len()
    }

    /// Observe the channel as a stream. Dropping the stream unsubscribes.
    #[must_use]
    pub fn stream(&self) -> EventStream<E>
    where
        E: Clone + Send,
    {
        let (sender, receiver) = mpsc::unbounded();
        let subscription = self.subscribe(move |event: &E| {
            // The receiver may already be gone; the subscription is dropped
            // with it.
            let _ = sender.unbounded_send(event.clone());
        });
        EventStream {
            receiver,
            _subscription: subscription,
        }
    }
}

/// Handle returned by `subscribe`. Unsubscribes when dropped.
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub(crate) fn new(unsubscribe: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

pub struct EventStream<E> {
    receiver: UnboundedReceiver<E>,
    _subscription: Subscription,
}

impl<E> Stream for EventStream<E> {
    type Item = E;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_next(cx)
    }
}
