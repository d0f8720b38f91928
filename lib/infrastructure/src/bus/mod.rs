use tokio::sync::broadcast::error::RecvError;

/// Fan-out channel. Every listener sees every event sent after it subscribed.
pub struct EventBus<T> {
    tx: tokio::sync::broadcast::Sender<T>,
}

pub struct EventListener<T> {
    rx: tokio::sync::broadcast::Receiver<T>,
}

#[derive(Clone)]
pub struct EventEmitter<T> {
    tx: tokio::sync::broadcast::Sender<T>,
}

impl<T: Clone + std::fmt::Debug> EventBus<T> {
    pub fn new(buffer_size: usize) -> Self {
        let (tx, _) = tokio::sync::broadcast::channel(buffer_size);
        Self { tx }
    }

    pub fn subscribe(&self) -> EventListener<T> {
        EventListener::new(self.tx.subscribe())
    }

    pub fn emitter(&self) -> EventEmitter<T> {
        EventEmitter::new(self.tx.clone())
    }
}

impl<T: Clone> EventListener<T> {
    pub fn new(rx: tokio::sync::broadcast::Receiver<T>) -> Self {
        Self { rx }
    }

    /// Next event, skipping over events lost to lagging. `None` once all
    /// emitters are gone.
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Closed) => {
                    tracing::debug!("Channel for event receiver of {} is closed", std::any::type_name::<T>());
                    return None;
                }
                Err(RecvError::Lagged(count)) => {
                    tracing::warn!(
                        "Channel for event receiver of {} lagged by {} messages",
                        std::any::type_name::<T>(),
                        count
                    );
                }
            }
        }
    }
}

impl<T: Clone + std::fmt::Debug> EventEmitter<T> {
    fn new(tx: tokio::sync::broadcast::Sender<T>) -> Self {
        Self { tx }
    }

    /// Events sent without any listener are dropped.
    pub fn send(&self, event: T) {
        if self.tx.send(event.clone()).is_err() {
            tracing::trace!("No listener for event {:?}", event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_every_listener_receives_event() {
        let bus = EventBus::new(4);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.emitter().send("tick".to_owned());

        assert_eq!(first.recv().await, Some("tick".to_owned()));
        assert_eq!(second.recv().await, Some("tick".to_owned()));
    }

    #[tokio::test]
    async fn test_lagging_listener_skips_to_oldest_retained() {
        let bus = EventBus::new(2);
        let mut listener = bus.subscribe();
        let emitter = bus.emitter();

        for i in 0..5 {
            emitter.send(i);
        }

        assert_eq!(listener.recv().await, Some(3));
        assert_eq!(listener.recv().await, Some(4));
    }

    #[tokio::test]
    async fn test_closed_when_bus_dropped() {
        let bus = EventBus::<u32>::new(2);
        let mut listener = bus.subscribe();

        drop(bus);

        assert_eq!(listener.recv().await, None);
    }
}
