use std::fmt;

/// An event tagged with the frame it was emitted in.
#[derive(Debug, Clone, PartialEq)]
pub struct Stamped<E> {
    pub frame_index: u64,
    pub event: E,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverId(u64);

type Observer<E> = Box<dyn FnMut(&E)>;

/// Buffered events kept for polling before the oldest are discarded.
pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// A small, typed event channel.
///
/// Every event is delivered synchronously to registered observers at emit time
/// and also buffered until drained, so a caller can either subscribe or poll
/// once per frame. The buffer is bounded: a caller that only subscribes and
/// never drains loses the oldest buffered events, never the observer calls.
pub struct EventBus<E> {
    events: Vec<Stamped<E>>,
    observers: Vec<(ObserverId, Observer<E>)>,
    next_observer: u64,
    buffer_limit: usize,
    discarded: u64,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::with_buffer_limit(DEFAULT_EVENT_BUFFER)
    }
}

impl<E: fmt::Debug> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("events", &self.events)
            .field("observers", &self.observers.len())
            .field("discarded", &self.discarded)
            .finish()
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bus that buffers at most `limit` undrained events. Zero disables
    /// buffering, leaving observers as the only consumers.
    pub fn with_buffer_limit(limit: usize) -> Self {
        Self {
            events: Vec::new(),
            observers: Vec::new(),
            next_observer: 0,
            buffer_limit: limit,
            discarded: 0,
        }
    }

    /// Buffered events discarded because nobody drained them.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&E) + 'static) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    pub fn emit(&mut self, frame_index: u64, event: E) {
        for (_, observer) in &mut self.observers {
            observer(&event);
        }
        if self.buffer_limit == 0 {
            self.discarded += 1;
            return;
        }
        if self.events.len() >= self.buffer_limit {
            let excess = self.events.len() + 1 - self.buffer_limit;
            self.events.drain(..excess);
            self.discarded += excess as u64;
        }
        self.events.push(Stamped { frame_index, event });
    }

    pub fn events(&self) -> &[Stamped<E>] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<Stamped<E>> {
        std::mem::take(&mut self.events)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
