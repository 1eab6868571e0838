//! Typed change notifications.
//!
//! Each producer owns a [`Subscribers`] list for its own event type. Consumers
//! hold the receiving end and drain it when they get a turn, pushing reactions
//! through a [`ReactionQueue`] so they run in arrival order.

use crate::tileset::{SheetKey, Tileset};
use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender};

/// Emitted by [`crate::MapData`] after each change is committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapEvent {
    /// The whole map is about to be replaced
    Loading,
    /// A new map is in place
    Loaded,
    /// Color or walkability of a layer changed
    LayerUpdated(usize),
    /// A layer now uses a different tileset
    LayerTilesetUpdated(usize),
    /// A layer was inserted at this index
    LayerAdded(usize),
    /// The layer at this index was removed
    LayerRemoved(usize),
    /// A cell was written; `layer` is -1 when every layer was
    CellsUpdated {
        /// Column
        x: i32,
        /// Row
        y: i32,
        /// Layer written
        layer: i32,
    },
}

/// Emitted by [`crate::TilesetStore`]
#[derive(Debug, Clone, PartialEq)]
pub enum TilesetEvent {
    /// Number of tilesets available after a load pass
    Loaded(usize),
    /// This tileset could not be loaded and was dropped
    LoadError(Tileset),
    /// A recolored sheet is ready
    Colorized(SheetKey),
}

/// Fan-out list of event receivers
#[derive(Debug)]
pub struct Subscribers<E> {
    senders: Vec<Sender<E>>,
}

impl<E> Default for Subscribers<E> {
    fn default() -> Self {
        Subscribers {
            senders: Vec::new(),
        }
    }
}

impl<E: Clone> Subscribers<E> {
    /// New receiver for every event emitted from now on
    pub fn subscribe(&mut self) -> Receiver<E> {
        let (tx, rx) = channel();
        self.senders.push(tx);
        rx
    }

    /// Sends `event` to every live receiver, dropping the ones that hung up
    pub fn emit(&mut self, event: E) {
        self.senders.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Live receiver count
    pub fn len(&self) -> usize {
        self.senders.len()
    }

    /// True with no receivers
    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

/// Events that make every reaction queued before them stale
pub trait Reaction {
    /// True if queuing this clears pending reactions
    fn cancels_pending(&self) -> bool;
}

impl Reaction for MapEvent {
    fn cancels_pending(&self) -> bool {
        matches!(self, MapEvent::Loading)
    }
}

impl Reaction for TilesetEvent {
    fn cancels_pending(&self) -> bool {
        false
    }
}

/// Strict FIFO of pending reactions
#[derive(Debug)]
pub struct ReactionQueue<T> {
    pending: VecDeque<T>,
}

impl<T> Default for ReactionQueue<T> {
    fn default() -> Self {
        ReactionQueue {
            pending: VecDeque::new(),
        }
    }
}

impl<T: Reaction> ReactionQueue<T> {
    /// Queues `item`. A cancelling item replaces everything pending.
    pub fn push(&mut self, item: T) {
        if item.cancels_pending() && !self.pending.is_empty() {
            log::debug!("dropping {} stale reactions", self.pending.len());
            self.pending.clear();
        }
        self.pending.push_back(item);
    }
}

impl<T> ReactionQueue<T> {
    /// Oldest pending reaction
    pub fn pop(&mut self) -> Option<T> {
        self.pending.pop_front()
    }

    /// Drops everything pending
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Pending count
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True with nothing pending
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_is_fifo() {
        let mut q = ReactionQueue::default();
        q.push(MapEvent::LayerUpdated(0));
        q.push(MapEvent::LayerAdded(1));
        assert_eq!(q.pop(), Some(MapEvent::LayerUpdated(0)));
        assert_eq!(q.pop(), Some(MapEvent::LayerAdded(1)));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn loading_clears_pending() {
        let mut q = ReactionQueue::default();
        q.push(MapEvent::LayerUpdated(0));
        q.push(MapEvent::CellsUpdated { x: 1, y: 1, layer: 0 });
        q.push(MapEvent::Loading);
        q.push(MapEvent::Loaded);
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop(), Some(MapEvent::Loading));
        assert_eq!(q.pop(), Some(MapEvent::Loaded));
    }

    #[test]
    fn dropped_receivers_are_pruned() {
        let mut subs = Subscribers::default();
        let keep = subs.subscribe();
        let gone = subs.subscribe();
        drop(gone);
        subs.emit(MapEvent::Loaded);
        assert_eq!(subs.len(), 1);
        assert_eq!(keep.try_recv(), Ok(MapEvent::Loaded));
    }
}
