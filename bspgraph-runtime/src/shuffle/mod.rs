pub mod partitioner;

use crate::shuffle::partitioner::Partitioner;
use bspgraph_api::function::MessageCombiner;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

pub type Outbox<K, M> = Vec<(K, M)>;
pub type Inbox<K, M> = HashMap<K, Vec<M>>;
pub type Inboxes<K, M> = Vec<Inbox<K, M>>;

/// Result of one barrier exchange.
pub struct RoutedMessages<K, M> {
    pub inboxes: Inboxes<K, M>,
    /// Messages handed in by the workers, before combining.
    pub sent: usize,
    /// Messages placed in inboxes, after combining.
    pub delivered: usize,
}

/// Groups the outboxes of superstep `t` by destination into the per
/// partition inboxes read in superstep `t + 1`.
pub struct MessageRouter<K, M> {
    partitioner: Arc<dyn Partitioner<K>>,
    partitions: usize,
    combiner: Option<Box<dyn MessageCombiner<M>>>,
}

impl<K, M> MessageRouter<K, M>
where
    K: Hash + Eq,
{
    pub fn new(partitioner: Arc<dyn Partitioner<K>>, partitions: usize) -> Self {
        Self {
            partitioner,
            partitions: partitions.max(1),
            combiner: None,
        }
    }

    pub fn with_combiner(mut self, combiner: Option<Box<dyn MessageCombiner<M>>>) -> Self {
        self.combiner = combiner;
        self
    }

    pub fn partitions(&self) -> usize {
        self.partitions
    }

    pub fn new_inboxes(&self) -> Inboxes<K, M> {
        (0..self.partitions).map(|_| HashMap::new()).collect()
    }

    /// Consumes every outbox. The returned inboxes replace the previous ones
    /// wholesale.
    pub fn route(&self, outboxes: Vec<Outbox<K, M>>) -> RoutedMessages<K, M> {
        let mut inboxes = self.new_inboxes();
        let mut sent = 0usize;
        for outbox in outboxes {
            sent += outbox.len();
            for (target, msg) in outbox {
                let p = self.partitioner.partition_of(&target, self.partitions);
                self.deliver(&mut inboxes[p], target, msg);
            }
        }
        let delivered = inboxes
            .iter()
            .flat_map(|inbox| inbox.values())
            .map(Vec::len)
            .sum();
        RoutedMessages {
            inboxes,
            sent,
            delivered,
        }
    }

    fn deliver(&self, inbox: &mut Inbox<K, M>, target: K, msg: M) {
        let slot = inbox.entry(target).or_default();
        match (&self.combiner, slot.pop()) {
            (Some(combiner), Some(prev)) => slot.push(combiner.combine(prev, msg)),
            (_, prev) => {
                slot.extend(prev);
                slot.push(msg);
            }
        }
    }
}
