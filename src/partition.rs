//! Completion of sections across mesh partitions.
//!
//! Local loops over cells only ever touch data owned by the partition. The single point of
//! synchronization is [`Communicator::complete`], which sums the contributions of points that
//! are shared between partitions so that every partition sees the same assembled value.
use crate::error::FaultError;
use crate::section::Section;
use crate::sieve::Point;
use fenris_traits::Real;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::{Arc, Barrier};

pub trait Communicator<T: Real>: Sync {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    /// Sums contributions of shared points across all partitions.
    ///
    /// Must be called exactly once per section and evaluation pass by every partition.
    fn complete(&self, section: &mut Section<T>) -> Result<(), FaultError>;
}

/// A communicator for a single, unpartitioned mesh.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SerialCommunicator;

impl<T: Real> Communicator<T> for SerialCommunicator {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn complete(&self, _section: &mut Section<T>) -> Result<(), FaultError> {
        Ok(())
    }
}

/// Maps the points a partition shares with other partitions to global identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionLink {
    shared: BTreeMap<Point, usize>,
}

impl PartitionLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shared(mut self, local: Point, global: usize) -> Self {
        self.insert(local, global);
        self
    }

    pub fn insert(&mut self, local: Point, global: usize) {
        self.shared.insert(local, global);
    }

    pub fn global(&self, local: Point) -> Option<usize> {
        self.shared.get(&local).copied()
    }

    pub fn num_shared(&self) -> usize {
        self.shared.len()
    }
}

/// Exchange state shared by the partitions of one process, each running on its own thread.
#[derive(Debug)]
pub struct SharedMemoryExchange<T> {
    size: usize,
    barrier: Barrier,
    buffer: Mutex<BTreeMap<usize, Vec<T>>>,
}

impl<T: Real> SharedMemoryExchange<T> {
    pub fn new(num_partitions: usize) -> Arc<Self> {
        assert!(num_partitions > 0, "number of partitions must be positive");
        Arc::new(Self {
            size: num_partitions,
            barrier: Barrier::new(num_partitions),
            buffer: Mutex::new(BTreeMap::new()),
        })
    }

    /// Creates the communicator used by the partition with the given rank.
    pub fn communicator(self: &Arc<Self>, rank: usize, link: PartitionLink) -> PartitionCommunicator<T> {
        assert!(rank < self.size, "rank out of bounds");
        PartitionCommunicator {
            exchange: Arc::clone(self),
            rank,
            link,
        }
    }
}

/// Communicator of a single partition taking part in a [`SharedMemoryExchange`].
#[derive(Debug, Clone)]
pub struct PartitionCommunicator<T> {
    exchange: Arc<SharedMemoryExchange<T>>,
    rank: usize,
    link: PartitionLink,
}

impl<T: Real> PartitionCommunicator<T> {
    pub fn link(&self) -> &PartitionLink {
        &self.link
    }

    fn deposit(&self, section: &Section<T>) -> Result<(), FaultError> {
        let mut buffer = self.exchange.buffer.lock();
        for (&local, &global) in &self.link.shared {
            if !section.has_point(local) {
                continue;
            }
            let values = section.restrict_point(local)?;
            let sum = buffer
                .entry(global)
                .or_insert_with(|| vec![T::zero(); values.len()]);
            if sum.len() != values.len() {
                return Err(FaultError::invariant(format!(
                    "shared point {} has fiber dimension {} on rank {}, but {} elsewhere",
                    global,
                    values.len(),
                    self.rank,
                    sum.len()
                )));
            }
            for (s, v) in sum.iter_mut().zip(values) {
                *s += *v;
            }
        }
        Ok(())
    }

    fn collect(&self, section: &mut Section<T>) -> Result<(), FaultError> {
        let buffer = self.exchange.buffer.lock();
        for (&local, &global) in &self.link.shared {
            if let (true, Some(sum)) = (section.has_point(local), buffer.get(&global)) {
                section.update_point(local, sum)?;
            }
        }
        Ok(())
    }
}

impl<T: Real> Communicator<T> for PartitionCommunicator<T> {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.exchange.size
    }

    fn complete(&self, section: &mut Section<T>) -> Result<(), FaultError> {
        // Every partition must pass all three barriers, even when it fails locally,
        // otherwise the remaining partitions would wait forever
        if self.exchange.barrier.wait().is_leader() {
            self.exchange.buffer.lock().clear();
        }
        self.exchange.barrier.wait();
        let deposited = self.deposit(section);
        self.exchange.barrier.wait();
        deposited?;
        self.collect(section)
    }
}
