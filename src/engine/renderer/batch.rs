// CPU-side instance batching

use super::{Layer, RenderProxy};
use crate::core::{ModelUniform, Transform2D};
use std::cell::RefCell;
use std::rc::Rc;

/// Default number of instances per batch
const DEFAULT_BATCH_CAPACITY: usize = 256;

/// Collects model matrices into fixed-size batches.
///
/// When the pending batch is full the layer flushes early, so one frame may
/// produce several batches. The bytes of the most recent batch stay
/// available until the next flush.
#[derive(Debug)]
pub struct InstanceLayer {
    pending: Vec<ModelUniform>,
    capacity: usize,
    last_batch: Vec<u8>,
    batches_flushed: u64,
    instances_flushed: u64,
}

impl InstanceLayer {
    /// Create a layer with the default batch capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BATCH_CAPACITY)
    }

    /// Create a layer holding at most `capacity` instances per batch
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            pending: Vec::with_capacity(capacity),
            capacity,
            last_batch: Vec::new(),
            batches_flushed: 0,
            instances_flushed: 0,
        }
    }

    /// Instances waiting for the next flush
    pub fn pending(&self) -> &[ModelUniform] {
        &self.pending
    }

    /// Raw bytes of the most recently flushed batch
    pub fn last_batch(&self) -> &[u8] {
        &self.last_batch
    }

    pub fn batches_flushed(&self) -> u64 {
        self.batches_flushed
    }

    pub fn instances_flushed(&self) -> u64 {
        self.instances_flushed
    }
}

impl Default for InstanceLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Layer for InstanceLayer {
    fn accumulate(&mut self, instance: ModelUniform) {
        if self.pending.len() >= self.capacity {
            self.flush();
        }
        self.pending.push(instance);
    }

    fn flush(&mut self) -> usize {
        let count = self.pending.len();
        if count == 0 {
            return 0;
        }

        self.last_batch.clear();
        self.last_batch
            .extend_from_slice(bytemuck::cast_slice(&self.pending));
        self.pending.clear();

        self.batches_flushed += 1;
        self.instances_flushed += count as u64;
        log::trace!(
            "Flushed batch of {} instances ({} bytes)",
            count,
            self.last_batch.len()
        );
        count
    }
}

/// Render proxy that feeds a shared layer
#[derive(Debug, Clone)]
pub struct LayerProxy<L: Layer> {
    layer: Rc<RefCell<L>>,
    instance: ModelUniform,
}

impl<L: Layer> LayerProxy<L> {
    pub fn new(layer: Rc<RefCell<L>>) -> Self {
        Self {
            layer,
            instance: ModelUniform::default(),
        }
    }

    /// Instance data captured by the last `sync`
    pub fn instance(&self) -> ModelUniform {
        self.instance
    }
}

impl<L: Layer> RenderProxy for LayerProxy<L> {
    fn sync(&mut self, transform: &Transform2D) {
        self.instance = ModelUniform::new(transform);
    }

    fn submit(&mut self) {
        self.layer.borrow_mut().accumulate(self.instance);
    }
}
