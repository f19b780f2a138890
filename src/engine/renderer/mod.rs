// Rendering interfaces consumed by the simulation
//
// The physics core never looks at meshes or textures. Each body may carry a
// `RenderProxy`, and proxies hand their per-instance data to a `Layer` that
// batches it for submission.

mod batch;

pub use batch::{InstanceLayer, LayerProxy};

use crate::core::{ModelUniform, Transform2D};

/// Opaque render representation attached to a body
pub trait RenderProxy {
    /// Copy position and rotation from the body's transform
    fn sync(&mut self, transform: &Transform2D);

    /// Queue this instance for drawing in the current frame
    fn submit(&mut self);
}

/// A batching strategy for one kind of mesh instance
pub trait Layer {
    /// Add one instance to the pending batch
    fn accumulate(&mut self, instance: ModelUniform);

    /// Submit everything pending and return the number of instances submitted
    fn flush(&mut self) -> usize;
}
