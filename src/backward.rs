//! Reverse-mode traversal over a [`Graph`].
//!
//! Ordering uses an explicit DFS work stack so arbitrarily long expression
//! chains never grow the call stack.

use log::debug;

use crate::{
    error::TensorError,
    graph::{GradPolicy, Graph},
    storage::Storage,
    tensor::TensorId,
    tensorizable::Tensorizable,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

impl Graph {
    /// Every tensor reachable from `root` (itself included), ordered so that
    /// each tensor comes after all of its parents.
    ///
    /// # Errors
    ///
    /// [`TensorError::UnknownTensor`] for a foreign root,
    /// [`TensorError::CycleDetected`] if the parent relation is not acyclic.
    pub fn topological_order(&self, root: TensorId) -> Result<Vec<TensorId>, TensorError> {
        self.get(root)?;
        let tensors = self.tensors();
        let mut marks = vec![Mark::Unvisited; tensors.len()];
        let mut order = Vec::new();
        // (tensor, index of the next parent to expand)
        let mut stack = vec![(root, 0usize)];
        marks[root.index()] = Mark::InProgress;

        while let Some((id, next)) = stack.last_mut() {
            let parents = tensors[id.index()].parents();
            if let Some(&parent) = parents.get(*next) {
                *next += 1;
                match marks[parent.index()] {
                    Mark::Unvisited => {
                        marks[parent.index()] = Mark::InProgress;
                        stack.push((parent, 0));
                    }
                    Mark::InProgress => return Err(TensorError::CycleDetected { id: parent }),
                    Mark::Done => {}
                }
            } else {
                let id = *id;
                marks[id.index()] = Mark::Done;
                order.push(id);
                stack.pop();
            }
        }

        Ok(order)
    }

    /// All tensors `root` was computed from, excluding `root` itself.
    pub fn ancestors(&self, root: TensorId) -> Result<Vec<TensorId>, TensorError> {
        let mut order = self.topological_order(root)?;
        order.pop();
        Ok(order)
    }

    /// Backpropagates from a scalar `root` with a seed of one.
    ///
    /// Gradients accumulate into whatever the tensors already hold; call
    /// [`Graph::zero_grad`] first to reuse a graph.
    ///
    /// # Errors
    ///
    /// [`TensorError::Backward`] if `root` is not a scalar.
    pub fn backward(&mut self, root: TensorId) -> Result<(), TensorError> {
        let shape = self.get(root)?.shape();
        if !shape.is_scalar() {
            return Err(TensorError::backward(format!(
                "an explicit seed is required for a root of shape {shape}"
            )));
        }
        self.propagate(root, Storage::filled_with(1, 1.0))
    }

    /// Backpropagates from `root` with an explicit upstream gradient.
    ///
    /// # Errors
    ///
    /// [`TensorError::Backward`] if the seed cannot be built or its shape
    /// differs from the root's.
    pub fn backward_with_seed(
        &mut self,
        root: TensorId,
        seed: impl Tensorizable,
    ) -> Result<(), TensorError> {
        let expected = self.get(root)?.shape().clone();
        let seed = seed
            .to_tensor()
            .map_err(|e| TensorError::backward(format!("invalid seed: {e}")))?;
        if *seed.shape() != expected {
            return Err(TensorError::backward(format!(
                "seed of shape {} does not match root of shape {expected}",
                seed.shape()
            )));
        }
        let (storage, _) = seed.into_parts();
        self.propagate(root, storage)
    }

    /// Runs one reverse pass. The seed is added to the root's gradient, then
    /// each tensor's rule fires once, root first, on its accumulated gradient.
    fn propagate(&mut self, root: TensorId, seed: Storage<f64>) -> Result<(), TensorError> {
        let order = self.topological_order(root)?;
        debug!("backward from {root} over {} tensors", order.len());

        let policy = self.config().grad_policy;
        let tensors = self.tensors_mut();
        if policy == GradPolicy::RequiresGrad && !tensors[root.index()].tracks_grad() {
            debug!("{root} does not track gradient, nothing to propagate");
            return Ok(());
        }
        tensors[root.index()].accumulate_grad(&seed);

        for &id in order.iter().rev() {
            let tensor = &tensors[id.index()];
            if tensor.is_leaf() {
                continue;
            }
            let Some(g) = tensor.grad_storage() else {
                continue;
            };
            let contributions = tensor.op().backward(g, tensor.shape(), tensors);
            for (parent, contribution) in contributions {
                let parent = &mut tensors[parent.index()];
                if policy == GradPolicy::RequiresGrad && !parent.tracks_grad() {
                    continue;
                }
                parent.accumulate_grad(&contribution);
            }
        }

        Ok(())
    }

    /// Clears the gradient of `root` and every tensor it was computed from.
    pub fn zero_grad(&mut self, root: TensorId) -> Result<(), TensorError> {
        let order = self.topological_order(root)?;
        let tensors = self.tensors_mut();
        for id in order {
            tensors[id.index()].clear_grad();
        }
        Ok(())
    }

    /// Clears every gradient in the graph.
    pub fn zero_grad_all(&mut self) {
        self.tensors_mut().iter_mut().for_each(|t| t.clear_grad());
    }
}
