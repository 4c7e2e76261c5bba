use crate::node::{NodeEvent, PipelineNode};
use sift_base::{Error, Guid, Result};
use sift_data::Dataset;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, trace};

pub type NodeId = Guid;

struct Slot {
    id: NodeId,
    node: Box<dyn PipelineNode>,
    /// Parallel to `node.inputs()`.
    upstream: Vec<NodeId>,
}

/// Owns the nodes of one acyclic pipeline and delivers their events.
///
/// Every structural edit and every [`Pipeline::edit`] ends by draining the
/// events the touched node raised and dispatching them, breadth first, to
/// its consumers until the graph is quiet.
#[derive(Default)]
pub struct Pipeline {
    slots: Vec<Slot>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: impl PipelineNode) -> NodeId {
        let id = NodeId::new();
        debug!(node = %id, name = node.name(), "node added");
        self.slots.push(Slot {
            id,
            node: Box::new(node),
            upstream: Vec::new(),
        });
        id
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.slots.iter().any(|slot| slot.id == id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn node<T: PipelineNode>(&self, id: NodeId) -> Result<&T> {
        self.slot(id)?
            .node
            .as_any()
            .downcast_ref::<T>()
            .ok_or(Error::NodeType {
                expected: std::any::type_name::<T>(),
            })
    }

    /// Runs `edit` on the node and then propagates whatever it raised.
    pub fn edit<T: PipelineNode, R>(
        &mut self,
        id: NodeId,
        edit: impl FnOnce(&mut T) -> R,
    ) -> Result<R> {
        let node = self
            .slot_mut(id)?
            .node
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or(Error::NodeType {
                expected: std::any::type_name::<T>(),
            })?;
        let result = edit(node);
        self.propagate(id)?;
        Ok(result)
    }

    pub fn outputs(&self, id: NodeId) -> Result<Vec<Arc<Dataset>>> {
        Ok(self.slot(id)?.node.outputs())
    }

    pub fn upstream(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(&self.slot(id)?.upstream)
    }

    pub fn consumers(&self, id: NodeId) -> Vec<NodeId> {
        self.slots
            .iter()
            .filter(|slot| slot.upstream.contains(&id))
            .map(|slot| slot.id)
            .collect()
    }

    /// Appends `upstream`'s output as the next input of `downstream`, then
    /// lets `downstream` rebuild.
    pub fn connect(&mut self, upstream: NodeId, downstream: NodeId) -> Result<()> {
        let port = self.slot(upstream)?.node.output_port().clone();
        if !self.slot(downstream)?.node.accepts_inputs() {
            return Err(Error::InvalidParameter(format!(
                "node {downstream} does not accept inputs"
            )));
        }
        if upstream == downstream || self.reaches(downstream, upstream) {
            return Err(Error::Cycle {
                upstream,
                downstream,
            });
        }

        let slot = self.slot_mut(downstream)?;
        slot.upstream.push(upstream);
        slot.node.inputs_mut().push(port);
        debug!(%upstream, %downstream, "nodes connected");

        self.slot_mut(downstream)?.node.update_pipeline();
        self.propagate(downstream)
    }

    /// Removes the first `upstream -> downstream` link. The downstream
    /// outputs are left as they were; with inputs remaining it rebuilds.
    pub fn disconnect(&mut self, upstream: NodeId, downstream: NodeId) -> Result<bool> {
        self.slot(upstream)?;
        let slot = self.slot_mut(downstream)?;
        let Some(position) = slot.upstream.iter().position(|&id| id == upstream) else {
            return Ok(false);
        };
        slot.upstream.remove(position);
        slot.node.inputs_mut().remove(position);
        debug!(%upstream, %downstream, "nodes disconnected");

        slot.node.update_pipeline();
        self.propagate(downstream)?;
        Ok(true)
    }

    /// Drops a node together with all of its links.
    pub fn remove(&mut self, id: NodeId) -> Result<Box<dyn PipelineNode>> {
        for consumer in self.consumers(id) {
            while self.disconnect(id, consumer)? {}
        }
        let index = self.index(id)?;
        let slot = self.slots.remove(index);
        debug!(node = %id, "node removed");
        Ok(slot.node)
    }

    fn propagate(&mut self, origin: NodeId) -> Result<()> {
        let mut queue: VecDeque<(NodeId, NodeEvent)> = self
            .slot_mut(origin)?
            .node
            .take_events()
            .into_iter()
            .map(|event| (origin, event))
            .collect();

        while let Some((from, event)) = queue.pop_front() {
            for consumer in self.consumers(from) {
                let node = &mut self.slot_mut(consumer)?.node;
                trace!(%from, to = %consumer, ?event, "dispatching event");
                match event {
                    NodeEvent::DataChanged => node.update_data(),
                    NodeEvent::PipelineChanged => node.update_pipeline(),
                }
                queue.extend(node.take_events().into_iter().map(|e| (consumer, e)));
            }
        }
        Ok(())
    }

    /// Whether `to` is reachable from `from` along consumer links.
    fn reaches(&self, from: NodeId, to: NodeId) -> bool {
        let mut stack = vec![from];
        let mut seen = Vec::new();
        while let Some(id) = stack.pop() {
            if id == to {
                return true;
            }
            if seen.contains(&id) {
                continue;
            }
            seen.push(id);
            stack.extend(self.consumers(id));
        }
        false
    }

    fn index(&self, id: NodeId) -> Result<usize> {
        self.slots
            .iter()
            .position(|slot| slot.id == id)
            .ok_or(Error::UnknownNode(id))
    }

    fn slot(&self, id: NodeId) -> Result<&Slot> {
        let index = self.index(id)?;
        Ok(&self.slots[index])
    }

    fn slot_mut(&mut self, id: NodeId) -> Result<&mut Slot> {
        let index = self.index(id)?;
        Ok(&mut self.slots[index])
    }
}
