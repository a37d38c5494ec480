//! The tree of related packets making up the current group.
//!
//! A group is rooted at a key certificate, a run of one-pass
//! signatures, or a bare leading signature; the packets that follow
//! and belong to it are appended in arrival order.  Instead of a
//! linked list of owning pointers, the nodes live in an arena and
//! refer to each other by index.

use crate::Packet;
use crate::packet::Tag;

/// Names a node in a [`Tree`].
///
///   [`Tree`]: struct.Tree.html
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct NodeHandle(usize);

#[derive(Debug)]
struct Node {
    packet: Packet,
    next: Option<NodeHandle>,
}

/// An ordered tree of packets belonging to one group.
///
/// There is always a root; a `Tree` cannot be empty.
#[derive(Debug)]
pub(crate) struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Creates a tree rooted at the given packet.
    pub fn new(root: Packet) -> Self {
        Tree {
            nodes: vec![Node { packet: root, next: None }],
        }
    }

    /// Returns the root handle.
    pub fn root(&self) -> NodeHandle {
        NodeHandle(0)
    }

    /// Appends a packet at the end of the group.
    pub fn append(&mut self, packet: Packet) -> NodeHandle {
        let handle = NodeHandle(self.nodes.len());
        self.nodes.push(Node { packet, next: None });
        self.nodes[handle.0 - 1].next = Some(handle);
        handle
    }

    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the packet owned by the given node.
    pub fn packet(&self, handle: NodeHandle) -> &Packet {
        &self.nodes[handle.0].packet
    }

    /// Returns the node following `handle`, if any.
    pub fn next(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.nodes[handle.0].next
    }

    /// Finds the next node with the given tag, strictly after
    /// `handle`.
    pub fn find_next(&self, handle: NodeHandle, tag: Tag)
                     -> Option<NodeHandle>
    {
        let mut cursor = self.next(handle);
        while let Some(h) = cursor {
            if self.packet(h).tag() == tag {
                return Some(h);
            }
            cursor = self.next(h);
        }
        None
    }

    /// Finds the nearest node with the given tag, strictly before
    /// `handle`.
    pub fn find_prev(&self, handle: NodeHandle, tag: Tag)
                     -> Option<NodeHandle>
    {
        let mut found = None;
        let mut cursor = Some(self.root());
        while let Some(h) = cursor {
            if h == handle {
                return found;
            }
            if self.packet(h).tag() == tag {
                found = Some(h);
            }
            cursor = self.next(h);
        }
        None
    }
}
