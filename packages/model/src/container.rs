//! # Container addressing
//!
//! Computes [`Address`]es for paths inside a (possibly nested) container,
//! walks forward/backward in reading order, and enumerates the path range
//! between two addresses. This is the traversal primitive selections and
//! annotation transforms are built on.
//!
//! Non-addressable nodes (no text properties, not a container) are skipped;
//! missing nodes or unknown types are skipped the same way, since traversal
//! runs inside live transactions and must not fail mid-commit.

use crate::{Address, Document, ModelError, Path};
use std::cmp::Ordering;

/// Read-only addressing view over one container node.
pub struct ContainerIndex<'a> {
    doc: &'a Document,
    container_id: &'a str,
}

impl<'a> ContainerIndex<'a> {
    pub fn new(doc: &'a Document, container_id: &'a str) -> Result<Self, ModelError> {
        // Fail fast on a non-container; everything after this is defensive.
        doc.container_ids(container_id)?;
        Ok(Self { doc, container_id })
    }

    pub fn container_id(&self) -> &str {
        self.container_id
    }

    /// Address of `path` within this container, or `None` when the path's
    /// node is not shown here or not addressable.
    pub fn address_of(&self, path: &Path) -> Option<Address> {
        self.address_in(self.container_id, path)
    }

    /// Path at `address`, or `None` when the address does not resolve.
    pub fn path_at(&self, address: &Address) -> Option<Path> {
        self.path_in(self.container_id, address.parts())
    }

    pub fn first_address(&self) -> Option<Address> {
        self.first_in(self.container_id)
    }

    pub fn last_address(&self) -> Option<Address> {
        self.last_in(self.container_id)
    }

    /// Depth-first successor, stepping out of and into nested containers
    /// and skipping non-addressable nodes. `None` at the end boundary.
    pub fn next_address(&self, address: &Address) -> Option<Address> {
        self.next_in(self.container_id, address.parts())
    }

    /// Depth-first predecessor. `None` at the start boundary.
    pub fn previous_address(&self, address: &Address) -> Option<Address> {
        self.previous_in(self.container_id, address.parts())
    }

    /// Every addressable path from `a` to `b` inclusive, in reading order.
    /// Order-independent: endpoints are swapped when given reversed. Empty
    /// when either endpoint is not addressable here.
    pub fn path_range(&self, a: &Path, b: &Path) -> Vec<Path> {
        let (Some(addr_a), Some(addr_b)) = (self.address_of(a), self.address_of(b)) else {
            return Vec::new();
        };
        let (start, end) = if addr_b < addr_a {
            (addr_b, addr_a)
        } else {
            (addr_a, addr_b)
        };

        let mut paths = Vec::new();
        let mut cursor = start;
        loop {
            if let Some(path) = self.path_at(&cursor) {
                paths.push(path);
            }
            if cursor >= end {
                break;
            }
            match self.next_address(&cursor) {
                Some(next) => cursor = next,
                None => break,
            }
        }
        paths
    }

    /// Reading-order comparison of two paths; `None` when either is not
    /// addressable in this container.
    pub fn compare(&self, a: &Path, b: &Path) -> Option<Ordering> {
        Some(self.address_of(a)?.cmp(&self.address_of(b)?))
    }

    /// Reading-order comparison of two `(path, offset)` coordinates.
    pub fn compare_coordinates(
        &self,
        a: (&Path, usize),
        b: (&Path, usize),
    ) -> Option<Ordering> {
        match self.compare(a.0, b.0)? {
            Ordering::Equal => Some(a.1.cmp(&b.1)),
            ordering => Some(ordering),
        }
    }

    fn child_ids(&self, container_node_id: &str) -> Option<&'a [String]> {
        let node = self.doc.get_node(container_node_id)?;
        let node_type = self.doc.schema().node_type(&node.node_type)?;
        let prop = node_type.container_property.as_deref()?;
        node.ids(prop)
    }

    fn address_in(&self, container_node_id: &str, path: &Path) -> Option<Address> {
        let ids = self.child_ids(container_node_id)?;
        for (i, id) in ids.iter().enumerate() {
            if id == &path.node_id {
                let node = self.doc.get_node(id)?;
                let node_type = self.doc.schema().node_type(&node.node_type)?;
                let prop_index = node_type.property_index(&path.property)?;
                return Some(Address::new(vec![i as u32, prop_index as u32]));
            }
            if self.is_nested_container(id) {
                if let Some(sub) = self.address_in(id, path) {
                    return Some(sub.prepended(i as u32));
                }
            }
        }
        None
    }

    fn path_in(&self, container_node_id: &str, tail: &[u32]) -> Option<Path> {
        let ids = self.child_ids(container_node_id)?;
        let id = ids.get(*tail.first()? as usize)?;
        let node = self.doc.get_node(id)?;
        let node_type = self.doc.schema().node_type(&node.node_type)?;
        if node_type.is_text() && tail.len() == 2 {
            let prop = node_type.text_properties.get(tail[1] as usize)?;
            return Some(Path::new(id.as_str(), prop.as_str()));
        }
        if node_type.is_container() && tail.len() > 1 {
            return self.path_in(id, &tail[1..]);
        }
        None
    }

    /// Address of a node's first addressable property relative to the node
    /// itself (property index for text nodes, a full sub-address for nested
    /// containers). `None` for non-addressable nodes.
    fn first_tail(&self, node_id: &str) -> Option<Address> {
        let node = self.doc.get_node(node_id)?;
        let node_type = self.doc.schema().node_type(&node.node_type)?;
        if node_type.is_text() {
            return Some(Address::new(vec![0]));
        }
        if node_type.is_container() {
            return self.first_in(node_id);
        }
        None
    }

    fn last_tail(&self, node_id: &str) -> Option<Address> {
        let node = self.doc.get_node(node_id)?;
        let node_type = self.doc.schema().node_type(&node.node_type)?;
        if node_type.is_text() {
            return Some(Address::new(vec![node_type.text_properties.len() as u32 - 1]));
        }
        if node_type.is_container() {
            return self.last_in(node_id);
        }
        None
    }

    fn first_in(&self, container_node_id: &str) -> Option<Address> {
        let ids = self.child_ids(container_node_id)?;
        for (i, id) in ids.iter().enumerate() {
            if let Some(tail) = self.first_tail(id) {
                return Some(tail.prepended(i as u32));
            }
        }
        None
    }

    fn last_in(&self, container_node_id: &str) -> Option<Address> {
        let ids = self.child_ids(container_node_id)?;
        for (i, id) in ids.iter().enumerate().rev() {
            if let Some(tail) = self.last_tail(id) {
                return Some(tail.prepended(i as u32));
            }
        }
        None
    }

    fn next_in(&self, container_node_id: &str, tail: &[u32]) -> Option<Address> {
        let ids = self.child_ids(container_node_id)?;
        let i = *tail.first()? as usize;
        if i >= ids.len() {
            return None;
        }

        // Try to advance within the node at `i` first.
        if tail.len() > 1 {
            let id = &ids[i];
            if let Some(node) = self.doc.get_node(id) {
                if let Some(node_type) = self.doc.schema().node_type(&node.node_type) {
                    if node_type.is_text() {
                        let prop = tail[1] as usize;
                        if tail.len() == 2 && prop + 1 < node_type.text_properties.len() {
                            return Some(Address::new(vec![i as u32, prop as u32 + 1]));
                        }
                    } else if node_type.is_container() {
                        if let Some(sub) = self.next_in(id, &tail[1..]) {
                            return Some(sub.prepended(i as u32));
                        }
                    }
                }
            }
        }

        // Step out: first addressable property of a following sibling.
        for (k, id) in ids.iter().enumerate().skip(i + 1) {
            if let Some(t) = self.first_tail(id) {
                return Some(t.prepended(k as u32));
            }
        }
        None
    }

    fn previous_in(&self, container_node_id: &str, tail: &[u32]) -> Option<Address> {
        let ids = self.child_ids(container_node_id)?;
        let i = *tail.first()? as usize;
        if i >= ids.len() {
            return None;
        }

        if tail.len() > 1 {
            let id = &ids[i];
            if let Some(node) = self.doc.get_node(id) {
                if let Some(node_type) = self.doc.schema().node_type(&node.node_type) {
                    if node_type.is_text() {
                        let prop = tail[1] as usize;
                        if tail.len() == 2 && prop > 0 {
                            return Some(Address::new(vec![i as u32, prop as u32 - 1]));
                        }
                    } else if node_type.is_container() {
                        if let Some(sub) = self.previous_in(id, &tail[1..]) {
                            return Some(sub.prepended(i as u32));
                        }
                    }
                }
            }
        }

        for (k, id) in ids.iter().enumerate().take(i).rev() {
            if let Some(t) = self.last_tail(id) {
                return Some(t.prepended(k as u32));
            }
        }
        None
    }

    fn is_nested_container(&self, node_id: &str) -> bool {
        self.doc
            .get_node(node_id)
            .and_then(|n| self.doc.schema().node_type(&n.node_type))
            .map(|t| t.is_container())
            .unwrap_or(false)
    }
}
