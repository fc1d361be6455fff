//! Shared helpers for the integration test suite: leaking/reclaiming boxed
//! nodes around a plain `u32` payload, the shape every scenario in §8.5
//! needs regardless of which container it drives.

use core::ptr::NonNull;

use assoc_ds::Node;

/// Boxes `v`, leaks it, and wraps its address in a detached `Node<u32>`
/// ready to hand to a container's `insert`.
pub fn leaked_node(v: u32) -> NonNull<Node<u32>> {
    let boxed = Box::new(v);
    let data = NonNull::from(Box::leak(boxed));
    Box::leak(Box::new(Node::new(data, 0))).into()
}

/// Reclaims a node and the `u32` it points at, both originally produced by
/// [`leaked_node`]. The node must already be unlinked from every container.
pub unsafe fn free_node(node: NonNull<Node<u32>>) {
    let data = node.as_ref().data();
    drop(Box::from_raw(node.as_ptr()));
    drop(Box::from_raw(data.as_ptr()));
}
