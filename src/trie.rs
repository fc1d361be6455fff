//! 64-ary compressed radix trie keyed directly on the 32-bit key, with
//! inner nodes drawn from a [`BlockAllocator`].
//!
//! The key is consumed 6 bits at a time from the most significant end,
//! giving 5 full 64-ary levels plus a final 2-bit level (5*6 + 2 = 32).
//! An inner node with exactly one child is elided and its child hoisted
//! into the parent slot (compression); inserting a second, diverging key
//! into a compressed leaf reverses this (decompression) down to the first
//! level at which the two keys' chunks differ.
//!
//! All inner nodes share one fixed-size/fixed-alignment shape regardless
//! of level so a single `BlockAllocator` (one block size) can back the
//! whole trie — the final, 2-bit level only ever populates 4 of the 64
//! slots of the node shape it shares with the full levels; the remaining
//! slots stay `Empty`. This trades a little memory at the last level for
//! not needing two allocator pools, and is recorded as a deliberate
//! simplification in `DESIGN.md`.

use core::ptr::NonNull;

use crate::alloc::BlockAllocator;
use crate::error::AssocError;
use crate::hint::likely;
use crate::list::List;
use crate::node::Node;

const BUCKET_BIT: u32 = 6;
const BUCKET_MAX: usize = 1 << BUCKET_BIT;
const BUCKET_MASK: u32 = (BUCKET_MAX as u32) - 1;
const FULL_LEVELS: u32 = 5;
const FINAL_BITS: u32 = 2;

fn chunk(key: u32, level: u32) -> usize {
    if level < FULL_LEVELS {
        let shift = 32 - BUCKET_BIT * (level + 1);
        ((key >> shift) & BUCKET_MASK) as usize
    } else {
        (key & ((1 << FINAL_BITS) - 1)) as usize
    }
}

enum Child<T> {
    Empty,
    Leaf(List<T>),
    Inner(NonNull<InnerNode<T>>),
}

impl<T> Copy for Child<T> {}
impl<T> Clone for Child<T> {
    fn clone(&self) -> Self {
        match self {
            Child::Empty => Child::Empty,
            Child::Leaf(l) => Child::Leaf(*l),
            Child::Inner(p) => Child::Inner(*p),
        }
    }
}

struct InnerNode<T> {
    children: [Child<T>; BUCKET_MAX],
}

pub struct Trie<T> {
    root: Child<T>,
    alloc: BlockAllocator,
    node_count: u32,
    count: u32,
}

impl<T> Trie<T> {
    pub fn new() -> Result<Self, AssocError> {
        let alloc = BlockAllocator::new(
            core::mem::size_of::<InnerNode<T>>(),
            core::mem::align_of::<InnerNode<T>>(),
        )?;
        Ok(Trie {
            root: Child::Empty,
            alloc,
            node_count: 0,
            count: 0,
        })
    }

    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    #[inline]
    pub fn node_count(&self) -> u32 {
        self.node_count
    }

    pub fn memory_usage(&self) -> usize {
        self.alloc.memory_usage()
    }

    fn alloc_inner(&mut self) -> NonNull<InnerNode<T>> {
        let raw = self.alloc.alloc();
        let ptr = raw.cast::<InnerNode<T>>();
        unsafe {
            ptr.as_ptr().write(InnerNode {
                children: [Child::Empty; BUCKET_MAX],
            });
        }
        self.node_count += 1;
        ptr
    }

    fn free_inner(&mut self, inner: NonNull<InnerNode<T>>) {
        unsafe {
            core::ptr::drop_in_place(inner.as_ptr());
            self.alloc.free(inner.cast());
        }
        self.node_count -= 1;
    }

    /// # Safety
    /// `node` must point at a live, pinned, detached `Node<T>`.
    pub unsafe fn insert(&mut self, mut node: NonNull<Node<T>>, data: NonNull<T>, key: u32) {
        debug_assert_eq!(node.as_ref().data(), data);
        node.as_mut().set_key(key);
        let root = self.root;
        self.root = self.insert_rec(root, 0, key, node);
        self.count += 1;
    }

    fn insert_rec(&mut self, slot: Child<T>, level: u32, key: u32, node: NonNull<Node<T>>) -> Child<T> {
        match slot {
            Child::Empty => {
                let mut list = List::new();
                unsafe { list.insert_tail(node) };
                Child::Leaf(list)
            }
            Child::Leaf(mut list) => {
                let existing_key = unsafe { list.head().expect("leaf is never empty").as_ref().key() };
                if existing_key == key {
                    unsafe { list.insert_tail(node) };
                    Child::Leaf(list)
                } else {
                    // Decompress: both keys continue past this level, so
                    // carve an inner node and push the existing leaf one
                    // level down before re-attempting the new insert —
                    // which recurses again if the two keys still collide
                    // on the next chunk too.
                    let mut inner = self.alloc_inner();
                    let existing_chunk = chunk(existing_key, level);
                    unsafe { inner.as_mut().children[existing_chunk] = Child::Leaf(list) };
                    let new_chunk = chunk(key, level);
                    let existing_child = unsafe { inner.as_ref().children[new_chunk] };
                    let updated = self.insert_rec(existing_child, level + 1, key, node);
                    unsafe { inner.as_mut().children[new_chunk] = updated };
                    Child::Inner(inner)
                }
            }
            Child::Inner(inner) => {
                let c = chunk(key, level);
                let child = unsafe { inner.as_ref().children[c] };
                let updated = self.insert_rec(child, level + 1, key, node);
                let mut inner = inner;
                unsafe { inner.as_mut().children[c] = updated };
                Child::Inner(inner)
            }
        }
    }

    fn find_leaf(&self, key: u32) -> Option<List<T>> {
        let mut cur = self.root;
        let mut level = 0;
        loop {
            match cur {
                Child::Empty => return None,
                Child::Leaf(list) => {
                    let existing = unsafe { list.head()?.as_ref().key() };
                    return if likely(existing == key) { Some(list) } else { None };
                }
                Child::Inner(inner) => {
                    let c = chunk(key, level);
                    cur = unsafe { inner.as_ref().children[c] };
                    level += 1;
                }
            }
        }
    }

    pub fn search(&self, key: u32) -> Option<NonNull<T>> {
        self.find_leaf(key)
            .and_then(|l| l.head())
            .map(|n| unsafe { n.as_ref().data() })
    }

    /// Raw head of the collision list for the exact key, if any.
    pub fn bucket(&self, key: u32) -> Option<NonNull<Node<T>>> {
        self.find_leaf(key).and_then(|l| l.head())
    }

    pub fn remove(&mut self, key: u32) -> Option<NonNull<T>> {
        let node = self.bucket(key)?;
        Some(unsafe { self.remove_existing(node) })
    }

    /// # Safety
    /// `node` must be a member of this trie.
    pub unsafe fn remove_existing(&mut self, node: NonNull<Node<T>>) -> NonNull<T> {
        let key = node.as_ref().key();
        let data = node.as_ref().data();
        let root = self.root;
        self.root = self.remove_rec(root, 0, key, node);
        self.count -= 1;
        data
    }

    fn remove_rec(&mut self, slot: Child<T>, level: u32, key: u32, node: NonNull<Node<T>>) -> Child<T> {
        match slot {
            Child::Empty => unreachable!("remove_existing on a node not present in this trie"),
            Child::Leaf(mut list) => {
                unsafe { list.remove_existing(node) };
                if list.is_empty() {
                    Child::Empty
                } else {
                    Child::Leaf(list)
                }
            }
            Child::Inner(inner) => {
                let c = chunk(key, level);
                let child = unsafe { inner.as_ref().children[c] };
                let updated = self.remove_rec(child, level + 1, key, node);
                let mut inner = inner;
                unsafe { inner.as_mut().children[c] = updated };
                match count_children(inner) {
                    (_, 0) => {
                        self.free_inner(inner);
                        Child::Empty
                    }
                    (only, 1) => {
                        let sole = unsafe { inner.as_ref().children[only] };
                        self.free_inner(inner);
                        sole
                    }
                    _ => Child::Inner(inner),
                }
            }
        }
    }

    pub fn foreach<F: FnMut(NonNull<T>)>(&self, mut f: F) {
        Self::foreach_rec(&self.root, &mut f);
    }

    fn foreach_rec<F: FnMut(NonNull<T>)>(child: &Child<T>, f: &mut F) {
        match child {
            Child::Empty => {}
            Child::Leaf(list) => list.foreach(&mut *f),
            Child::Inner(inner) => unsafe {
                for c in inner.as_ref().children.iter() {
                    Self::foreach_rec(c, f);
                }
            },
        }
    }

    pub fn foreach_arg<A, F: FnMut(&mut A, NonNull<T>)>(&self, arg: &mut A, mut f: F) {
        Self::foreach_arg_rec(&self.root, arg, &mut f);
    }

    /// Releases the block allocator's slabs, leaving the trie as if freshly
    /// constructed.
    ///
    /// Precondition: `count() == 0` — not checked in release builds, per §7
    /// (the caller must already have removed every element it inserted).
    pub fn done(&mut self) {
        debug_assert_eq!(self.count, 0, "done called on a non-empty trie");
        self.alloc.done();
        self.root = Child::Empty;
        self.node_count = 0;
    }

    fn foreach_arg_rec<A, F: FnMut(&mut A, NonNull<T>)>(child: &Child<T>, arg: &mut A, f: &mut F) {
        match child {
            Child::Empty => {}
            Child::Leaf(list) => list.foreach_arg(arg, &mut *f),
            Child::Inner(inner) => unsafe {
                for c in inner.as_ref().children.iter() {
                    Self::foreach_arg_rec(c, arg, f);
                }
            },
        }
    }
}

fn count_children<T>(inner: NonNull<InnerNode<T>>) -> (usize, usize) {
    let mut count = 0;
    let mut last = 0;
    unsafe {
        for (i, c) in inner.as_ref().children.iter().enumerate() {
            if !matches!(c, Child::Empty) {
                count += 1;
                last = i;
            }
        }
    }
    (last, count)
}
