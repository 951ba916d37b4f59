/// Doubly linked list over a slot arena.
///
/// Nodes live in a `Vec` and link to each other by slot index, so there are
/// no reference cycles and no `unsafe`. Freed slots are recycled through a
/// free list, which keeps `append`, `prepend`, `remove_head` and
/// `remove_last` O(1).
#[derive(Debug, Clone)]
pub struct DoublyLinkedList<T> {
    slots: Vec<Option<Node<T>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

#[derive(Debug, Clone)]
struct Node<T> {
    value: T,
    prev: Option<usize>,
    next: Option<usize>,
}

impl<T> Default for DoublyLinkedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DoublyLinkedList<T> {
    pub fn new() -> Self {
        DoublyLinkedList {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn head(&self) -> Option<&T> {
        self.head.map(|i| &self.node(i).value)
    }

    pub fn tail(&self) -> Option<&T> {
        self.tail.map(|i| &self.node(i).value)
    }

    /// Add to the end of the list
    pub fn append(&mut self, value: T) {
        let idx = self.alloc(Node {
            value,
            prev: self.tail,
            next: None,
        });
        match self.tail {
            Some(old_tail) => self.node_mut(old_tail).next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
        self.len += 1;
    }

    /// Add to the front of the list
    pub fn prepend(&mut self, value: T) {
        let idx = self.alloc(Node {
            value,
            prev: None,
            next: self.head,
        });
        match self.head {
            Some(old_head) => self.node_mut(old_head).prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
        self.len += 1;
    }

    pub fn remove_head(&mut self) -> Option<T> {
        let idx = self.head?;
        let node = self.release(idx);
        self.head = node.next;
        match node.next {
            Some(next) => self.node_mut(next).prev = None,
            None => self.tail = None,
        }
        self.len -= 1;
        Some(node.value)
    }

    pub fn remove_last(&mut self) -> Option<T> {
        let idx = self.tail?;
        let node = self.release(idx);
        self.tail = node.prev;
        match node.prev {
            Some(prev) => self.node_mut(prev).next = None,
            None => self.head = None,
        }
        self.len -= 1;
        Some(node.value)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Head-to-tail traversal
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            front: self.head,
            back: self.tail,
            remaining: self.len,
        }
    }

    /// Copy the list out head-to-tail
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }

    fn alloc(&mut self, node: Node<T>) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        }
    }

    fn release(&mut self, idx: usize) -> Node<T> {
        let node = self.slots[idx]
            .take()
            .unwrap_or_else(|| unreachable!("linked node {} already released", idx));
        self.free.push(idx);
        node
    }

    fn node(&self, idx: usize) -> &Node<T> {
        self.slots[idx]
            .as_ref()
            .unwrap_or_else(|| unreachable!("dangling link to slot {}", idx))
    }

    fn node_mut(&mut self, idx: usize) -> &mut Node<T> {
        self.slots[idx]
            .as_mut()
            .unwrap_or_else(|| unreachable!("dangling link to slot {}", idx))
    }
}

impl<T> FromIterator<T> for DoublyLinkedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = DoublyLinkedList::new();
        for value in iter {
            list.append(value);
        }
        list
    }
}

pub struct Iter<'a, T> {
    list: &'a DoublyLinkedList<T>,
    front: Option<usize>,
    back: Option<usize>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.list.node(self.front?);
        self.front = node.next;
        self.remaining -= 1;
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.list.node(self.back?);
        self.back = node.prev;
        self.remaining -= 1;
        Some(&node.value)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
