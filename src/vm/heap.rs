//! Allocation of heap values with a live-object count.
//!
//! Strings and objects are reference counted through `Rc`. Each one carries
//! a [`Tracked`] token tied to the [`Heap`] that created it, so the number
//! of heap values still alive can be read at any time.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::value::{Object, StringObject, Value};

/// Allocator handle shared by every value it creates.
#[derive(Debug, Clone, Default)]
pub struct Heap {
    live: Rc<Cell<usize>>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a string value.
    pub fn string(&self, content: impl Into<String>) -> Value {
        Value::String(Rc::new(StringObject::new(content.into(), self.track())))
    }

    /// Allocate an empty object.
    pub fn object(&self) -> Value {
        Value::Object(Rc::new(RefCell::new(Object::new(self.track()))))
    }

    /// Number of strings and objects not yet freed.
    pub fn live(&self) -> usize {
        self.live.get()
    }

    fn track(&self) -> Tracked {
        self.live.set(self.live.get() + 1);
        Tracked(Rc::clone(&self.live))
    }
}

/// Counts one live heap value; decrements the count when dropped.
pub struct Tracked(Rc<Cell<usize>>);

impl Drop for Tracked {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_follows_last_reference() {
        let heap = Heap::new();
        let s = heap.string("a");
        let copy = s.clone();
        assert_eq!(heap.live(), 1);
        drop(s);
        assert_eq!(heap.live(), 1);
        drop(copy);
        assert_eq!(heap.live(), 0);
    }

    #[test]
    fn test_nested_values_are_released_with_their_owner() {
        let heap = Heap::new();
        let outer = heap.object();
        let inner = heap.object();
        if let Value::Object(obj) = &outer {
            obj.borrow_mut().set("name", heap.string("x"), 64);
            obj.borrow_mut().set("inner", inner, 64);
        }
        assert_eq!(heap.live(), 3);
        drop(outer);
        assert_eq!(heap.live(), 0);
    }

    #[test]
    fn test_self_reference_leaks() {
        let heap = Heap::new();
        let obj = heap.object();
        if let Value::Object(inner) = &obj {
            inner.borrow_mut().set("self", obj.clone(), 64);
        }
        drop(obj);
        assert_eq!(heap.live(), 1);
    }
}
