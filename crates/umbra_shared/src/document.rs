use std::cell::{Ref, RefCell, RefMut};
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// Shared-ownership handle to a document. Cloning the handle clones the
/// reference, not the document: all clones observe the same tree. A single
/// parse owns exclusive mutation rights for its duration; the handle is not
/// thread-safe by design.
pub struct DocumentHandle<D>(Rc<RefCell<D>>);

impl<D> DocumentHandle<D> {
    pub fn create(document: D) -> Self {
        Self(Rc::new(RefCell::new(document)))
    }

    /// Borrows the document for reading
    pub fn get(&self) -> Ref<'_, D> {
        self.0.borrow()
    }

    /// Borrows the document for mutation
    pub fn get_mut(&self) -> RefMut<'_, D> {
        self.0.borrow_mut()
    }
}

impl<D: Debug> Debug for DocumentHandle<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("DocumentHandle").field(&self.0.borrow()).finish()
    }
}

// Deliberately not derived: a derived Clone would require D: Clone even
// though only the Rc is cloned.
impl<D> Clone for DocumentHandle<D> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

// Handle equality is identity of the shared cell, not structural equality.
impl<D> PartialEq for DocumentHandle<D> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<D> Eq for DocumentHandle<D> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_document() {
        let handle = DocumentHandle::create(vec![1, 2, 3]);
        let clone = handle.clone();

        handle.get_mut().push(4);
        assert_eq!(*clone.get(), vec![1, 2, 3, 4]);
        assert_eq!(handle, clone);
    }

    #[test]
    fn equality_is_identity() {
        let a = DocumentHandle::create(1);
        let b = DocumentHandle::create(1);
        assert_ne!(a, b);
    }
}
