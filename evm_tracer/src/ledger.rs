//! Revert-aware storage for captured operations.
//!
//! Entries live in one arena tagged with the scope they were added in.
//! Reverting a scope only flags it, so a revert never moves or drops entries;
//! liveness is resolved lazily when iterating.

use crate::error::TraceError;

type ScopeId = usize;

const ROOT: ScopeId = 0;

#[derive(Clone, Copy, Debug)]
struct Scope {
    parent: Option<ScopeId>,
    reverted: bool,
}

/// A list of operations with nested scopes mirroring transactions and call
/// frames.
#[derive(Clone, Debug)]
pub struct StackedList<T> {
    entries: Vec<(ScopeId, T)>,
    scopes: Vec<Scope>,
    /// Scopes currently open, innermost last. The root scope is implicit.
    open: Vec<ScopeId>,
}

impl<T> Default for StackedList<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            scopes: vec![Scope {
                parent: None,
                reverted: false,
            }],
            open: Vec::new(),
        }
    }
}

impl<T> StackedList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&self) -> ScopeId {
        self.open.last().copied().unwrap_or(ROOT)
    }

    /// Opens a child scope of the innermost one.
    pub fn enter(&mut self) {
        let parent = self.current();
        self.scopes.push(Scope {
            parent: Some(parent),
            reverted: false,
        });
        self.open.push(self.scopes.len() - 1);
    }

    /// Closes the innermost scope, keeping its entries.
    pub fn exit(&mut self) -> Result<(), TraceError> {
        self.open.pop().ok_or(TraceError::ScopeUnderflow)?;
        Ok(())
    }

    /// Closes the innermost scope and discards everything added since the
    /// matching [`enter`](Self::enter), nested scopes included.
    pub fn pop(&mut self) -> Result<(), TraceError> {
        let scope = self.open.pop().ok_or(TraceError::ScopeUnderflow)?;
        self.scopes[scope].reverted = true;
        Ok(())
    }

    pub fn depth(&self) -> usize {
        self.open.len()
    }

    pub fn add(&mut self, entry: T) {
        self.entries.push((self.current(), entry));
    }

    /// Liveness of every scope. A child always has a larger id than its
    /// parent, so one pass in id order suffices.
    fn live_scopes(&self) -> Vec<bool> {
        let mut live = Vec::with_capacity(self.scopes.len());
        for scope in &self.scopes {
            let parent_live = scope.parent.map_or(true, |parent| live[parent]);
            live.push(parent_live && !scope.reverted);
        }
        live
    }

    /// Live entries in capture order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + Clone + '_ {
        let live = self.live_scopes();
        self.entries
            .iter()
            .filter(move |(scope, _)| live[*scope])
            .map(|(_, entry)| entry)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The most recently added live entry.
    pub fn last_mut(&mut self) -> Option<&mut T> {
        let live = self.live_scopes();
        self.entries
            .iter_mut()
            .rev()
            .find(|(scope, _)| live[*scope])
            .map(|(_, entry)| entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(list: &StackedList<u32>) -> Vec<u32> {
        list.iter().copied().collect()
    }

    #[test]
    fn pop_drops_the_scope_and_its_children() -> Result<(), TraceError> {
        let mut list = StackedList::new();
        list.add(1);
        list.enter();
        list.add(2);
        list.enter();
        list.add(3);
        list.exit()?;
        list.add(4);
        list.pop()?;
        list.add(5);
        assert_eq!(collect(&list), vec![1, 5]);
        assert_eq!(list.len(), 2);
        Ok(())
    }

    #[test]
    fn exit_keeps_entries_in_capture_order() -> Result<(), TraceError> {
        let mut list = StackedList::new();
        list.enter();
        list.add(1);
        list.enter();
        list.add(2);
        list.pop()?;
        list.enter();
        list.add(3);
        list.exit()?;
        list.exit()?;
        list.add(4);
        assert_eq!(collect(&list), vec![1, 3, 4]);
        assert_eq!(list.depth(), 0);
        Ok(())
    }

    #[test]
    fn root_scope_cannot_be_popped() {
        let mut list = StackedList::<u32>::new();
        assert!(matches!(list.pop(), Err(TraceError::ScopeUnderflow)));
        assert!(matches!(list.exit(), Err(TraceError::ScopeUnderflow)));
        assert!(list.is_empty());
    }

    #[test]
    fn last_mut_skips_reverted_entries() -> Result<(), TraceError> {
        let mut list = StackedList::new();
        list.add(1);
        list.enter();
        list.add(2);
        list.pop()?;
        if let Some(last) = list.last_mut() {
            *last = 10;
        }
        assert_eq!(collect(&list), vec![10]);
        Ok(())
    }
}
