//! engine::guard
//!
//! Active-path tracking for recursive reference resolution.

use std::collections::HashSet;

use super::ResolveError;
use crate::core::types::Urn;

/// The ids currently being resolved, outermost first.
#[derive(Debug, Clone)]
pub struct ResolutionPath {
    stack: Vec<Urn>,
    active: HashSet<Urn>,
    limit: usize,
}

impl ResolutionPath {
    /// Create an empty path allowing at most `limit` nested ids.
    pub fn new(limit: usize) -> Self {
        Self {
            stack: Vec::new(),
            active: HashSet::new(),
            limit,
        }
    }

    /// Number of ids on the path.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Whether `id` is on the path.
    pub fn contains(&self, id: &Urn) -> bool {
        self.active.contains(id)
    }

    /// Push `id` onto the path.
    ///
    /// # Errors
    ///
    /// `CyclicReference` if `id` is already on the path, `DepthExceeded` if
    /// the path is full.
    pub fn enter(&mut self, id: &Urn) -> Result<(), ResolveError> {
        if self.active.contains(id) {
            let mut path = self.stack.clone();
            path.push(id.clone());
            return Err(ResolveError::CyclicReference { path });
        }
        if self.stack.len() >= self.limit {
            return Err(ResolveError::DepthExceeded {
                id: self.stack.first().unwrap_or(id).clone(),
                limit: self.limit,
            });
        }
        self.active.insert(id.clone());
        self.stack.push(id.clone());
        Ok(())
    }

    /// Pop `id` from the path.
    pub fn leave(&mut self, id: &Urn) {
        if self.stack.last() == Some(id) {
            self.stack.pop();
            self.active.remove(id);
        }
    }

    /// Run `f` with `id` on the path, removing it afterwards whatever the
    /// outcome.
    pub fn scoped<T>(
        &mut self,
        id: &Urn,
        f: impl FnOnce(&mut Self) -> Result<T, ResolveError>,
    ) -> Result<T, ResolveError> {
        self.enter(id)?;
        let result = f(self);
        self.leave(id);
        result
    }
}
