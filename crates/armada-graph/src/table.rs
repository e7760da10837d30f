//! Insertion-ordered table of `Arc`-shared rows.
//!
//! Cloning a table clones the index and bumps one reference count per row;
//! the rows themselves are copied only when [`Table::get_mut`] is called on a
//! row that is still shared with another snapshot.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::GraphError;
use crate::entity::Entity;

/// Rows of one entity kind, keyed by identifier.
///
/// Iteration follows insertion order. The order is stable but carries no
/// meaning.
#[derive(Debug, Clone, PartialEq)]
pub struct Table<E: Entity> {
    rows: BTreeMap<E::Id, Arc<E>>,
    order: Vec<E::Id>,
}

impl<E: Entity> Default for Table<E> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            order: Vec::new(),
        }
    }
}

impl<E: Entity> Table<E> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether a row with this identifier exists.
    pub fn contains(&self, id: &str) -> bool {
        self.rows.contains_key(id)
    }

    /// Look up a row.
    pub fn get(&self, id: &str) -> Option<&E> {
        self.rows.get(id).map(Arc::as_ref)
    }

    /// Look up the shared handle of a row.
    pub fn get_arc(&self, id: &str) -> Option<&Arc<E>> {
        self.rows.get(id)
    }

    /// Mutable access to a row, copying it first if another snapshot still
    /// shares it.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut E> {
        self.rows.get_mut(id).map(Arc::make_mut)
    }

    /// Insert a new row.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateId`] if the identifier is already taken.
    pub fn insert(&mut self, row: E) -> Result<(), GraphError> {
        let id = row.id().clone();
        if self.rows.contains_key::<E::Id>(&id) {
            return Err(GraphError::DuplicateId {
                kind: E::KIND,
                id: id.to_string(),
            });
        }
        self.order.push(id.clone());
        self.rows.insert(id, Arc::new(row));
        Ok(())
    }

    /// Remove a row, returning it if it existed.
    pub fn remove(&mut self, id: &str) -> Option<Arc<E>> {
        let removed = self.rows.remove(id)?;
        self.order.retain(|existing| existing.as_ref() != id);
        Some(removed)
    }

    /// Iterate rows in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.order
            .iter()
            .filter_map(|id| self.rows.get::<E::Id>(id).map(Arc::as_ref))
    }

    /// Identifiers in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &E::Id> {
        self.order.iter()
    }

    /// Apply `f` to every row matching `pred`, copying those rows if they
    /// are shared. Returns the sum of what `f` reports.
    pub(crate) fn update_where(
        &mut self,
        pred: impl Fn(&E) -> bool,
        mut f: impl FnMut(&mut E) -> usize,
    ) -> usize {
        let mut total = 0_usize;
        for row in self.rows.values_mut() {
            if pred(&**row) {
                total = total.saturating_add(f(Arc::make_mut(row)));
            }
        }
        total
    }
}
