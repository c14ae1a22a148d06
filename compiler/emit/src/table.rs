//! Proposition name <-> positive integer bijection (spec §4.9).
//!
//! Integers are assigned in first-encounter order starting at 1, matching
//! the DIMACS convention that variable numbering has no required meaning
//! beyond uniqueness — we just make it deterministic by walking the clause
//! list in order.

use indexmap::IndexMap;

/// Bijective name/id table built while walking a clause set.
///
/// `IndexMap` keeps insertion order so `names_in_order` (used for the table
/// file and for grouping Tseytin auxiliaries into the innermost existential
/// block) matches assignment order without a separate sort.
#[derive(Default, Debug, Clone)]
pub struct NameTable {
    ids: IndexMap<String, u32>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `name`, assigning the next integer if this is the
    /// first time `name` is seen.
    pub fn intern(&mut self, name: &str) -> u32 {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.ids.len() as u32 + 1;
        self.ids.insert(name.to_string(), id);
        id
    }

    pub fn id_of(&self, name: &str) -> Option<u32> {
        self.ids.get(name).copied()
    }

    pub fn name_of(&self, id: u32) -> Option<&str> {
        self.ids.iter().find(|(_, &v)| v == id).map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Names in assignment order, paired with their id.
    pub fn entries(&self) -> impl Iterator<Item = (&str, u32)> {
        self.ids.iter().map(|(name, &id)| (name.as_str(), id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_the_same_name_twice_returns_the_same_id() {
        let mut table = NameTable::new();
        assert_eq!(table.intern("a"), 1);
        assert_eq!(table.intern("b"), 2);
        assert_eq!(table.intern("a"), 1);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn name_of_and_id_of_round_trip() {
        let mut table = NameTable::new();
        table.intern("p(1)");
        table.intern("p(2)");
        assert_eq!(table.id_of("p(2)"), Some(2));
        assert_eq!(table.name_of(1), Some("p(1)"));
        assert_eq!(table.name_of(99), None);
    }

    #[test]
    fn entries_preserve_assignment_order() {
        let mut table = NameTable::new();
        table.intern("z");
        table.intern("a");
        let entries: Vec<_> = table.entries().collect();
        assert_eq!(entries, vec![("z", 1), ("a", 2)]);
    }
}
