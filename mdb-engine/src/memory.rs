//! # In-Memory Store
//!
//! Records live in a `Vec` in insertion order behind one reader/writer lock.
//! Lookups by id are linear scans; the collection is expected to stay small.
//!
//! ## Locking
//!
//! - `get` / `list` take the read lock and may run concurrently.
//! - `create` / `update` / `delete` take the write lock.
//! - No lock is held across an `.await`; every operation is synchronous and
//!   O(n) in the record count.

use parking_lot::RwLock;

use mdb_common::{NewPerson, Person, PersonPatch};

use crate::engine::PersonStore;

/// In-memory implementation of [`PersonStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    persons: RwLock<Vec<Person>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.persons.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.read().is_empty()
    }
}

impl PersonStore for MemoryStore {
    fn create(&self, params: NewPerson) -> Person {
        // The id is generated before taking the lock to keep the critical
        // section to a single push.
        let person = Person::from_params(params);
        self.persons.write().push(person.clone());
        person
    }

    fn get(&self, id: &str) -> Option<Person> {
        self.persons
            .read()
            .iter()
            .find(|person| person.id == id)
            .cloned()
    }

    fn update(&self, id: &str, patch: PersonPatch) -> Option<Person> {
        let mut persons = self.persons.write();
        let person = persons.iter_mut().find(|person| person.id == id)?;
        person.apply(patch);
        Some(person.clone())
    }

    fn delete(&self, id: &str) -> bool {
        let mut persons = self.persons.write();
        match persons.iter().position(|person| person.id == id) {
            Some(idx) => {
                persons.remove(idx);
                true
            }
            None => false,
        }
    }

    fn list(&self) -> Vec<Person> {
        self.persons.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    use super::*;

    fn params(name: &str) -> NewPerson {
        NewPerson::new(name, "30", vec!["reading".into(), "chess".into()])
    }

    #[test]
    fn create_then_get_returns_copy() {
        let store = MemoryStore::new();
        let created = store.create(params("alice"));
        let fetched = store.get(&created.id).unwrap();
        assert_eq!(created, fetched);
        assert_eq!(fetched.name, "alice");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn ids_are_never_reused() {
        let store = MemoryStore::new();
        let mut seen = HashSet::new();
        for i in 0..200 {
            let person = store.create(params(&format!("user{i}")));
            assert!(seen.insert(person.id.clone()));
            if i % 2 == 0 {
                assert!(store.delete(&person.id));
            }
        }
        assert_eq!(store.len(), 100);
    }

    #[test]
    fn partial_update_is_idempotent() {
        let store = MemoryStore::new();
        let created = store.create(params("alice"));
        let patch = PersonPatch {
            name: Some("bob".into()),
            ..PersonPatch::default()
        };

        let first = store.update(&created.id, patch.clone()).unwrap();
        let second = store.update(&created.id, patch).unwrap();

        assert_eq!(first, second);
        assert_eq!(second.name, "bob");
        assert_eq!(second.age, created.age);
        assert_eq!(second.hobbies, created.hobbies);
    }

    #[test]
    fn update_missing_returns_none() {
        let store = MemoryStore::new();
        assert!(store.update("nope", PersonPatch::default()).is_none());
    }

    #[test]
    fn delete_then_get() {
        let store = MemoryStore::new();
        let created = store.create(params("alice"));
        assert!(store.delete(&created.id));
        assert!(store.get(&created.id).is_none());
        assert!(!store.delete(&created.id));
    }

    #[test]
    fn delete_preserves_order() {
        let store = MemoryStore::new();
        let a = store.create(params("alice"));
        let b = store.create(params("bobby"));
        let c = store.create(params("carol"));
        assert!(store.delete(&b.id));
        let ids: Vec<_> = store.list().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![a.id, c.id]);
    }

    #[test]
    fn list_is_a_snapshot() {
        let store = MemoryStore::new();
        let created = store.create(params("alice"));
        let snapshot = store.list();
        store.update(
            &created.id,
            PersonPatch {
                age: Some("31".into()),
                ..PersonPatch::default()
            },
        );
        assert_eq!(snapshot[0].age, "30");
        assert_eq!(store.get(&created.id).unwrap().age, "31");
    }

    #[test]
    fn concurrent_writers_and_readers() {
        let store = Arc::new(MemoryStore::new());
        let seed = store.create(params("seed"));

        let mut handles = Vec::new();
        for t in 0..8 {
            let store = Arc::clone(&store);
            let seed_id = seed.id.clone();
            handles.push(thread::spawn(move || {
                for i in 0..50 {
                    store.create(params(&format!("t{t}-{i}")));
                    // Updates replace all three fields together, so any
                    // observed record must be internally consistent.
                    let tag = format!("{t}{i}");
                    store.update(
                        &seed_id,
                        PersonPatch {
                            name: Some(format!("name{tag}")),
                            age: Some(tag.clone()),
                            hobbies: Some(vec![tag.clone()]),
                        },
                    );
                    for person in store.list() {
                        if person.id == seed_id && person.name != "seed" {
                            let tag = &person.age;
                            assert_eq!(person.name, format!("name{tag}"));
                            assert_eq!(person.hobbies, vec![tag.clone()]);
                        }
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 1 + 8 * 50);
        let ids: HashSet<_> = store.list().into_iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), store.len());
    }
}
