//! Warrior registry — the immutable council roster.
//!
//! Built once at startup from configuration. If operational config changes,
//! the registry is rebuilt and hot-swapped, never edited in place, so it
//! needs no locking.

use super::warrior::Warrior;
use crate::core::error::DomainError;
use std::collections::HashSet;

/// Read-only table of named warriors.
///
/// Construction rejects duplicate names and invalid temperatures, so any
/// registry that exists is internally consistent.
#[derive(Debug, Clone)]
pub struct WarriorRegistry {
    warriors: Vec<Warrior>,
}

impl WarriorRegistry {
    /// Build a registry, validating every member.
    pub fn new(warriors: Vec<Warrior>) -> Result<Self, DomainError> {
        let mut seen = HashSet::new();
        for warrior in &warriors {
            warrior.validate()?;
            if !seen.insert(warrior.name.as_str()) {
                return Err(DomainError::DuplicateWarrior(warrior.name.clone()));
            }
        }
        Ok(Self { warriors })
    }

    /// Registry with the built-in default council.
    pub fn default_council() -> Self {
        // default_council() members are constructed valid
        Self {
            warriors: Warrior::default_council(),
        }
    }

    /// All registered warriors, in configuration order.
    pub fn all(&self) -> &[Warrior] {
        &self.warriors
    }

    /// Look up a warrior by name.
    pub fn get(&self, name: &str) -> Option<&Warrior> {
        self.warriors.iter().find(|w| w.name == name)
    }

    pub fn len(&self) -> usize {
        self.warriors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warriors.is_empty()
    }
}
