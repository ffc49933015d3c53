//! Council membership: warriors and their registry

pub mod registry;
pub mod warrior;

pub use registry::WarriorRegistry;
pub use warrior::Warrior;
