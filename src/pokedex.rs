//! Caught pokemon collection
//!
//! Holds the pokemon caught during a session and decides whether a thrown
//! Pokeball succeeds. Nothing here is persisted between runs.

use std::collections::BTreeMap;

use chrono::{DateTime, Local};
use rand::Rng;

use crate::data::Pokemon;

/// A catch succeeds when the roll lands below this value
pub const CATCH_THRESHOLD: u32 = 50;

/// A pokemon in the collection along with when it was caught
#[derive(Debug, Clone)]
pub struct CaughtPokemon {
    pub pokemon: Pokemon,
    pub caught_at: DateTime<Local>,
}

/// Pokemon caught so far, keyed and listed by name
#[derive(Debug, Default)]
pub struct Pokedex {
    entries: BTreeMap<String, CaughtPokemon>,
}

impl Pokedex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pokemon, replacing any earlier catch of the same name
    pub fn insert(&mut self, pokemon: Pokemon) {
        let caught = CaughtPokemon {
            pokemon,
            caught_at: Local::now(),
        };
        self.entries.insert(caught.pokemon.name.clone(), caught);
    }

    pub fn get(&self, name: &str) -> Option<&CaughtPokemon> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates caught pokemon in alphabetical order
    pub fn iter(&self) -> impl Iterator<Item = &CaughtPokemon> {
        self.entries.values()
    }
}

/// Rolls a Pokeball throw against a pokemon's base experience
///
/// The roll is uniform in `0..base_experience`, so pokemon worth more
/// experience are harder to catch. Anything at or below the threshold is
/// always caught.
pub fn attempt_catch<R: Rng>(rng: &mut R, base_experience: u32) -> bool {
    let roll = rng.gen_range(0..base_experience.max(1));
    roll < CATCH_THRESHOLD
}
