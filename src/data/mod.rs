//! Core data models for the Pokedex CLI
//!
//! This module contains the PokeAPI response types used throughout the
//! application. Only the fields the commands display are modelled; everything
//! else in the API payloads is ignored during deserialization.

pub mod client;

pub use client::{PokeApiClient, PokeApiError, DEFAULT_BASE_URL};

use serde::Deserialize;

/// A named link to another API resource
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NamedResource {
    /// Resource name (e.g. "pikachu", "canalave-city-area")
    pub name: String,
    /// Full URL of the resource
    pub url: String,
}

/// One page of the location-area listing
#[derive(Debug, Clone, Deserialize)]
pub struct LocationAreaPage {
    /// Total number of location areas
    pub count: u32,
    /// URL of the next page, absent on the last page
    pub next: Option<String>,
    /// URL of the previous page, absent on the first page
    pub previous: Option<String>,
    /// Location areas on this page
    pub results: Vec<NamedResource>,
}

/// Detail of a single location area
#[derive(Debug, Clone, Deserialize)]
pub struct LocationArea {
    pub id: u32,
    pub name: String,
    /// Pokemon that can be encountered in this area
    #[serde(default)]
    pub pokemon_encounters: Vec<PokemonEncounter>,
}

/// A pokemon that appears in a location area
#[derive(Debug, Clone, Deserialize)]
pub struct PokemonEncounter {
    pub pokemon: NamedResource,
}

/// A pokemon species as returned by the `/pokemon/{name}` endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct Pokemon {
    pub id: u32,
    pub name: String,
    /// Experience gained for defeating this pokemon; drives catch difficulty
    #[serde(default)]
    pub base_experience: Option<u32>,
    /// Height in decimetres
    pub height: u32,
    /// Weight in hectograms
    pub weight: u32,
    #[serde(default)]
    pub stats: Vec<PokemonStat>,
    #[serde(default)]
    pub types: Vec<PokemonType>,
}

/// A base stat value (hp, attack, ...)
#[derive(Debug, Clone, Deserialize)]
pub struct PokemonStat {
    pub base_stat: u32,
    pub stat: NamedResource,
}

/// One of a pokemon's elemental types
#[derive(Debug, Clone, Deserialize)]
pub struct PokemonType {
    pub slot: u8,
    #[serde(rename = "type")]
    pub kind: NamedResource,
}
