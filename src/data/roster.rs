//! Players, their per-unit proficiency ratings, and unit pins (locks).

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::catalog::Unit;
use crate::data::{read_json, DataError};
use crate::optimizer::proficiency::ProficiencyTier;

/// Point budget used when neither the caller nor the roster file sets one.
pub const DEFAULT_BUDGET: u32 = 9;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: u32,
    pub name: String,
    /// Sparse: units without an entry are Unusable.
    #[serde(default)]
    pub proficiency: BTreeMap<String, ProficiencyTier>,
}

impl Player {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            proficiency: BTreeMap::new(),
        }
    }

    pub fn with_tier(mut self, unit: impl Into<String>, tier: ProficiencyTier) -> Self {
        self.proficiency.insert(unit.into(), tier);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("player name must not be empty")]
    EmptyName,
    #[error("a player named '{0}' already exists")]
    DuplicateName(String),
    #[error("no player with id {0}")]
    UnknownPlayer(u32),
    #[error("no player ids left to hand out")]
    IdsExhausted,
}

/// Caller-side player collection. Ids are handed out monotonically and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    players: Vec<Player>,
    /// None once `u32::MAX` has been handed out.
    next_id: Option<u32>,
}

impl Default for Roster {
    fn default() -> Self {
        Self {
            players: Vec::new(),
            next_id: Some(0),
        }
    }
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_players(players: Vec<Player>) -> Self {
        let next_id = match players.iter().map(|p| p.id).max() {
            Some(highest) => highest.checked_add(1),
            None => Some(0),
        };
        Self { players, next_id }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn find(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|player| player.name == name)
    }

    pub fn add_player(&mut self, name: &str) -> Result<u32, RosterError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RosterError::EmptyName);
        }
        if self.find(name).is_some() {
            return Err(RosterError::DuplicateName(name.to_string()));
        }
        let id = self.next_id.ok_or(RosterError::IdsExhausted)?;
        self.next_id = id.checked_add(1);
        self.players.push(Player::new(id, name));
        Ok(id)
    }

    pub fn remove_player(&mut self, id: u32) -> Result<Player, RosterError> {
        let index = self
            .players
            .iter()
            .position(|player| player.id == id)
            .ok_or(RosterError::UnknownPlayer(id))?;
        Ok(self.players.remove(index))
    }

    pub fn set_tier(
        &mut self,
        id: u32,
        unit: impl Into<String>,
        tier: ProficiencyTier,
    ) -> Result<(), RosterError> {
        let player = self
            .players
            .iter_mut()
            .find(|player| player.id == id)
            .ok_or(RosterError::UnknownPlayer(id))?;
        player.proficiency.insert(unit.into(), tier);
        Ok(())
    }
}

/// Player name -> pinned unit name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockSet {
    pins: BTreeMap<String, String>,
}

impl LockSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pin(&mut self, player: impl Into<String>, unit: impl Into<String>) {
        self.pins.insert(player.into(), unit.into());
    }

    pub fn unpin(&mut self, player: &str) -> Option<String> {
        self.pins.remove(player)
    }

    /// Pins `unit`, or releases the pin when the player already has exactly that unit.
    /// Returns whether the player is pinned afterwards.
    pub fn toggle(&mut self, player: &str, unit: &str) -> bool {
        if self.pin_of(player) == Some(unit) {
            self.pins.remove(player);
            false
        } else {
            self.pins.insert(player.to_string(), unit.to_string());
            true
        }
    }

    pub fn pin_of(&self, player: &str) -> Option<&str> {
        self.pins.get(player).map(String::as_str)
    }

    pub fn is_pinned_to_other(&self, unit: &str, player: &str) -> bool {
        self.pins
            .iter()
            .any(|(owner, pinned)| owner != player && pinned == unit)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pins.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}

impl<P: Into<String>, U: Into<String>> FromIterator<(P, U)> for LockSet {
    fn from_iter<I: IntoIterator<Item = (P, U)>>(iter: I) -> Self {
        Self {
            pins: iter.into_iter().map(|(p, u)| (p.into(), u.into())).collect(),
        }
    }
}

/// Input document for the CLI: players, optional pins, optional inline catalog and budget.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosterFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<Vec<Unit>>,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub locks: LockSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<u32>,
}

pub fn load_roster(path: impl AsRef<Path>) -> Result<RosterFile, DataError> {
    read_json(path.as_ref())
}
