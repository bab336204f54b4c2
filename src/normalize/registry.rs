//! Per-call team registry.

use std::collections::BTreeMap;

use tracing::debug;

use crate::models::{EntityId, Participant, Team, TeamId};
use crate::raw::RawTeam;

/// Deduplicates team identities seen across one batch of match records.
///
/// Identity is the source id; names are not identity. A fresh registry is
/// created for every normalization call.
#[derive(Debug, Default)]
pub struct TeamRegistry {
    teams: BTreeMap<TeamId, Team>,
    placeholders: BTreeMap<TeamId, Option<String>>,
}

impl TeamRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a team sighting and return its id.
    ///
    /// `slot` identifies where the team appeared (match id and side key) and
    /// seeds the synthetic id when the source omits one. Repeat sightings of
    /// a real id overwrite its stored name.
    pub fn register(&mut self, raw: Option<&RawTeam>, slot: &[&str]) -> TeamId {
        let label = raw.and_then(RawTeam::display_name).map(str::to_string);

        match raw.and_then(RawTeam::key) {
            Some(key) => {
                let id = TeamId::from(key);
                let name = label.unwrap_or_else(|| id.to_string());
                match self.teams.get_mut(&id) {
                    Some(existing) if existing.name != name => {
                        debug!("Team {} renamed '{}' -> '{}'", id, existing.name, name);
                        existing.name = name;
                    }
                    Some(_) => {}
                    None => {
                        self.teams.insert(id.clone(), Team::new(id.clone(), name));
                    }
                }
                id
            }
            None => {
                let id = EntityId::placeholder(slot);
                self.placeholders.insert(id.clone(), label);
                id
            }
        }
    }

    /// Read-only counterpart of [`register`](Self::register): the participant
    /// a sighting resolves to, using the names registered so far.
    pub fn resolve(&self, raw: Option<&RawTeam>, slot: &[&str]) -> Participant {
        match raw.and_then(RawTeam::key) {
            Some(key) => {
                let id = TeamId::from(key);
                match self.teams.get(&id) {
                    Some(team) => Participant::Team(team.clone()),
                    None => {
                        let name = raw
                            .and_then(RawTeam::display_name)
                            .map(str::to_string)
                            .unwrap_or_else(|| id.to_string());
                        Participant::Team(Team::new(id, name))
                    }
                }
            }
            None => Participant::Placeholder {
                id: EntityId::placeholder(slot),
                label: raw.and_then(RawTeam::display_name).map(str::to_string),
            },
        }
    }

    /// Look up a real team by id.
    pub fn team(&self, id: &TeamId) -> Option<&Team> {
        self.teams.get(id)
    }

    /// Check whether `id` was registered as a placeholder.
    pub fn is_placeholder(&self, id: &TeamId) -> bool {
        id.is_placeholder() || !self.teams.contains_key(id)
    }

    /// Resolve an id returned by [`register`](Self::register) to a participant.
    pub fn participant(&self, id: &TeamId) -> Participant {
        match self.teams.get(id) {
            Some(team) => Participant::Team(team.clone()),
            None => Participant::Placeholder {
                id: id.clone(),
                label: self.placeholders.get(id).cloned().flatten(),
            },
        }
    }

    /// Every real team, ordered by id.
    pub fn teams(&self) -> Vec<Team> {
        self.teams.values().cloned().collect()
    }

    /// Number of real teams registered.
    pub fn len(&self) -> usize {
        self.teams.len()
    }

    /// True when no real team has been registered.
    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}
