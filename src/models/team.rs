//! Team and participant models.

use serde::{Deserialize, Serialize};

use super::TeamId;

/// A team seen in at least one match record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
}

impl Team {
    /// Create a new team.
    pub fn new(id: TeamId, name: String) -> Self {
        Self { id, name }
    }
}

/// Occupant of one side of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Participant {
    /// A known team
    Team(Team),
    /// Not yet determined, usually waiting on an earlier match
    Placeholder {
        id: TeamId,
        /// Display text from the source, if any (e.g. "TBD")
        label: Option<String>,
    },
}

impl Participant {
    /// Team id or placeholder id.
    pub fn id(&self) -> &TeamId {
        match self {
            Participant::Team(team) => &team.id,
            Participant::Placeholder { id, .. } => id,
        }
    }

    /// Name for display; placeholders fall back to "TBD".
    pub fn display_name(&self) -> &str {
        match self {
            Participant::Team(team) => &team.name,
            Participant::Placeholder { label, .. } => label.as_deref().unwrap_or("TBD"),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Participant::Placeholder { .. })
    }

    /// The real team, if the slot is filled.
    pub fn team(&self) -> Option<&Team> {
        match self {
            Participant::Team(team) => Some(team),
            Participant::Placeholder { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityId;

    #[test]
    fn test_placeholder_display_name() {
        let p = Participant::Placeholder {
            id: EntityId::placeholder(&["m1", "faction1"]),
            label: None,
        };
        assert_eq!(p.display_name(), "TBD");
        assert!(p.is_placeholder());
        assert!(p.team().is_none());
    }

    #[test]
    fn test_team_participant() {
        let p = Participant::Team(Team::new("t1".into(), "Alpha".to_string()));
        assert_eq!(p.display_name(), "Alpha");
        assert_eq!(p.id().as_str(), "t1");
        assert!(!p.is_placeholder());
    }

    #[test]
    fn test_participant_serialization_tag() {
        let p = Participant::Team(Team::new("t1".into(), "Alpha".to_string()));
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["kind"], "team");
        assert_eq!(json["id"], "t1");
        assert_eq!(json["name"], "Alpha");
    }
}
