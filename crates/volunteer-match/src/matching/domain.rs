use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Client-assigned identifier for a volunteer.
///
/// Clients have historically sent both integer and string identifiers, so either JSON form is
/// accepted and the value is always carried (and rendered) as text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PersonId(pub String);

impl PersonId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PersonId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PersonId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for PersonId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for PersonId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(value) => PersonId(value),
            RawId::Unsigned(value) => PersonId(value.to_string()),
            RawId::Signed(value) => PersonId(value.to_string()),
        })
    }
}

/// One ranked entry in a volunteer's preference list (rank 1 is the favourite).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preference {
    pub service_name: String,
    #[serde(rename = "priority", alias = "rank")]
    pub rank: u32,
}

impl Preference {
    pub fn new(service_name: impl Into<String>, rank: u32) -> Self {
        Self {
            service_name: service_name.into(),
            rank,
        }
    }
}

/// Latest submission for a single volunteer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub preferences: Vec<Preference>,
}

impl Person {
    pub fn new(id: impl Into<PersonId>, name: impl Into<String>, preferences: Vec<Preference>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            preferences,
        }
    }

    /// Builds a person whose ranks follow the order of `services`.
    pub fn ranked<I, S>(id: impl Into<PersonId>, name: impl Into<String>, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let preferences = services
            .into_iter()
            .zip(1u32..)
            .map(|(service, rank)| Preference::new(service, rank))
            .collect();
        Self::new(id, name, preferences)
    }

    /// 0-based position of `service` in the rank-ordered preference list.
    pub fn position_of(&self, service: &str) -> Option<usize> {
        self.preferences
            .iter()
            .position(|preference| preference.service_name == service)
    }
}

/// Externally visible placement for one volunteer. `service_name` is `None` when the search
/// could not place the volunteer anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    #[serde(rename = "volunteerId")]
    pub person_id: PersonId,
    pub service_name: Option<String>,
    pub cost: u64,
}

impl Assignment {
    pub fn is_assigned(&self) -> bool {
        self.service_name.is_some()
    }
}
