//! Targets: the groups and instructors whose schedules are analyzed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

crate::define_id_type!(i64, TargetId);

/// Kind of schedule owner, as coded by the remote schedule API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Group,
    Instructor,
}

impl TargetKind {
    /// Numeric code used by the remote API.
    pub fn code(self) -> i32 {
        match self {
            TargetKind::Group => 1,
            TargetKind::Instructor => 2,
        }
    }

    /// Resolve a remote API code. Unknown codes (rooms, etc.) return `None`.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(TargetKind::Group),
            2 => Some(TargetKind::Instructor),
            _ => None,
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Group => write!(f, "group"),
            TargetKind::Instructor => write!(f, "instructor"),
        }
    }
}

impl FromStr for TargetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "group" => Ok(TargetKind::Group),
            "instructor" | "prof" => Ok(TargetKind::Instructor),
            _ => Err(format!("Unknown target kind: {}", s)),
        }
    }
}

/// Subject of a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: Option<TargetId>,
    pub kind: TargetKind,
    pub remote_id: i64,
    /// Digest of the last analyzed calendar document.
    pub checksum: Option<String>,
}

impl Target {
    pub fn new(kind: TargetKind, remote_id: i64) -> Self {
        Self {
            id: None,
            kind,
            remote_id,
            checksum: None,
        }
    }

    /// Preferred lookup key: internal id when known, remote identity otherwise.
    pub fn key(&self) -> TargetKey {
        match self.id {
            Some(id) => TargetKey::Id(id),
            None => TargetKey::Remote {
                kind: self.kind,
                remote_id: self.remote_id,
            },
        }
    }
}

/// The two ways a target can be addressed in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKey {
    Id(TargetId),
    Remote { kind: TargetKind, remote_id: i64 },
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKey::Id(id) => write!(f, "#{}", id),
            TargetKey::Remote { kind, remote_id } => write!(f, "{}:{}", kind, remote_id),
        }
    }
}

impl From<TargetId> for TargetKey {
    fn from(id: TargetId) -> Self {
        TargetKey::Id(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes_round_trip() {
        for kind in [TargetKind::Group, TargetKind::Instructor] {
            assert_eq!(TargetKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(TargetKind::from_code(3), None);
    }

    #[test]
    fn test_key_prefers_internal_id() {
        let mut target = Target::new(TargetKind::Group, 42);
        assert_eq!(
            target.key(),
            TargetKey::Remote {
                kind: TargetKind::Group,
                remote_id: 42
            }
        );

        target.id = Some(TargetId::new(5));
        assert_eq!(target.key(), TargetKey::Id(TargetId::new(5)));
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("Group".parse::<TargetKind>().unwrap(), TargetKind::Group);
        assert_eq!("prof".parse::<TargetKind>().unwrap(), TargetKind::Instructor);
        assert!("room".parse::<TargetKind>().is_err());
    }
}
