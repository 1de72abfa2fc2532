use std::collections::btree_set;
use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{JobId, ParseError};

/// One of the three per-user dispositions a job can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Favorites,
    Archived,
    Hidden,
}

impl ActionKind {
    pub const ALL: [ActionKind; 3] = [ActionKind::Favorites, ActionKind::Archived, ActionKind::Hidden];

    /// The set that must lose a job when it joins this one.
    pub fn exclusive_with(self) -> Option<ActionKind> {
        match self {
            ActionKind::Favorites => None,
            ActionKind::Archived => Some(ActionKind::Hidden),
            ActionKind::Hidden => Some(ActionKind::Archived),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Favorites => "favorites",
            ActionKind::Archived => "archived",
            ActionKind::Hidden => "hidden",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of job ids sharing one disposition. Insertion and removal are idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionSet(BTreeSet<JobId>);

impl ActionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, job_id: &JobId) -> bool {
        self.0.contains(job_id)
    }

    /// Returns `true` if the id was not present before.
    pub fn insert(&mut self, job_id: JobId) -> bool {
        self.0.insert(job_id)
    }

    /// Returns `true` if the id was present before.
    pub fn remove(&mut self, job_id: &JobId) -> bool {
        self.0.remove(job_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_set::Iter<'_, JobId> {
        self.0.iter()
    }

    pub fn union(&self, other: &ActionSet) -> ActionSet {
        ActionSet(self.0.union(&other.0).cloned().collect())
    }
}

impl<T: Into<JobId>> FromIterator<T> for ActionSet {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        ActionSet(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a ActionSet {
    type Item = &'a JobId;
    type IntoIter = btree_set::Iter<'a, JobId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Where a job sits relative to the main list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Disposition {
    #[default]
    Active,
    Archived,
    Hidden,
}

/// Membership of a single job across all three sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Memberships {
    pub favorite: bool,
    pub archived: bool,
    pub hidden: bool,
}

impl Memberships {
    pub fn get(&self, kind: ActionKind) -> bool {
        match kind {
            ActionKind::Favorites => self.favorite,
            ActionKind::Archived => self.archived,
            ActionKind::Hidden => self.hidden,
        }
    }

    pub fn disposition(&self) -> Disposition {
        if self.hidden {
            Disposition::Hidden
        } else if self.archived {
            Disposition::Archived
        } else {
            Disposition::Active
        }
    }
}

/// The three action sets plus a version marker, as persisted or fetched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOverlay {
    #[serde(default)]
    pub favorites: ActionSet,
    #[serde(default)]
    pub archived: ActionSet,
    #[serde(default)]
    pub hidden: ActionSet,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ActionOverlay {
    pub fn from_json(text: &str) -> Result<Self, ParseError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, ParseError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn set(&self, kind: ActionKind) -> &ActionSet {
        match kind {
            ActionKind::Favorites => &self.favorites,
            ActionKind::Archived => &self.archived,
            ActionKind::Hidden => &self.hidden,
        }
    }

    pub(crate) fn set_mut(&mut self, kind: ActionKind) -> &mut ActionSet {
        match kind {
            ActionKind::Favorites => &mut self.favorites,
            ActionKind::Archived => &mut self.archived,
            ActionKind::Hidden => &mut self.hidden,
        }
    }

    pub fn memberships(&self, job_id: &JobId) -> Memberships {
        Memberships {
            favorite: self.favorites.contains(job_id),
            archived: self.archived.contains(job_id),
            hidden: self.hidden.contains(job_id),
        }
    }

    /// Per-set union with no conflict resolution. Commutative, associative
    /// and idempotent; the version marker takes the larger side.
    pub fn union(&self, other: &ActionOverlay) -> ActionOverlay {
        ActionOverlay {
            favorites: self.favorites.union(&other.favorites),
            archived: self.archived.union(&other.archived),
            hidden: self.hidden.union(&other.hidden),
            version: self.version.max(other.version),
            updated_at: self.updated_at.max(other.updated_at),
        }
    }

    /// Jobs present in both `archived` and `hidden`.
    pub fn conflicts(&self) -> Vec<JobId> {
        self.archived
            .iter()
            .filter(|job_id| self.hidden.contains(job_id))
            .cloned()
            .collect()
    }

    /// Restores archived/hidden exclusivity; hidden always wins.
    pub fn resolve_conflicts(&mut self) {
        for job_id in self.conflicts() {
            self.archived.remove(&job_id);
        }
    }
}

/// Reconciles the local overlay with a remote one.
///
/// Union of both sides, then archived/hidden conflicts are settled in
/// favour of hidden regardless of which side asked for what, so the
/// result does not depend on argument order.
pub fn merge(local: &ActionOverlay, remote: &ActionOverlay) -> ActionOverlay {
    let mut merged = local.union(remote);
    merged.resolve_conflicts();
    merged
}
