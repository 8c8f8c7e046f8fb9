//! Visibility selection
//!
//! Decides which participants occupy the stage on each recomputation:
//!
//! 1. **Prune** previously visible participants that left the roster
//! 2. **Promote** active speakers to the front
//! 3. **Fill** with remote participants in session order
//! 4. **Cap** at the tile limit
//!
//! Previously visible participants keep their relative order so the grid
//! reshuffles as little as possible between updates.

use crate::grid::MAX_TILES;
use crate::participant::Participant;
use crate::session::SessionView;
use crate::types::ParticipantSid;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Which active speakers may be promoted onto the stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionPolicy {
    /// Only speakers currently present in the roster are promoted
    #[default]
    ConnectedOnly,
    /// Any non-local speaker not already visible is promoted
    Literal,
}

/// Counters describing what a single recomputation did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionStats {
    /// Previously visible participants that left the roster
    pub pruned: usize,
    /// Repeated sids dropped from the previous set
    pub duplicates: usize,
    pub promoted: usize,
    pub filled: usize,
    pub truncated: usize,
}

/// Ordered, capacity-bounded set of visible participants
#[derive(Debug, Clone)]
pub struct VisibilitySelector {
    visible: Vec<Participant>,
    max_visible: usize,
    policy: PromotionPolicy,
}

impl Default for VisibilitySelector {
    fn default() -> Self {
        Self::new(MAX_TILES, PromotionPolicy::default())
    }
}

impl VisibilitySelector {
    /// Create a selector. `max_visible` is clamped to `1..=MAX_TILES`.
    #[must_use]
    pub fn new(max_visible: usize, policy: PromotionPolicy) -> Self {
        Self {
            visible: Vec::new(),
            max_visible: max_visible.clamp(1, MAX_TILES),
            policy,
        }
    }

    #[must_use]
    pub fn visible(&self) -> &[Participant] {
        &self.visible
    }

    #[must_use]
    pub const fn max_visible(&self) -> usize {
        self.max_visible
    }

    #[must_use]
    pub const fn policy(&self) -> PromotionPolicy {
        self.policy
    }

    /// Forget the current selection
    pub fn reset(&mut self) {
        self.visible.clear();
    }

    /// Recompute the visible set from a fresh session snapshot
    pub fn recompute<S: SessionView + ?Sized>(&mut self, session: &S) -> SelectionStats {
        let local_sid = session.local_sid();
        let (next, stats) = select_visible(
            &self.visible,
            |sid| session.is_connected(sid),
            &session.active_speakers(),
            local_sid.as_ref(),
            &session.all_participants(),
            self.max_visible,
            self.policy,
        );

        trace!(
            visible = next.len(),
            pruned = stats.pruned,
            duplicates = stats.duplicates,
            promoted = stats.promoted,
            filled = stats.filled,
            truncated = stats.truncated,
            "Recomputed visible participants"
        );

        self.visible = next;
        stats
    }
}

fn contains(list: &[Participant], sid: &ParticipantSid) -> bool {
    list.iter().any(|p| &p.sid == sid)
}

/// Pure selection step over explicit inputs.
///
/// `is_connected` answers roster membership by sid. `local_sid` is never
/// promoted; the local participant is also never filled since only remote
/// participants are appended.
pub fn select_visible<F>(
    previous: &[Participant],
    is_connected: F,
    active_speakers: &[Participant],
    local_sid: Option<&ParticipantSid>,
    all_participants: &[Participant],
    max_visible: usize,
    policy: PromotionPolicy,
) -> (Vec<Participant>, SelectionStats)
where
    F: Fn(&ParticipantSid) -> bool,
{
    let mut stats = SelectionStats::default();
    let mut next: Vec<Participant> = Vec::with_capacity(max_visible + active_speakers.len());

    for participant in previous {
        if !is_connected(&participant.sid) {
            stats.pruned += 1;
        } else if contains(&next, &participant.sid) {
            stats.duplicates += 1;
        } else {
            next.push(participant.clone());
        }
    }

    // Each promotion is a front insert, so a later speaker in the list ends
    // up ahead of an earlier one.
    for speaker in active_speakers {
        if speaker.is_local() || local_sid == Some(&speaker.sid) {
            continue;
        }
        if contains(&next, &speaker.sid) {
            continue;
        }
        if policy == PromotionPolicy::ConnectedOnly && !is_connected(&speaker.sid) {
            continue;
        }
        next.insert(0, speaker.clone());
        stats.promoted += 1;
    }

    for participant in all_participants {
        if next.len() >= max_visible {
            break;
        }
        if participant.is_remote() && !contains(&next, &participant.sid) {
            next.push(participant.clone());
            stats.filled += 1;
        }
    }

    if next.len() > max_visible {
        stats.truncated = next.len() - max_visible;
        next.truncate(max_visible);
    }

    (next, stats)
}
