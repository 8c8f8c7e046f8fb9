//! Stage controller - recomputes the stage whenever the roster changes
//!
//! The controller owns the [`Stage`] inside a single tokio task, so
//! recomputations are serialized without locking. A lagged receiver simply
//! recomputes once from the latest session state; skipped events carry no
//! information the current roster does not. The task stops on
//! [`RosterEvent::Closed`](crate::session::RosterEvent::Closed) or, when that
//! event was skipped, as soon as the session reports itself closed.

use crate::session::RoomSession;
use crate::stage::{Stage, StageSnapshot};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Handle to a running stage controller
pub struct StageController {
    snapshots: watch::Receiver<StageSnapshot>,
    /// Number of roster events handled so far, lagged ones included
    processed: watch::Receiver<u64>,
    handle: JoinHandle<()>,
}

impl StageController {
    /// Attach `stage` to `session` and start reacting to roster events.
    ///
    /// The stage is recomputed once immediately so the first snapshot
    /// reflects participants that joined before the controller started.
    #[must_use]
    pub fn spawn(session: RoomSession, mut stage: Stage) -> Self {
        let mut events = session.subscribe();
        let snapshots = stage.subscribe();
        let (processed_tx, processed) = watch::channel(0u64);
        stage.recompute(&session);

        let handle = tokio::spawn(async move {
            info!(room = %session.room(), "Stage controller started");

            loop {
                match events.recv().await {
                    Ok(event) => {
                        debug!(room = %session.room(), event = event.kind(), "Roster event");
                        stage.recompute(&session);
                        processed_tx.send_modify(|count| *count += 1);
                        if event.is_terminal() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(
                            room = %session.room(),
                            lagged_events = n,
                            "Stage controller lagged, recomputing from current roster"
                        );
                        stage.recompute(&session);
                        processed_tx.send_modify(|count| *count += n);
                        // The skipped events may have included `Closed`
                        if session.is_closed() {
                            let mut rest = 0;
                            while events.try_recv().is_ok() {
                                rest += 1;
                            }
                            processed_tx.send_modify(|count| *count += rest);
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!(room = %session.room(), "Roster channel closed");
                        break;
                    }
                }
            }

            info!(room = %session.room(), "Stage controller stopped");
        });

        Self {
            snapshots,
            processed,
            handle,
        }
    }

    /// Receiver for stage snapshots
    #[must_use]
    pub fn snapshots(&self) -> watch::Receiver<StageSnapshot> {
        self.snapshots.clone()
    }

    /// Latest published snapshot
    #[must_use]
    pub fn snapshot(&self) -> StageSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Wait until a snapshot with at least `revision` is published.
    ///
    /// Returns `None` if the controller stopped first.
    pub async fn wait_for_revision(&mut self, revision: u64) -> Option<StageSnapshot> {
        self.snapshots
            .wait_for(|snapshot| snapshot.revision >= revision)
            .await
            .ok()
            .map(|snapshot| snapshot.clone())
    }

    /// Wait until `count` roster events have been handled.
    ///
    /// Returns `false` if the controller stopped first.
    pub async fn wait_for_processed(&mut self, count: u64) -> bool {
        self.processed.wait_for(|seen| *seen >= count).await.is_ok()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the controller task to stop (after the session closes)
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            warn!(error = %e, "Stage controller task failed");
        }
    }

    /// Stop the controller without waiting for the session to close
    pub fn abort(&self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SessionConfig, StageConfig};
    use crate::grid::GridShape;
    use crate::participant::Participant;
    use crate::types::{ParticipantSid, RoomName};
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(1);

    fn session() -> RoomSession {
        RoomSession::new(
            RoomName::from("standup"),
            Participant::local("local", "me"),
            &SessionConfig::default(),
        )
        .unwrap()
    }

    fn tiny_session(room: &str) -> RoomSession {
        let config = SessionConfig {
            event_capacity: 1,
            ..SessionConfig::default()
        };
        RoomSession::new(RoomName::from(room), Participant::local("local", "me"), &config).unwrap()
    }

    fn stage() -> Stage {
        Stage::new(&StageConfig::default())
    }

    #[tokio::test]
    async fn test_controller_tracks_roster() {
        let session = session();
        session.join(Participant::remote("A", "alice")).unwrap();

        let mut controller = StageController::spawn(session.clone(), stage());
        assert_eq!(controller.snapshot().visible.len(), 1);

        session.join(Participant::remote("B", "bob")).unwrap();
        let snapshot = tokio::time::timeout(WAIT, controller.wait_for_revision(2))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.visible.len(), 2);
        assert_eq!(snapshot.shape, Some(GridShape::Grid2x1));

        session.join(Participant::remote("C", "carol")).unwrap();
        tokio::time::timeout(WAIT, controller.wait_for_revision(3))
            .await
            .unwrap()
            .unwrap();

        session.leave(&ParticipantSid::from("A")).unwrap();
        let snapshot = tokio::time::timeout(WAIT, controller.wait_for_revision(4))
            .await
            .unwrap()
            .unwrap();
        let sids: Vec<_> = snapshot.visible.iter().map(|p| p.sid.to_string()).collect();
        assert_eq!(sids, ["B", "C"]);

        // Already visible, so speaking does not reorder
        session.set_active_speakers(vec![ParticipantSid::from("C")]);
        assert!(controller.wait_for_processed(4).await);
        assert_eq!(controller.snapshot().revision, 4);

        session.close();
        tokio::time::timeout(WAIT, controller.join())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_lagged_controller_catches_up() {
        let session = tiny_session("busy");

        let controller = StageController::spawn(session.clone(), stage());
        for i in 0..10 {
            session
                .join(Participant::remote(format!("R{i}"), format!("user-{i}")))
                .unwrap();
        }
        session.close();

        tokio::time::timeout(WAIT, async {
            let mut rx = controller.snapshots();
            rx.wait_for(|s| s.visible.len() == 10).await.unwrap();
        })
        .await
        .unwrap();

        assert_eq!(controller.snapshot().shape, Some(GridShape::Grid4x3));
        tokio::time::timeout(WAIT, controller.join())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_controller_stops_when_closed_event_is_skipped() {
        let session = tiny_session("late");
        let controller = StageController::spawn(session.clone(), stage());

        session.join(Participant::remote("A", "alice")).unwrap();
        session.close();
        session.fail("late error");
        session.set_active_speakers(vec![ParticipantSid::from("A")]);

        tokio::time::timeout(WAIT, controller.join())
            .await
            .expect("controller kept running after the session closed");
        assert!(session.error().is_none());
    }
}
