use serde::{Deserialize, Serialize};

use crate::session::{SessionStore, Snapshot};
use crate::slots::Stage;

/// Completion flag for one workflow stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageProgress {
    pub stage: Stage,
    pub complete: bool,
}

/// Coarse position in the workflow, named after the furthest stage with
/// output present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    Starting,
    IdeasGenerated,
    OutlineReady,
    DraftCompleted,
    FeedbackReceived,
    Completed,
}

/// Progress for a session in canonical stage order. Pure function of slot
/// presence, recomputed on every query.
pub fn progress(store: &SessionStore, session_id: &str) -> Vec<StageProgress> {
    progress_of(&store.snapshot(session_id))
}

pub fn progress_of(snapshot: &Snapshot) -> Vec<StageProgress> {
    Stage::ORDER
        .iter()
        .map(|&stage| StageProgress {
            stage,
            complete: snapshot.slots.contains_key(&stage.slot()),
        })
        .collect()
}

/// The furthest populated stage, checked from the end of the workflow.
/// Stages may be skipped, so this is a high-water mark, not a cursor.
pub fn current_step(snapshot: &Snapshot) -> WorkflowStep {
    let has = |stage: Stage| snapshot.slots.contains_key(&stage.slot());
    if has(Stage::Seo) {
        WorkflowStep::Completed
    } else if has(Stage::Feedback) {
        WorkflowStep::FeedbackReceived
    } else if has(Stage::Draft) {
        WorkflowStep::DraftCompleted
    } else if has(Stage::Outline) {
        WorkflowStep::OutlineReady
    } else if has(Stage::Ideate) {
        WorkflowStep::IdeasGenerated
    } else {
        WorkflowStep::Starting
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slots::OutputSlot;

    fn complete_stages(progress: &[StageProgress]) -> Vec<Stage> {
        progress
            .iter()
            .filter(|p| p.complete)
            .map(|p| p.stage)
            .collect()
    }

    #[test]
    fn empty_session_reports_nothing_complete() {
        let store = SessionStore::new();
        let prog = progress(&store, "s1");
        assert_eq!(prog.len(), 5);
        assert!(prog.iter().all(|p| !p.complete));
        assert_eq!(current_step(&store.snapshot("s1")), WorkflowStep::Starting);
    }

    #[test]
    fn ideas_only_completes_ideate_stage() {
        let store = SessionStore::new();
        store.write_slot("s1", OutputSlot::Ideas, "A, B, C");

        let prog = progress(&store, "s1");
        assert_eq!(complete_stages(&prog), vec![Stage::Ideate]);
        assert_eq!(
            current_step(&store.snapshot("s1")),
            WorkflowStep::IdeasGenerated
        );
    }

    #[test]
    fn stages_may_be_skipped() {
        let store = SessionStore::new();
        store.write_slot("s1", OutputSlot::Ideas, "A, B, C");
        store.write_slot("s1", OutputSlot::Draft, "Full text");

        let prog = progress(&store, "s1");
        assert_eq!(complete_stages(&prog), vec![Stage::Ideate, Stage::Draft]);
        // outline was skipped and stays incomplete
        assert!(!prog[1].complete);
        assert_eq!(
            current_step(&store.snapshot("s1")),
            WorkflowStep::DraftCompleted
        );
    }

    #[test]
    fn progress_is_recomputed_not_cached() {
        let store = SessionStore::new();
        store.write_slot("s1", OutputSlot::SeoResult, "optimized");
        assert_eq!(current_step(&store.snapshot("s1")), WorkflowStep::Completed);

        store.reset("s1");
        let prog = progress(&store, "s1");
        assert!(prog.iter().all(|p| !p.complete));
    }

    #[test]
    fn progress_order_is_canonical() {
        let store = SessionStore::new();
        let stages: Vec<Stage> = progress(&store, "s1").iter().map(|p| p.stage).collect();
        assert_eq!(stages, Stage::ORDER.to_vec());
    }
}
