use std::time::Instant;

use crate::{
    ActionStore, CardState, Disposition, JobId, NotificationSink, OptimisticActionController,
    StorageAdapter, UndoKind,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub job_id: JobId,
    pub favorite: bool,
    pub disposition: Disposition,
    /// Active undo affordance, if any.
    pub undo: Option<UndoKind>,
}

impl CardView {
    /// Removed from the main list but still undoable; rendered as a placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.disposition != Disposition::Active && self.undo.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeckView {
    pub cards: Vec<CardView>,
    /// Ids shown in the main list, placeholders included, in input order.
    pub main_list: Vec<JobId>,
    pub favorites: usize,
    pub archived: usize,
    pub hidden: usize,
}

impl DeckView {
    pub fn build<S, N>(
        store: &ActionStore<S>,
        controller: &OptimisticActionController<N>,
        jobs: &[JobId],
        now: Instant,
    ) -> Self
    where
        S: StorageAdapter,
        N: NotificationSink,
    {
        let cards: Vec<CardView> = jobs
            .iter()
            .map(|job_id| {
                let memberships = store.memberships(job_id);
                let undo = match controller.state(job_id, now) {
                    CardState::AppliedPending { kind, .. } => Some(kind),
                    CardState::Idle => None,
                };
                CardView {
                    job_id: job_id.clone(),
                    favorite: memberships.favorite,
                    disposition: memberships.disposition(),
                    undo,
                }
            })
            .collect();

        let main_list = cards
            .iter()
            .filter(|card| card.disposition == Disposition::Active || card.is_placeholder())
            .map(|card| card.job_id.clone())
            .collect();

        let overlay = store.overlay();
        DeckView {
            cards,
            main_list,
            favorites: overlay.favorites.len(),
            archived: overlay.archived.len(),
            hidden: overlay.hidden.len(),
        }
    }
}
