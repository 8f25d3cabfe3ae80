use std::cmp::Ordering;
use std::sync::Arc;

use tracing::info;

use super::domain::{ProjectId, Score};
use super::error::JudgingError;
use super::repository::JudgingStore;

/// Positional ranks for the given scores: highest `final_score` first, 1-based.
///
/// Equal scores keep their input order and still get distinct, consecutive ranks.
pub fn dense_ranks(scores: &[Score]) -> Vec<(ProjectId, u32)> {
    let mut ordered: Vec<&Score> = scores.iter().collect();
    ordered.sort_by(|left, right| descending(left.final_score, right.final_score));
    ordered
        .into_iter()
        .zip(1u32..)
        .map(|(score, rank)| (score.project_id.clone(), rank))
        .collect()
}

fn descending(left: f64, right: f64) -> Ordering {
    right.total_cmp(&left)
}

/// Orders every finalized score into a leaderboard.
pub struct RankingEngine<S> {
    store: Arc<S>,
}

impl<S> RankingEngine<S>
where
    S: JudgingStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Reassigns `rank` on every stored score.
    pub fn recompute_ranks(&self) -> Result<(), JudgingError> {
        let scores = self.store.all_scores()?;
        let ranks = dense_ranks(&scores);
        self.store.save_ranks(&ranks)?;
        info!(ranked = ranks.len(), "ranks recomputed");
        Ok(())
    }

    /// All scores ordered by rank; scores not ranked yet come last in creation order.
    pub fn leaderboard(&self) -> Result<Vec<Score>, JudgingError> {
        let mut scores = self.store.all_scores()?;
        scores.sort_by_key(|score| score.rank.unwrap_or(u32::MAX));
        Ok(scores)
    }
}
