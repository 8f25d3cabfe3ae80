use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{
    Criterion, CriterionId, Evaluation, EvaluationKey, EvaluationStatus, Judge, JudgeId, Project,
    ProjectId, Score, UserId,
};
use super::repository::{
    CriterionRepository, EvaluationRepository, JudgeRepository, ProjectRepository,
    RepositoryError, ScoreRepository,
};

/// Rows in insertion order with a unique key index.
#[derive(Debug)]
struct Table<K, V> {
    rows: Vec<V>,
    index: HashMap<K, usize>,
}

impl<K, V> Default for Table<K, V> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K, V> Table<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn get(&self, key: &K) -> Option<&V> {
        self.index.get(key).map(|&slot| &self.rows[slot])
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        match self.index.get(key) {
            Some(&slot) => self.rows.get_mut(slot),
            None => None,
        }
    }

    fn insert_new(&mut self, key: K, value: V) -> Result<(), RepositoryError> {
        if self.index.contains_key(&key) {
            return Err(RepositoryError::Conflict);
        }
        self.index.insert(key, self.rows.len());
        self.rows.push(value);
        Ok(())
    }

    fn replace(&mut self, key: &K, value: V) -> Result<(), RepositoryError> {
        let slot = self.get_mut(key).ok_or(RepositoryError::NotFound)?;
        *slot = value;
        Ok(())
    }

    fn upsert(&mut self, key: K, value: V) {
        match self.get_mut(&key) {
            Some(slot) => *slot = value,
            None => {
                self.index.insert(key, self.rows.len());
                self.rows.push(value);
            }
        }
    }

    fn remove(&mut self, key: &K, key_of: impl Fn(&V) -> K) -> Result<(), RepositoryError> {
        let slot = self.index.remove(key).ok_or(RepositoryError::NotFound)?;
        self.rows.remove(slot);
        self.index = self
            .rows
            .iter()
            .enumerate()
            .map(|(position, row)| (key_of(row), position))
            .collect();
        Ok(())
    }

    fn values(&self) -> impl Iterator<Item = &V> {
        self.rows.iter()
    }
}

/// Process-local store backing every judging repository trait.
#[derive(Default, Clone)]
pub struct InMemoryJudgingStore {
    criteria: Arc<Mutex<Table<CriterionId, Criterion>>>,
    projects: Arc<Mutex<Table<ProjectId, Project>>>,
    judges: Arc<Mutex<Table<JudgeId, Judge>>>,
    evaluations: Arc<Mutex<Table<EvaluationKey, Evaluation>>>,
    scores: Arc<Mutex<Table<ProjectId, Score>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("in-memory store lock poisoned".to_string()))
}

impl CriterionRepository for InMemoryJudgingStore {
    fn insert_criterion(&self, criterion: Criterion) -> Result<Criterion, RepositoryError> {
        let mut guard = lock(&self.criteria)?;
        guard.insert_new(criterion.id.clone(), criterion.clone())?;
        Ok(criterion)
    }

    fn update_criterion(&self, criterion: Criterion) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.criteria)?;
        let key = criterion.id.clone();
        guard.replace(&key, criterion)
    }

    fn delete_criterion(&self, id: &CriterionId) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.criteria)?;
        guard.remove(id, |criterion| criterion.id.clone())
    }

    fn fetch_criterion(&self, id: &CriterionId) -> Result<Option<Criterion>, RepositoryError> {
        let guard = lock(&self.criteria)?;
        Ok(guard.get(id).cloned())
    }

    fn all_criteria(&self) -> Result<Vec<Criterion>, RepositoryError> {
        let guard = lock(&self.criteria)?;
        Ok(guard.values().cloned().collect())
    }
}

impl ProjectRepository for InMemoryJudgingStore {
    fn insert_project(&self, project: Project) -> Result<Project, RepositoryError> {
        let mut guard = lock(&self.projects)?;
        guard.insert_new(project.id.clone(), project.clone())?;
        Ok(project)
    }

    fn update_project(&self, project: Project) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.projects)?;
        let key = project.id.clone();
        guard.replace(&key, project)
    }

    fn fetch_project(&self, id: &ProjectId) -> Result<Option<Project>, RepositoryError> {
        let guard = lock(&self.projects)?;
        Ok(guard.get(id).cloned())
    }

    fn all_projects(&self) -> Result<Vec<Project>, RepositoryError> {
        let guard = lock(&self.projects)?;
        Ok(guard.values().cloned().collect())
    }
}

impl JudgeRepository for InMemoryJudgingStore {
    fn insert_judge(&self, judge: Judge) -> Result<Judge, RepositoryError> {
        let mut guard = lock(&self.judges)?;
        if guard.values().any(|existing| existing.user_id == judge.user_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert_new(judge.id.clone(), judge.clone())?;
        Ok(judge)
    }

    fn fetch_judge(&self, id: &JudgeId) -> Result<Option<Judge>, RepositoryError> {
        let guard = lock(&self.judges)?;
        Ok(guard.get(id).cloned())
    }

    fn find_judge_by_user(&self, user_id: &UserId) -> Result<Option<Judge>, RepositoryError> {
        let guard = lock(&self.judges)?;
        let found = guard
            .values()
            .find(|judge| &judge.user_id == user_id)
            .cloned();
        Ok(found)
    }

    fn all_judges(&self) -> Result<Vec<Judge>, RepositoryError> {
        let guard = lock(&self.judges)?;
        Ok(guard.values().cloned().collect())
    }

    fn add_assignments(
        &self,
        id: &JudgeId,
        project_ids: &[ProjectId],
    ) -> Result<Judge, RepositoryError> {
        let mut guard = lock(&self.judges)?;
        let judge = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        judge.assigned_projects.extend(project_ids.iter().cloned());
        Ok(judge.clone())
    }

    fn update_judge_profile(
        &self,
        id: &JudgeId,
        expertise: Option<Vec<String>>,
        is_available: Option<bool>,
    ) -> Result<Judge, RepositoryError> {
        let mut guard = lock(&self.judges)?;
        let judge = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if let Some(expertise) = expertise {
            judge.expertise = expertise;
        }
        if let Some(is_available) = is_available {
            judge.is_available = is_available;
        }
        Ok(judge.clone())
    }
}

impl EvaluationRepository for InMemoryJudgingStore {
    fn upsert_evaluation(&self, evaluation: Evaluation) -> Result<Evaluation, RepositoryError> {
        let mut guard = lock(&self.evaluations)?;
        guard.upsert(evaluation.key(), evaluation.clone());
        Ok(evaluation)
    }

    fn record_submission(
        &self,
        evaluation: Evaluation,
    ) -> Result<(Evaluation, u64), RepositoryError> {
        // Lock order: judges, then evaluations.
        let mut judges = lock(&self.judges)?;
        let mut evaluations = lock(&self.evaluations)?;
        let judge = judges
            .get_mut(&evaluation.judge_id)
            .ok_or(RepositoryError::NotFound)?;
        evaluations.upsert(evaluation.key(), evaluation.clone());
        judge.completed_evaluations += 1;
        Ok((evaluation, judge.completed_evaluations))
    }

    fn fetch_evaluation(
        &self,
        key: &EvaluationKey,
    ) -> Result<Option<Evaluation>, RepositoryError> {
        let guard = lock(&self.evaluations)?;
        Ok(guard.get(key).cloned())
    }

    fn find_qualifying_by_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<Evaluation>, RepositoryError> {
        let guard = lock(&self.evaluations)?;
        Ok(guard
            .values()
            .filter(|evaluation| {
                &evaluation.project_id == project_id && evaluation.status.qualifies_for_scoring()
            })
            .cloned()
            .collect())
    }

    fn finalize_submitted(&self, project_id: &ProjectId) -> Result<usize, RepositoryError> {
        let mut guard = lock(&self.evaluations)?;
        let mut moved = 0;
        for evaluation in guard.rows.iter_mut() {
            if &evaluation.project_id == project_id
                && evaluation.status == EvaluationStatus::Submitted
            {
                evaluation.status = EvaluationStatus::Finalized;
                moved += 1;
            }
        }
        Ok(moved)
    }

    fn any_references_criterion(&self, id: &CriterionId) -> Result<bool, RepositoryError> {
        let guard = lock(&self.evaluations)?;
        let referenced = guard.values().any(|evaluation| evaluation.references(id));
        Ok(referenced)
    }
}

impl ScoreRepository for InMemoryJudgingStore {
    fn upsert_score(&self, score: Score) -> Result<Score, RepositoryError> {
        let mut guard = lock(&self.scores)?;
        guard.upsert(score.project_id.clone(), score.clone());
        Ok(score)
    }

    fn fetch_score(&self, project_id: &ProjectId) -> Result<Option<Score>, RepositoryError> {
        let guard = lock(&self.scores)?;
        Ok(guard.get(project_id).cloned())
    }

    fn all_scores(&self) -> Result<Vec<Score>, RepositoryError> {
        let guard = lock(&self.scores)?;
        Ok(guard.values().cloned().collect())
    }

    fn save_ranks(&self, ranks: &[(ProjectId, u32)]) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.scores)?;
        if ranks.iter().any(|(project_id, _)| guard.get(project_id).is_none()) {
            return Err(RepositoryError::NotFound);
        }
        for (project_id, rank) in ranks {
            if let Some(score) = guard.get_mut(project_id) {
                score.rank = Some(*rank);
            }
        }
        Ok(())
    }
}
