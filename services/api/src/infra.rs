use hackjudge::judging::{
    Criterion, CriterionDraft, Judge, JudgingError, JudgingService, JudgingStore, Project,
    SubmissionStatus, UserId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Records created by [`seed_demo_data`].
#[derive(Debug)]
pub(crate) struct SeededRound {
    pub(crate) criteria: Vec<Criterion>,
    pub(crate) projects: Vec<Project>,
    pub(crate) judges: Vec<Judge>,
}

const DEMO_CRITERIA: [(&str, &str, u8); 3] = [
    ("Innovation", "Novelty of the idea and approach", 5),
    ("Execution", "Quality and completeness of the build", 3),
    ("Presentation", "Clarity of the demo and pitch", 2),
];

const DEMO_PROJECTS: [(&str, SubmissionStatus); 4] = [
    ("Rover Relay", SubmissionStatus::Approved),
    ("Ledger Lite", SubmissionStatus::Approved),
    ("Tide Map", SubmissionStatus::Approved),
    ("Night Shift", SubmissionStatus::Draft),
];

const DEMO_JUDGES: [(&str, &[&str]); 2] = [
    ("judge-ada", &["ai", "robotics"]),
    ("judge-grace", &["fintech", "infra"]),
];

/// Registers sample criteria, projects and judges and assigns every judgeable project to
/// every judge. No evaluations are created.
pub(crate) fn seed_demo_data<S>(
    service: &JudgingService<S>,
) -> Result<SeededRound, JudgingError>
where
    S: JudgingStore + 'static,
{
    let organizer = UserId::new("organizer");
    let criteria = DEMO_CRITERIA
        .iter()
        .map(|(name, description, weight)| {
            service.criteria().create(
                CriterionDraft {
                    name: (*name).to_string(),
                    description: (*description).to_string(),
                    weight: Some(*weight),
                    min_score: None,
                    max_score: None,
                },
                organizer.clone(),
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    let projects = DEMO_PROJECTS
        .iter()
        .map(|(title, status)| service.projects().register(*title, *status))
        .collect::<Result<Vec<_>, _>>()?;

    let judgeable: Vec<_> = projects
        .iter()
        .filter(|project| project.submission_status.ready_for_judging())
        .map(|project| project.id.clone())
        .collect();

    let mut judges = Vec::with_capacity(DEMO_JUDGES.len());
    for (user, expertise) in DEMO_JUDGES {
        let judge = service.judges().register_judge(
            UserId::new(user),
            expertise.iter().map(|area| (*area).to_string()).collect(),
        )?;
        judges.push(service.assign_projects(&judge.id, &judgeable)?);
    }

    info!(
        criteria = criteria.len(),
        projects = projects.len(),
        judges = judges.len(),
        "demo data seeded"
    );
    Ok(SeededRound {
        criteria,
        projects,
        judges,
    })
}
