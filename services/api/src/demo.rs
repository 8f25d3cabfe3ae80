use crate::infra::{seed_demo_data, SeededRound};
use clap::Args;
use hackjudge::error::AppError;
use hackjudge::judging::{
    CriterionScore, EvaluationSubmission, InMemoryJudgingStore, JudgingService, Score,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Print the final leaderboard as JSON instead of a table.
    #[arg(long)]
    pub(crate) json: bool,
    /// Show every submitted evaluation before scores are calculated.
    #[arg(long)]
    pub(crate) show_evaluations: bool,
}

/// Per-judge scores for each judgeable project, in criterion order.
const DEMO_SCORES: [[[f64; 3]; 3]; 2] = [
    [[9.0, 7.0, 8.0], [6.0, 9.0, 7.0], [7.5, 6.0, 9.0]],
    [[7.0, 8.0, 6.0], [6.0, 8.5, 8.0], [8.0, 7.0, 7.0]],
];

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let service = JudgingService::new(Arc::new(InMemoryJudgingStore::default()));
    let round = seed_demo_data(&service)?;

    println!("Hackathon judging demo");
    println!(
        "Criteria: {}",
        round
            .criteria
            .iter()
            .map(|criterion| format!("{} (x{})", criterion.name, criterion.weight))
            .collect::<Vec<_>>()
            .join(", ")
    );

    submit_demo_evaluations(&service, &round, args.show_evaluations)?;

    let summary = service.calculate_all_scores()?;
    println!("\n{}", summary.message());
    for project_id in &summary.skipped {
        println!("  Skipped {project_id}: no submitted evaluations");
    }

    let leaderboard = service.list_scores()?;
    if args.json {
        match serde_json::to_string_pretty(&leaderboard) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Leaderboard payload unavailable: {err}"),
        }
        return Ok(());
    }

    render_leaderboard(&round, &leaderboard);
    Ok(())
}

fn submit_demo_evaluations(
    service: &JudgingService<InMemoryJudgingStore>,
    round: &SeededRound,
    verbose: bool,
) -> Result<(), AppError> {
    let judgeable: Vec<_> = round
        .projects
        .iter()
        .filter(|project| project.submission_status.ready_for_judging())
        .collect();

    for (judge, judge_scores) in round.judges.iter().zip(DEMO_SCORES.iter()) {
        for (project, project_scores) in judgeable.iter().zip(judge_scores.iter()) {
            let scores = round
                .criteria
                .iter()
                .zip(project_scores.iter())
                .map(|(criterion, score)| CriterionScore {
                    criterion_id: criterion.id.clone(),
                    score: *score,
                    comment: None,
                })
                .collect();

            let evaluation = service.submit_evaluation(EvaluationSubmission {
                project_id: project.id.clone(),
                judge_id: judge.id.clone(),
                scores,
                overall_comment: Some(format!("Reviewed by {}", judge.user_id)),
            })?;

            if verbose {
                println!(
                    "  {} scored {} at {:.2}",
                    judge.user_id, project.title, evaluation.total_score
                );
            }
        }
    }
    Ok(())
}

fn render_leaderboard(round: &SeededRound, leaderboard: &[Score]) {
    println!("\nLeaderboard");
    for score in leaderboard {
        let title = round
            .projects
            .iter()
            .find(|project| project.id == score.project_id)
            .map(|project| project.title.as_str())
            .unwrap_or("unknown project");
        let rank = score
            .rank
            .map(|rank| rank.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  #{rank:<3} {title:<14} {:>7.2}  ({} evaluations)",
            score.final_score, score.evaluation_count
        );
        for average in &score.criteria_scores {
            let name = round
                .criteria
                .iter()
                .find(|criterion| criterion.id == average.criterion_id)
                .map(|criterion| criterion.name.as_str())
                .unwrap_or("unknown criterion");
            println!("        {name:<13} avg {:.2}", average.average_score);
        }
    }
}
