use clap::Args;
use sole_agent::config::AppConfig;
use sole_agent::error::AppError;
use sole_agent::workflows::lettings::{
    ApplicantDraft, Lane, LaneBoard, LettingsService, LettingsSnapshot, MemorySnapshotStore,
    PipelineSummary, PropertyDraft, SearchPreferences, SnapshotStore, StageId,
};
use std::sync::Arc;

use crate::infra::open_service;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Applicant name used in the walkthrough.
    #[arg(long, default_value = "Jane")]
    pub(crate) applicant: String,
    /// Property address used in the walkthrough.
    #[arg(long, default_value = "12 Oak St")]
    pub(crate) address: String,
    /// Stop before archiving so the final boards show the live match.
    #[arg(long)]
    pub(crate) skip_archive: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct SummaryArgs {
    /// Also print the stage board for one lane (applicant, property or both).
    #[arg(long, value_parser = parse_lane)]
    pub(crate) lane: Option<Lane>,
}

fn parse_lane(raw: &str) -> Result<Lane, String> {
    raw.parse::<Lane>().map_err(|err| err.to_string())
}

/// Walks one applicant and one property from intake to archive against an
/// in-memory store, printing the state after each step.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        applicant,
        address,
        skip_archive,
    } = args;

    let store = Arc::new(MemorySnapshotStore::default());
    let service = LettingsService::with_snapshot(store.clone(), LettingsSnapshot::new());

    println!("Sole agent lettings demo");

    let applicant = service.add_applicant(ApplicantDraft {
        name: applicant,
        email: "applicant@example.com".to_string(),
        preferences: SearchPreferences {
            budget_min: 1200,
            budget_max: 1600,
            bedrooms: 2,
            preferred_areas: vec!["Hackney".to_string()],
            ..SearchPreferences::default()
        },
        ..ApplicantDraft::default()
    })?;
    println!(
        "- Added applicant {} ({}) -> {}",
        applicant.name(),
        applicant.applicant_id,
        applicant.status.label()
    );

    let property = service.add_property(PropertyDraft {
        address,
        postcode: "E8 1AA".to_string(),
        bedrooms: 2,
        rent: 1500,
        property_type: "Flat".to_string(),
        ..PropertyDraft::default()
    })?;
    println!(
        "- Added property {} ({}) -> {}",
        property.address(),
        property.property_id,
        property.status.label()
    );

    let record = service.create_match(&applicant.applicant_id, &property.property_id)?;
    println!(
        "- Created match {}: applicant lane {}, property lane {}",
        record.match_id, record.applicant_stage, record.property_stage
    );

    match service.create_match(&applicant.applicant_id, &property.property_id) {
        Ok(_) => println!("  Duplicate pairing unexpectedly accepted"),
        Err(err) => println!("  Second pairing rejected: {err}"),
    }

    for slot in [1, 2] {
        let toggle =
            service.toggle_checklist_task(&record.match_id, StageId::Matched.as_str(), slot)?;
        println!(
            "- Ticked '{}' ({}/{} {} tasks done)",
            toggle.task,
            toggle.progress.completed,
            toggle.progress.total,
            toggle.stage.label()
        );
    }

    let change =
        service.update_stage(&record.match_id, StageId::Viewing.as_str(), Lane::Applicant)?;
    println!(
        "- Moved {} lane {} -> {} (property lane still {})",
        change.lane, change.previous, change.stage, change.record.property_stage
    );

    service.set_notes(&record.match_id, "Viewing booked for Saturday 11am")?;
    println!("- Notes updated");

    render_board(&service.lane_board(Lane::Applicant, None));
    render_board(&service.lane_board(Lane::Property, None));

    if !skip_archive {
        let archived = service.archive_match(&record.match_id)?;
        println!(
            "\n- Archived {} with final stage {} (applicant lane was {})",
            archived.record.match_id,
            archived.final_stage,
            archived.stage_at_archive(Lane::Applicant)
        );
        if let Some(applicant) = service.find_applicant(&applicant.applicant_id) {
            println!("  {} is {} again", applicant.name(), applicant.status.label());
        }
        if let Some(property) = service.find_property(&property.property_id) {
            println!("  {} is {} again", property.address(), property.status.label());
        }
    }

    render_summary(&service.pipeline_summary());
    println!(
        "\nSnapshot persisted to memory store: {}",
        if store.load()?.is_some() { "yes" } else { "no" }
    );
    Ok(())
}

/// Prints the pipeline summary of the configured, persisted snapshot.
pub(crate) fn run_summary(args: SummaryArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = open_service(&config.storage)?;
    let storage = service.storage_info();

    println!("Sole agent lettings summary");
    match storage.last_saved {
        Some(saved) => println!("Last saved: {}", saved.to_rfc3339()),
        None => println!("Last saved: never"),
    }
    render_summary(&service.pipeline_summary());

    if let Some(lane) = args.lane {
        render_board(&service.lane_board(lane, None));
    }
    Ok(())
}

fn render_summary(summary: &PipelineSummary) {
    println!("\nPipeline summary");
    println!(
        "- {} active matches | {} archived",
        summary.active_matches, summary.archived_matches
    );
    println!(
        "- Applicants: {} active / {} matched",
        summary.applicants.active, summary.applicants.matched
    );
    println!(
        "- Properties: {} available / {} matched",
        summary.properties.available, summary.properties.matched
    );
    println!("Stage counts (applicant lane | property lane)");
    for (applicant, property) in summary.applicant_lane.iter().zip(&summary.property_lane) {
        println!(
            "  - {:<10} {:>3} | {:>3}",
            applicant.stage_label, applicant.count, property.count
        );
    }
}

fn render_board(board: &LaneBoard) {
    println!("\n{} lane board", board.lane.label());
    for column in &board.columns {
        if column.cards.is_empty() {
            println!("  {}: -", column.stage_label);
            continue;
        }
        for card in &column.cards {
            println!(
                "  {}: {} @ {} ({}/{} tasks)",
                column.stage_label,
                card.applicant_name,
                card.property_address,
                card.progress.completed,
                card.progress.total
            );
        }
    }
}
