use crate::infra::{load_snapshot, sample_snapshot, InMemoryDispatchStore};
use chrono::{Local, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::Args;
use solar_ops::config::AppConfig;
use solar_ops::error::AppError;
use solar_ops::workflows::dispatch::domain::parse_date;
use solar_ops::workflows::dispatch::{
    Clock, CommitRequest, CrewOption, DispatchOverview, DispatchRecommendation, DispatchService,
    FixedClock, SystemClock,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct OverviewArgs {
    /// Dispatch date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// JSON snapshot of jobs, crews, and assignments. Overrides APP_DISPATCH_SNAPSHOT.
    #[arg(long)]
    pub(crate) snapshot: Option<PathBuf>,
    /// Subcontractor roster CSV to overlay. Overrides APP_ROSTER_CSV.
    #[arg(long)]
    pub(crate) roster_csv: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Date to build the sample board around (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) date: Option<NaiveDate>,
}

pub(crate) fn run_dispatch_overview(args: OverviewArgs) -> Result<(), AppError> {
    let OverviewArgs {
        date,
        snapshot,
        roster_csv,
    } = args;

    let mut config = AppConfig::load()?;
    if snapshot.is_some() {
        config.dispatch.snapshot_path = snapshot;
    }
    if roster_csv.is_some() {
        config.dispatch.roster_csv = roster_csv;
    }

    let clock = Arc::new(SystemClock);
    let date = date.unwrap_or_else(|| clock.today());
    let snapshot = load_snapshot(&config.dispatch, date, clock.now())?;
    let store = Arc::new(InMemoryDispatchStore::from_snapshot(snapshot));
    let service = DispatchService::new(store.clone(), store, clock);

    let overview = service.overview(Some(date))?;
    render_overview(&overview);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let midday = NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default();
    let now = Utc.from_utc_datetime(&date.and_time(midday));

    let store = Arc::new(InMemoryDispatchStore::from_snapshot(sample_snapshot(
        date, now,
    )));
    let service = DispatchService::new(store.clone(), store.clone(), Arc::new(FixedClock(now)));

    println!("Crew dispatch demo");
    let overview = service.overview(Some(date))?;
    render_overview(&overview);

    let Some((job_id, option)) = overview.recommendations.iter().find_map(|recommendation| {
        let option = recommendation.recommended_subcontractor.as_ref()?;
        recommendation
            .can_start
            .then(|| (recommendation.job.id.clone(), option.clone()))
    }) else {
        println!("\nNo job is ready to dispatch; nothing to commit.");
        return Ok(());
    };

    println!(
        "\nCommitting {} to {} for {}",
        option.subcontractor_name, job_id, date
    );
    let outcome = service.commit(CommitRequest {
        job_id: job_id.clone(),
        subcontractor_id: option.subcontractor_id.clone(),
        scheduled_date: date,
    })?;
    println!(
        "- assignment {} | {} active assignments on record",
        if outcome.assignment_created {
            "created"
        } else {
            "already present"
        },
        store
            .assignments()
            .iter()
            .filter(|record| record.is_active())
            .count()
    );

    let repeat = service.commit(CommitRequest {
        job_id: job_id.clone(),
        subcontractor_id: option.subcontractor_id.clone(),
        scheduled_date: date,
    })?;
    println!(
        "- repeat commit created a new assignment: {}",
        repeat.assignment_created
    );

    println!("\nBoard after commit");
    let refreshed = service.overview(Some(date))?;
    render_overview(&refreshed);
    Ok(())
}

fn render_overview(overview: &DispatchOverview) {
    println!(
        "Dispatch board for {}: {} jobs | {} ready | {} blocked",
        overview.date, overview.jobs_total, overview.jobs_dispatchable, overview.jobs_blocked
    );

    for recommendation in &overview.recommendations {
        render_recommendation(recommendation);
    }
}

fn render_recommendation(recommendation: &DispatchRecommendation) {
    let job = &recommendation.job;
    println!(
        "- {} {} ({}) | {} | materials {}",
        job.job_number,
        job.customer_name,
        job.city.as_deref().unwrap_or("no city"),
        job.status.label(),
        recommendation.materials_eta.label()
    );
    println!("  {}", recommendation.summary());

    if let Some(option) = &recommendation.recommended_subcontractor {
        println!("  recommended: {}", describe_option(option));
    }
    for option in &recommendation.alternatives {
        println!("  alternative: {}", describe_option(option));
    }
}

fn describe_option(option: &CrewOption) -> String {
    let reasons: Vec<&str> = option.reasons.iter().map(|reason| reason.label()).collect();
    format!(
        "{} [{}] score {} | {}/{} jobs | {}",
        option.subcontractor_name,
        option.confidence.label(),
        option.score,
        option.jobs_on_date,
        option.max_concurrent_jobs,
        reasons.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_runs_against_the_sample_board() {
        let date = NaiveDate::from_ymd_opt(2025, 10, 15).expect("valid date");

        run_demo(DemoArgs { date: Some(date) }).expect("demo completes");
    }

    #[test]
    fn option_description_lists_reason_codes() {
        let date = NaiveDate::from_ymd_opt(2025, 10, 15).expect("valid date");
        let now = Utc
            .with_ymd_and_hms(2025, 10, 15, 12, 0, 0)
            .single()
            .expect("valid instant");
        let store = Arc::new(InMemoryDispatchStore::from_snapshot(sample_snapshot(
            date, now,
        )));
        let service = DispatchService::new(store.clone(), store, Arc::new(FixedClock(now)));

        let overview = service.overview(Some(date)).expect("overview computed");
        let pick = overview.recommendations[0]
            .recommended_subcontractor
            .as_ref()
            .expect("first job has a crew");

        let line = describe_option(pick);
        assert!(line.starts_with("Desert Sun Installers [HIGH] score 125"));
        assert!(line.contains("SERVICE_AREA_MATCH"));
    }
}
