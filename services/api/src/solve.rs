use crate::infra::load_catalog;
use chrono::SecondsFormat;
use clap::{Args, ValueEnum};
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::PathBuf;
use volunteer_match::config::{AppConfig, ConfigError};
use volunteer_match::error::AppError;
use volunteer_match::matching::{MatchingService, Person, RunSummary};
use volunteer_match::telemetry;

#[derive(Args, Debug)]
pub(crate) struct SolveArgs {
    /// JSON array of submissions (`id`, `name`, `preferences`)
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// JSON service catalog (defaults to APP_CATALOG_PATH, then the standard catalog)
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// Seed for a reproducible roster
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Override the number of generations
    #[arg(long)]
    pub(crate) generations: Option<usize>,
    /// Override the population size
    #[arg(long)]
    pub(crate) population: Option<usize>,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub(crate) format: OutputFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

pub(crate) fn run_solve(args: SolveArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let mut search = config.optimizer.search;
    if let Some(generations) = args.generations {
        search.max_generations = generations;
    }
    if let Some(population) = args.population {
        search.population_size = population;
    }
    search
        .validate()
        .map_err(|err| AppError::Config(ConfigError::Optimizer(err)))?;

    let catalog_path = args.catalog.or(config.catalog_path);
    let catalog = load_catalog(catalog_path.as_deref())?;
    let service =
        MatchingService::new(catalog, search).with_seed(args.seed.or(config.optimizer.seed));

    let submissions = read_submissions(BufReader::new(File::open(&args.input)?))?;
    let summary = solve(&service, submissions)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    render(&summary, args.format, &mut out)?;
    out.flush()?;
    Ok(())
}

pub(crate) fn read_submissions<R: Read>(reader: R) -> Result<Vec<Person>, AppError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Registers every submission (later entries replace earlier ones with the same id) and runs
/// the optimizer once.
pub(crate) fn solve(
    service: &MatchingService,
    submissions: Vec<Person>,
) -> Result<RunSummary, AppError> {
    for person in submissions {
        service.submit_preferences(person)?;
    }
    Ok(service.run_now())
}

pub(crate) fn render<W: Write>(
    summary: &RunSummary,
    format: OutputFormat,
    out: &mut W,
) -> Result<(), AppError> {
    match format {
        OutputFormat::Table => render_table(summary, out)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &summary.outcome)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => render_csv(summary, out)?,
    }
    Ok(())
}

fn render_table<W: Write>(summary: &RunSummary, out: &mut W) -> io::Result<()> {
    let outcome = &summary.outcome;
    writeln!(
        out,
        "Roster for {} volunteers ({} generations searched)",
        summary.people,
        outcome.best_cost_by_generation.len().saturating_sub(1)
    )?;
    writeln!(
        out,
        "Run {} finished at {}",
        summary.sequence,
        summary.finished_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    )?;

    let width = outcome
        .assignments
        .iter()
        .map(|assignment| assignment.person_id.as_str().len())
        .max()
        .unwrap_or(0)
        .max("Volunteer".len());
    writeln!(out, "{:<width$}  {:<16}  {:>5}", "Volunteer", "Service", "Cost")?;
    for assignment in &outcome.assignments {
        writeln!(
            out,
            "{:<width$}  {:<16}  {:>5}",
            assignment.person_id.as_str(),
            assignment.service_name.as_deref().unwrap_or("(unassigned)"),
            assignment.cost
        )?;
    }

    writeln!(
        out,
        "Total dissatisfaction: {} | feasible: {}",
        outcome.dissatisfaction,
        if outcome.feasible { "yes" } else { "no" }
    )?;
    for violation in &outcome.over_capacity {
        writeln!(
            out,
            "- {} holds {} of {} places",
            violation.service_name, violation.assigned, violation.capacity
        )?;
    }
    Ok(())
}

fn render_csv<W: Write>(summary: &RunSummary, out: &mut W) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);
    writer
        .write_record(["volunteer_id", "service", "cost"])
        .map_err(io::Error::from)?;
    for assignment in &summary.outcome.assignments {
        let cost = assignment.cost.to_string();
        writer
            .write_record([
                assignment.person_id.as_str(),
                assignment.service_name.as_deref().unwrap_or(""),
                cost.as_str(),
            ])
            .map_err(io::Error::from)?;
    }
    writer.flush()?;
    Ok(())
}
