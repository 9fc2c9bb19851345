use anyhow::{Context, Result};
use chrono::{Days, Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tabled::{builder::Builder, settings::Style, Table, Tabled};

use vitalrs::activity_analysis::{classify_activity, ActivityMetrics};
use vitalrs::analysis::{assess_day, DailyAssessment};
use vitalrs::baseline::{rolling_baseline_with, BaselineMetric, StableBand};
use vitalrs::config::AppConfig;
use vitalrs::correlation::correlation_matrix;
use vitalrs::digestion::TimeToSleep;
use vitalrs::error::{FailureReport, VitalError};
use vitalrs::history::{mineral_window, DayFlags, HistoryRepository, InMemoryHistory, JsonFileHistory, MineralSnapshot};
use vitalrs::ingest::{load_entries, ImportManager};
use vitalrs::logging::{init_logging, LogLevel};
use vitalrs::models::{DailyRecord, DayType, NutrientLogEntry};
use vitalrs::pillars::{bio_pillars, PillarState};
use vitalrs::score::{fa_score_breakdown, fa_score_label, FaScoreInputs, FaScoreLabel};
use vitalrs::weekly::{baselines, weekly_summaries, HeartBaseline};

/// VitalRS - Physiological analytics and scoring
///
/// Scores electrolyte balance, digestion and training load, tracks heart
/// baselines and weekly trends from daily records and nutrition logs.
#[derive(Parser)]
#[command(name = "vitalrs")]
#[command(author = "VitalRS Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Physiological analytics and scoring CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum DayTypeArg {
    Training,
    Rest,
}

impl From<DayTypeArg> for DayType {
    fn from(arg: DayTypeArg) -> Self {
        match arg {
            DayTypeArg::Training => DayType::Training,
            DayTypeArg::Rest => DayType::Rest,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricArg {
    Hrv,
    Rhr,
}

impl From<MetricArg> for BaselineMetric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Hrv => BaselineMetric::Hrv,
            MetricArg::Rhr => BaselineMetric::RestingHr,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the FA score from explicit daily values
    Score {
        /// Sodium (mg)
        #[arg(long, default_value = "0")]
        na: f64,

        /// Potassium (mg)
        #[arg(long, default_value = "0")]
        k: f64,

        /// Calcium (mg)
        #[arg(long, default_value = "0")]
        ca: f64,

        /// Magnesium (mg)
        #[arg(long, default_value = "0")]
        mg: f64,

        /// Taurine (g)
        #[arg(long, default_value = "0")]
        taurine: f64,

        /// Nocturnal digestive load
        #[arg(long, default_value = "0")]
        digestive_load: f64,

        /// Training stress of the day
        #[arg(long, default_value = "0")]
        tss: f64,

        /// Show every adjustment
        #[arg(short, long)]
        explain: bool,
    },

    /// Full assessment of one day
    Day {
        /// Daily records file (JSON or CSV)
        #[arg(short, long)]
        records: PathBuf,

        /// Nutrition entries file (JSON)
        #[arg(short, long)]
        entries: Option<PathBuf>,

        /// Day to assess (YYYY-MM-DD, default today)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Gap between dinner and sleep (>2h, 1-2h, <1h)
        #[arg(short, long, default_value = ">2h")]
        sleep: TimeToSleep,

        /// Threshold profile
        #[arg(short = 't', long, value_enum, default_value = "training")]
        day_type: DayTypeArg,

        /// Store the day's minerals and flags in the configured history files
        #[arg(long)]
        record: bool,

        /// Print the assessment as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rolling baseline for HRV or resting heart rate
    Baseline {
        /// Daily records file (JSON or CSV)
        #[arg(short, long)]
        records: PathBuf,

        /// Metric to evaluate
        #[arg(short, long, value_enum, default_value = "hrv")]
        metric: MetricArg,

        /// Last day included (YYYY-MM-DD, default today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Weekly summaries and heart baselines
    Weekly {
        /// Daily records file (JSON or CSV)
        #[arg(short, long)]
        records: PathBuf,

        /// Number of trailing weeks
        #[arg(short, long, default_value = "8")]
        weeks: usize,

        /// Last day of the most recent week (YYYY-MM-DD, default today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Correlation matrix across weekly metrics
    Correlate {
        /// Daily records file (JSON or CSV)
        #[arg(short, long)]
        records: PathBuf,

        /// Number of trailing weeks
        #[arg(short, long, default_value = "12")]
        weeks: usize,

        /// Minimum |r| listed among the strongest pairs
        #[arg(long, default_value = "0.5")]
        min_abs: f64,

        /// Last day of the most recent week (YYYY-MM-DD, default today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Regulation, energy and rest pillars
    Pillars {
        /// Daily records file (JSON or CSV)
        #[arg(short, long)]
        records: PathBuf,

        /// Day to evaluate (YYYY-MM-DD, default today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Classify one activity from its summary metrics
    Classify {
        /// Variability index
        #[arg(long)]
        vi: f64,

        /// Intensity factor
        #[arg(long = "if")]
        intensity_factor: f64,

        /// Aerobic decoupling (%)
        #[arg(long, default_value = "0")]
        decoupling: f64,

        /// Average power (W)
        #[arg(long, default_value = "0")]
        avg_power: f64,

        /// Normalized power (W)
        #[arg(long, default_value = "0")]
        np: f64,
    },

    /// Manage configuration
    Config {
        /// Print the active configuration
        #[arg(short, long)]
        show: bool,

        /// Write the default configuration file
        #[arg(short, long)]
        init: bool,
    },
}

#[derive(Tabled)]
struct AdjustmentRow {
    #[tabled(rename = "Area")]
    area: String,
    #[tabled(rename = "Reason")]
    reason: String,
    #[tabled(rename = "Points")]
    points: String,
}

#[derive(Tabled)]
struct NutrientRow {
    #[tabled(rename = "Nutrient")]
    nutrient: String,
    #[tabled(rename = "Total")]
    value: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Tabled)]
struct WeekRow {
    #[tabled(rename = "Week")]
    week: String,
    #[tabled(rename = "Days")]
    days: usize,
    #[tabled(rename = "TSS")]
    tss: String,
    #[tabled(rename = "ATL")]
    atl: String,
    #[tabled(rename = "CTL")]
    ctl: String,
    #[tabled(rename = "RHR")]
    rhr: String,
    #[tabled(rename = "HRV")]
    hrv: String,
    #[tabled(rename = "Sleep")]
    sleep: String,
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.*}", precision, v))
}

fn today_or(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Local::now().date_naive())
}

fn print_table(mut table: Table) {
    table.with(Style::rounded());
    println!("{}", table);
}

fn colored_label(label: &FaScoreLabel, text: String) -> ColoredString {
    match label.color {
        "green" => text.green().bold(),
        "amber" => text.yellow().bold(),
        _ => text.red().bold(),
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(AppConfig::load_or_default()),
    }
}

fn load_records(path: &Path) -> Result<Vec<DailyRecord>> {
    ImportManager::new()
        .import_file(path)
        .with_context(|| format!("Failed to load records from {}", path.display()))
}

fn snapshot_of(record: &DailyRecord) -> MineralSnapshot {
    MineralSnapshot {
        na: record.nutrition.na,
        k: record.nutrition.k,
        mg: record.nutrition.mg,
    }
}

/// Previous days' minerals, from the history file when configured and from the
/// loaded records otherwise
fn previous_minerals(
    config: &AppConfig,
    records: &[DailyRecord],
    date: NaiveDate,
) -> Result<BTreeMap<NaiveDate, MineralSnapshot>> {
    let retention = config.history.retention;

    if let Some(path) = &config.history.mineral_history_path {
        let repo = JsonFileHistory::<MineralSnapshot>::open(path, retention)?;
        return Ok(mineral_window(&repo, date));
    }

    let mut repo = InMemoryHistory::new(retention)?;
    for record in records.iter().filter(|r| r.date < date) {
        repo.put(record.date, snapshot_of(record))?;
    }
    Ok(mineral_window(&repo, date))
}

fn record_history(config: &AppConfig, assessment: &DailyAssessment) -> Result<()> {
    let retention = config.history.retention;

    match &config.history.mineral_history_path {
        Some(path) => {
            let mut repo = JsonFileHistory::<MineralSnapshot>::open(path, retention)?;
            repo.put(assessment.date, assessment.mineral_snapshot())?;
            println!("  {} {}", "Minerals stored in".dimmed(), path.display());
        }
        None => println!("{}", "No mineral history file configured".yellow()),
    }

    if let Some(path) = &config.history.flags_history_path {
        let mut repo = JsonFileHistory::<DayFlags>::open(path, retention)?;
        repo.put(assessment.date, assessment.day_flags())?;

        let start = assessment
            .date
            .checked_sub_days(Days::new(retention.saturating_sub(1) as u64))
            .unwrap_or(NaiveDate::MIN);
        let heavy = repo
            .get(start..=assessment.date)
            .iter()
            .filter(|(_, flags)| flags.heavy_dinner)
            .count();
        println!("  Heavy dinners in the last {} days: {}", retention, heavy);
    }

    Ok(())
}

fn print_assessment(assessment: &DailyAssessment) {
    let score = &assessment.score;
    let label = &assessment.label;

    println!(
        "{}",
        format!("Day assessment for {}", assessment.date).cyan().bold()
    );
    println!(
        "  FA score: {}  {}",
        colored_label(label, format!("{} {}", score.score, label.band)),
        label.message
    );

    println!(
        "  Na:K {} ({})   Ca:Mg {} ({})",
        fmt_opt(assessment.ratios.na_k, 2),
        assessment.na_k_status.description(),
        fmt_opt(assessment.ratios.ca_mg, 2),
        assessment.ca_mg_status.description()
    );

    let digestion = &assessment.digestion;
    println!(
        "  Digestive load: {:.0} ({}, sleep {})",
        digestion.load,
        digestion.level.label(),
        digestion.time_to_sleep
    );
    if assessment.heavy_dinner {
        println!("  {}", "Heavy dinner".red());
    }

    for (mineral, streak) in assessment.deficits.active() {
        println!(
            "  {}",
            format!("{} deficit for {} days", mineral.symbol(), streak.days).yellow()
        );
    }

    let rows: Vec<NutrientRow> = assessment
        .nutrients
        .iter()
        .map(|line| NutrientRow {
            nutrient: line.nutrient.to_string(),
            value: format!("{:.0}", line.value),
            status: line.status.description().to_string(),
        })
        .collect();
    print_table(Table::new(rows));
}

fn print_heart_baseline(name: &str, baseline: Option<HeartBaseline>) {
    match baseline {
        Some(b) => println!(
            "  {:<9} RHR {} bpm  HRV {} ms  ({} weeks)",
            name,
            fmt_opt(b.resting_hr, 1),
            fmt_opt(b.hrv, 1),
            b.weeks
        ),
        None => println!("  {:<9} {}", name, "insufficient data".dimmed()),
    }
}

fn pillar_text(name: &str, state: PillarState) -> ColoredString {
    match state {
        PillarState::Green => format!("● {}", name).green(),
        PillarState::Amber => format!("● {}", name).yellow(),
    }
}

fn report_failure(err: &anyhow::Error) {
    let report = FailureReport::from_error(err);
    let chain = format!("{:#}", err);

    if report.level == tracing::Level::WARN {
        tracing::warn!(error = %chain, "Command failed");
    } else {
        tracing::error!(error = %chain, "Command failed");
    }

    let mut lines = report.lines.iter();
    if let Some(headline) = lines.next() {
        eprintln!("{} {}", "Error:".red().bold(), headline);
    }
    for line in lines {
        eprintln!("  {}", line);
    }
    if report.retryable {
        eprintln!("  {}", "The operation may succeed if retried".dimmed());
    }
}

fn main() {
    if let Err(err) = run() {
        report_failure(&err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initializing must not require the file it is about to create
    let initializing = matches!(cli.command, Commands::Config { init: true, .. });
    let config = if initializing {
        AppConfig::default()
    } else {
        load_config(cli.config.as_deref())?
    };

    let mut log_config = config.logging.clone();
    if cli.verbose > 0 {
        log_config.level = LogLevel::from_verbosity(cli.verbose);
        eprintln!("{}", format!("Log level: {}", log_config.level).dimmed());
    }
    init_logging(&log_config)?;

    match cli.command {
        Commands::Score {
            na,
            k,
            ca,
            mg,
            taurine,
            digestive_load,
            tss,
            explain,
        } => {
            let breakdown = fa_score_breakdown(&FaScoreInputs {
                na,
                k,
                ca,
                mg,
                taurine_g: taurine,
                digestive_load,
                tss,
            });
            let label = fa_score_label(breakdown.score);

            println!(
                "FA score: {}",
                colored_label(&label, format!("{} {}", breakdown.score, label.band))
            );
            println!("  {}", label.message);

            if explain {
                let rows: Vec<AdjustmentRow> = breakdown
                    .adjustments
                    .iter()
                    .map(|a| AdjustmentRow {
                        area: format!("{:?}", a.category),
                        reason: a.reason.clone(),
                        points: format!("{:+}", a.points),
                    })
                    .collect();
                print_table(Table::new(rows));
                println!("  Raw total before clamping: {}", breakdown.raw);
            }
        }

        Commands::Day {
            records,
            entries,
            date,
            sleep,
            day_type,
            record,
            json,
        } => {
            let date = today_or(date);
            let entries: Vec<NutrientLogEntry> = match entries {
                Some(path) => load_entries(&path)?,
                None => Vec::new(),
            };

            let mut days = load_records(&records)?;
            if !entries.is_empty() {
                for day in days.iter_mut() {
                    if entries.iter().any(|e| e.date() == day.date) {
                        day.apply_log(&entries);
                    }
                }
            }

            let day = days
                .iter()
                .find(|d| d.date == date)
                .cloned()
                .unwrap_or_else(|| DailyRecord::new(date));

            let history = previous_minerals(&config, &days, date)?;
            let assessment = assess_day(&day, &entries, sleep, &history, &config, day_type.into());

            if json {
                println!("{}", serde_json::to_string_pretty(&assessment)?);
            } else {
                print_assessment(&assessment);
            }

            if record {
                record_history(&config, &assessment)?;
            }
        }

        Commands::Baseline {
            records,
            metric,
            date,
        } => {
            let date = today_or(date);
            let metric = BaselineMetric::from(metric);
            let days: Vec<DailyRecord> = load_records(&records)?
                .into_iter()
                .filter(|d| d.date <= date)
                .collect();

            let samples: Vec<f64> = days.iter().filter_map(|d| metric.value_of(d)).collect();
            let band = StableBand::from_samples(&samples, config.baseline.band_width_sd);
            let baseline = rolling_baseline_with(&days, metric, band, &config.baseline);

            if baseline.is_insufficient() {
                println!(
                    "{}",
                    format!("Not enough data for a baseline ({} samples)", baseline.samples).yellow()
                );
                return Ok(());
            }

            let unit = metric.unit();
            println!("{}", format!("{:?} baseline up to {}", metric, date).cyan().bold());
            println!("  Current:        {} {}", fmt_opt(baseline.current, 1), unit);
            println!(
                "  Moving average: {} {} ({} samples)",
                fmt_opt(baseline.moving_average, 1),
                unit,
                baseline.samples
            );
            println!(
                "  Stable band:    {} - {} {}",
                fmt_opt(baseline.lower, 1),
                fmt_opt(baseline.upper, 1),
                unit
            );
            if baseline.is_outside == Some(true) {
                println!("  {}", "Current value is outside the stable band".red());
            }
        }

        Commands::Weekly {
            records,
            weeks,
            date,
        } => {
            if weeks == 0 {
                return Err(VitalError::Validation("--weeks must be at least 1".to_string()).into());
            }
            let days = load_records(&records)?;
            let summaries = weekly_summaries(&days, weeks, today_or(date));

            if summaries.is_empty() {
                println!("{}", "No records in the requested weeks".yellow());
                return Ok(());
            }

            let rows: Vec<WeekRow> = summaries
                .iter()
                .map(|w| WeekRow {
                    week: w.label.clone(),
                    days: w.days,
                    tss: format!("{:.0}", w.total_tss),
                    atl: fmt_opt(w.atl, 1),
                    ctl: fmt_opt(w.ctl, 1),
                    rhr: fmt_opt(w.resting_hr, 1),
                    hrv: fmt_opt(w.hrv, 1),
                    sleep: fmt_opt(w.sleep_score, 0),
                })
                .collect();
            print_table(Table::new(rows));

            let result = baselines(&summaries);
            println!("{}", "Heart baselines".cyan().bold());
            print_heart_baseline("Recovery", result.recovery);
            print_heart_baseline("Chronic", result.chronic);
            print_heart_baseline("Historic", result.historic);
        }

        Commands::Correlate {
            records,
            weeks,
            min_abs,
            date,
        } => {
            if weeks == 0 {
                return Err(VitalError::Validation("--weeks must be at least 1".to_string()).into());
            }
            let days = load_records(&records)?;
            let summaries = weekly_summaries(&days, weeks, today_or(date));
            let matrix = correlation_matrix(&summaries);

            let mut builder = Builder::default();
            let mut header = vec![String::new()];
            header.extend(matrix.metrics.iter().map(|m| m.to_string()));
            builder.push_record(header);
            for (metric, row) in matrix.metrics.iter().zip(&matrix.values) {
                let mut cells = vec![metric.to_string()];
                cells.extend(row.iter().map(|r| fmt_opt(*r, 2)));
                builder.push_record(cells);
            }
            print_table(builder.build());

            let pairs = matrix.strongest_pairs(min_abs);
            if pairs.is_empty() {
                println!("{}", format!("No pairs with |r| >= {:.2}", min_abs).dimmed());
            }
            for pair in pairs {
                let text = format!("{} / {}: {:+.2}", pair.first, pair.second, pair.r);
                if pair.r >= 0.0 {
                    println!("  {}", text.green());
                } else {
                    println!("  {}", text.red());
                }
            }
        }

        Commands::Pillars { records, date } => {
            let date = today_or(date);
            let days = load_records(&records)?;
            let pillars = bio_pillars(&days, date);

            println!("{}", format!("Bio-pillars for {}", date).cyan().bold());
            println!("  {}", pillar_text("Regulation", pillars.regulation));
            println!("  {}", pillar_text("Energy", pillars.energy));
            println!("  {}", pillar_text("Rest", pillars.rest));

            let form = days
                .iter()
                .filter(|d| d.date <= date)
                .max_by_key(|d| d.date)
                .and_then(DailyRecord::tsb);
            println!("  Form (TSB): {}", fmt_opt(form, 1));
        }

        Commands::Classify {
            vi,
            intensity_factor,
            decoupling,
            avg_power,
            np,
        } => {
            let metrics = ActivityMetrics {
                variability_index: vi,
                intensity_factor,
                decoupling_pct: decoupling,
                avg_power,
                normalized_power: np,
            };
            metrics.validate()?;
            let result = classify_activity(&metrics);

            println!("{}", "Activity classification".cyan().bold());
            println!("  Pacing:     {}", result.pacing.label());
            println!("  Zone:       {}", result.zone.label());
            println!("  Coupling:   {}", result.coupling.label());
            println!(
                "  Efficiency: {}",
                result.efficiency.map_or("-", |e| e.label())
            );
            for recommendation in &result.recommendations {
                println!("  • {}", recommendation.message());
            }
        }

        Commands::Config { show, init } => {
            if init {
                let path = AppConfig::init_file(cli.config.as_deref())?;
                println!("{} {}", "✓ Configuration written to".green(), path.display());
            } else if show {
                println!("{}", toml::to_string_pretty(&config)?);
            } else {
                let path = cli.config.unwrap_or_else(AppConfig::default_config_path);
                println!("Config file: {}", path.display());
            }
        }
    }

    Ok(())
}
