use anyhow::Context;
use api_shared::{
    parse_schedule, MedicationScheduleRes, NextDoseRes, RiskSummaryRes, ScheduleTextRes,
    ScheduleTimingRes,
};
use carewatch_core::{
    adherence_from_events, adherence_rate, format_for_display, next_dose_time,
    overdue_doses_with_grace, resolve_medication_schedule, resolve_schedule_from_timing,
    resolve_text, summarize_with, ClockTime, DoseEvent, RiskConvention,
};
use chrono::{DateTime, Local, Timelike, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "carewatch")]
#[command(about = "CareWatch ED-risk and medication schedule CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarise ED-utilisation risk from a FHIR searchset bundle
    Risk {
        /// Path to a Bundle JSON file
        bundle: PathBuf,
        /// Reference time (RFC 3339); defaults to now
        #[arg(long)]
        reference_time: Option<DateTime<Utc>>,
        /// Threshold convention: dual-window or twelve-month-only
        #[arg(long, default_value = "dual-window")]
        convention: RiskConvention,
    },
    /// Resolve a free-text dosage instruction
    Schedule {
        /// Instruction text, e.g. "Take 1 tablet BID"
        text: String,
    },
    /// Resolve a FHIR Timing JSON file
    Timing {
        /// Path to a Timing JSON file
        timing: PathBuf,
    },
    /// Resolve every dosage instruction of a FHIR MedicationRequest JSON file
    Medication {
        /// Path to a MedicationRequest JSON file
        medication: PathBuf,
    },
    /// Show the next dose due
    NextDose {
        /// Comma-separated HH:MM times
        #[arg(long, value_delimiter = ',', required = true)]
        schedule: Vec<String>,
        /// Current time (HH:MM); defaults to the local clock
        #[arg(long)]
        now: Option<String>,
    },
    /// List overdue doses
    Overdue {
        /// Comma-separated HH:MM times
        #[arg(long, value_delimiter = ',', required = true)]
        schedule: Vec<String>,
        /// Current time (HH:MM); defaults to the local clock
        #[arg(long)]
        now: Option<String>,
        /// Grace period in minutes
        #[arg(long, default_value_t = carewatch_core::constants::DEFAULT_OVERDUE_GRACE_MINUTES)]
        grace: u32,
    },
    /// Compute an adherence rate from counts or a JSON file of dose events
    Adherence {
        #[arg(long, default_value_t = 0)]
        taken: u32,
        #[arg(long, default_value_t = 0)]
        missed: u32,
        /// Path to a JSON array of dose events
        #[arg(long, conflicts_with_all = ["taken", "missed"])]
        events: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("carewatch=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(command) => println!("{}", run(command)?),
        None => println!("Use 'carewatch --help' for commands"),
    }

    Ok(())
}

fn run(command: Commands) -> anyhow::Result<String> {
    let output = match command {
        Commands::Risk {
            bundle,
            reference_time,
            convention,
        } => {
            let history = fhir::Bundle::parse(&read(&bundle)?)
                .with_context(|| format!("reading bundle {}", bundle.display()))?;
            if history.skipped_entries > 0 {
                tracing::warn!(
                    skipped = history.skipped_entries,
                    "some bundle entries were unreadable"
                );
            }
            let summary = summarize_with(
                convention,
                &history.encounters,
                &history.conditions,
                &history.medications,
                reference_time.unwrap_or_else(Utc::now),
            );
            serde_json::to_string_pretty(&RiskSummaryRes::new(summary, &history))?
        }
        Commands::Schedule { text } => {
            serde_json::to_string_pretty(&ScheduleTextRes::from(resolve_text(&text)))?
        }
        Commands::Timing { timing } => {
            let timing = fhir::Timing::parse(&read(&timing)?)?;
            let times = resolve_schedule_from_timing(&timing);
            serde_json::to_string_pretty(&ScheduleTimingRes::from(times.as_slice()))?
        }
        Commands::Medication { medication } => {
            let medication = fhir::MedicationRequest::parse(&read(&medication)?)?;
            let times = resolve_medication_schedule(&medication);
            serde_json::to_string_pretty(&MedicationScheduleRes::new(&medication, &times))?
        }
        Commands::NextDose { schedule, now } => {
            let schedule = parse_schedule(&schedule)?;
            let now = now_or_local(now.as_deref())?;
            serde_json::to_string_pretty(&NextDoseRes::from(next_dose_time(&schedule, now)))?
        }
        Commands::Overdue {
            schedule,
            now,
            grace,
        } => {
            let schedule = parse_schedule(&schedule)?;
            let now = now_or_local(now.as_deref())?;
            let overdue: Vec<String> = overdue_doses_with_grace(&schedule, now, grace)
                .into_iter()
                .map(format_for_display)
                .collect();
            if overdue.is_empty() {
                "No overdue doses.".to_string()
            } else {
                format!("Overdue: {}", overdue.join(", "))
            }
        }
        Commands::Adherence {
            taken,
            missed,
            events,
        } => {
            let rate = match events {
                Some(path) => {
                    let events: Vec<DoseEvent> = serde_json::from_str(&read(&path)?)
                        .with_context(|| format!("parsing dose events {}", path.display()))?;
                    adherence_from_events(&events)
                }
                None => adherence_rate(taken, missed),
            };
            format!("Adherence: {rate}%")
        }
    };

    Ok(output)
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn now_or_local(now: Option<&str>) -> anyhow::Result<ClockTime> {
    match now {
        Some(text) => Ok(text.trim().parse()?),
        None => {
            let local = Local::now();
            Ok(ClockTime::from_minutes(local.hour() * 60 + local.minute()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(args: &[&str]) -> Commands {
        Cli::try_parse_from(args)
            .expect("arguments should parse")
            .command
            .expect("a subcommand")
    }

    fn json_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write temp file");
        file
    }

    #[test]
    fn schedule_subcommand() {
        let out = run(parse(&["carewatch", "schedule", "Take 1 tablet BID"])).expect("run");
        let value: serde_json::Value = serde_json::from_str(&out).expect("json");
        assert_eq!(value["times"], serde_json::json!(["08:00", "20:00"]));
    }

    #[test]
    fn next_dose_takes_comma_separated_schedule() {
        let out = run(parse(&[
            "carewatch",
            "next-dose",
            "--schedule",
            "08:00,20:00",
            "--now",
            "09:00",
        ]))
        .expect("run");
        let value: serde_json::Value = serde_json::from_str(&out).expect("json");
        assert_eq!(value["time"], "20:00");
        assert_eq!(value["isToday"], true);
    }

    #[test]
    fn next_dose_requires_schedule() {
        assert!(Cli::try_parse_from(["carewatch", "next-dose"]).is_err());
    }

    #[test]
    fn overdue_lists_display_times() {
        let out = run(parse(&[
            "carewatch",
            "overdue",
            "--schedule",
            "08:00,12:00",
            "--now",
            "12:45",
        ]))
        .expect("run");
        assert_eq!(out, "Overdue: 8:00 AM, 12:00 PM");

        let none = run(parse(&[
            "carewatch",
            "overdue",
            "--schedule",
            "08:00",
            "--now",
            "08:10",
        ]))
        .expect("run");
        assert_eq!(none, "No overdue doses.");
    }

    #[test]
    fn adherence_from_counts_and_events() {
        let out = run(parse(&["carewatch", "adherence", "--taken", "3", "--missed", "1"]))
            .expect("run");
        assert_eq!(out, "Adherence: 75%");

        let events = json_file(
            r#"[
                {"scheduledTime": "08:00", "taken": true, "recordedAt": "2026-10-15T08:01:00Z"},
                {"scheduledTime": "20:00", "taken": false, "recordedAt": "2026-10-15T21:00:00Z"}
            ]"#,
        );
        let path = events.path().to_str().expect("utf-8 path");
        let out = run(parse(&["carewatch", "adherence", "--events", path])).expect("run");
        assert_eq!(out, "Adherence: 50%");

        assert_eq!(
            run(parse(&["carewatch", "adherence"])).expect("run"),
            "Adherence: 100%"
        );
    }

    #[test]
    fn adherence_events_conflict_with_counts() {
        assert!(
            Cli::try_parse_from(["carewatch", "adherence", "--taken", "1", "--events", "x.json"])
                .is_err()
        );
    }

    #[test]
    fn risk_from_bundle_file() {
        let bundle = json_file(
            r#"{
                "resourceType": "Bundle",
                "entry": [
                    {"resource": {"resourceType": "Encounter", "class": {"code": "EMER"},
                                  "period": {"start": "2026-09-01T10:00:00Z"}}},
                    {"resource": {"resourceType": "Condition", "code": {"text": "Asthma"}}}
                ]
            }"#,
        );
        let path = bundle.path().to_str().expect("utf-8 path");
        let out = run(parse(&[
            "carewatch",
            "risk",
            path,
            "--reference-time",
            "2026-10-15T12:00:00Z",
        ]))
        .expect("run");

        let value: serde_json::Value = serde_json::from_str(&out).expect("json");
        assert_eq!(value["edVisitCount12Months"], 1);
        assert_eq!(value["riskTier"], "LOW");
        assert_eq!(value["chronicConditions"], serde_json::json!(["Asthma"]));
    }

    #[test]
    fn risk_convention_is_validated() {
        assert!(Cli::try_parse_from(["carewatch", "risk", "b.json", "--convention", "weekly"])
            .is_err());
        let command = parse(&[
            "carewatch",
            "risk",
            "b.json",
            "--convention",
            "twelve-month-only",
        ]);
        assert!(matches!(
            command,
            Commands::Risk {
                convention: RiskConvention::TwelveMonthOnly,
                ..
            }
        ));
    }

    #[test]
    fn timing_from_file() {
        let timing = json_file(r#"{"repeat": {"when": ["AC"]}}"#);
        let path = timing.path().to_str().expect("utf-8 path");
        let out = run(parse(&["carewatch", "timing", path])).expect("run");
        let value: serde_json::Value = serde_json::from_str(&out).expect("json");
        assert_eq!(
            value["times"],
            serde_json::json!(["07:30", "11:30", "17:30"])
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(run(parse(&["carewatch", "timing", "/nonexistent/timing.json"])).is_err());
    }
}
