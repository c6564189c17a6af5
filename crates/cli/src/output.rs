//! Output formatting for CLI

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use serde::Serialize;
use uitour_e2e::{Outcome, Scenario, SuiteResult, TestCase};

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn outcome_cell(outcome: Outcome) -> Cell {
    match outcome {
        Outcome::Passed => Cell::new("passed").fg(Color::Green),
        Outcome::Failed => Cell::new("failed").fg(Color::Red),
        Outcome::Errored => Cell::new("errored").fg(Color::Yellow),
        Outcome::Pending => Cell::new("pending"),
    }
}

/// Print the result of a suite run
pub fn print_suite(result: &SuiteResult, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(result),
        OutputFormat::Table => {
            let mut table = new_table();
            table.set_header(vec!["Scenario", "Outcome", "Assertions", "Duration", "Walkthrough"]);
            for case in &result.cases {
                table.add_row(vec![
                    Cell::new(&case.name),
                    outcome_cell(case.outcome),
                    Cell::new(format!("{}/{}", case.passed_count(), case.planned)),
                    Cell::new(format!("{} ms", case.duration_ms)),
                    Cell::new(
                        case.walkthrough
                            .as_ref()
                            .map(|p| p.display().to_string())
                            .unwrap_or_else(|| "-".to_string()),
                    ),
                ]);
            }
            println!("{table}");

            for case in result.cases.iter().filter(|c| !c.success()) {
                print_case_details(case);
            }

            let summary = format!(
                "{} passed, {} failed, {} errored in {} ms",
                result.passed, result.failed, result.errored, result.duration_ms
            );
            if result.success() {
                print_success(&summary);
            } else {
                print_error(&summary);
            }
        }
    }
}

fn print_case_details(case: &TestCase) {
    println!();
    println!("{}", case.name.bold());
    for assertion in &case.assertions {
        if assertion.passed {
            println!("   {} {}", "✓".green(), assertion.message);
        } else {
            println!("   {} {}", "✗".red(), assertion.message);
            if let Some(detail) = &assertion.detail {
                println!("     {}", detail.dimmed());
            }
        }
    }
    if let Some(error) = &case.error {
        println!("   {} {}", "Error:".red().bold(), error);
    }
}

#[derive(Serialize)]
struct ScenarioRow<'a> {
    name: &'a str,
    heading: &'a str,
    planned_assertions: usize,
    steps: usize,
    tags: &'a [String],
}

/// Print the scenarios that would run
pub fn print_scenarios(scenarios: &[Scenario], format: OutputFormat) {
    if scenarios.is_empty() {
        println!("No scenarios found.");
        return;
    }

    let rows: Vec<_> = scenarios
        .iter()
        .map(|s| ScenarioRow {
            name: &s.name,
            heading: s.heading(),
            planned_assertions: s.planned_assertions,
            steps: s.steps.len(),
            tags: &s.tags,
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            let mut table = new_table();
            table.set_header(vec!["Name", "Heading", "Assertions", "Steps", "Tags"]);
            for row in &rows {
                table.add_row(vec![
                    row.name.to_string(),
                    row.heading.to_string(),
                    row.planned_assertions.to_string(),
                    row.steps.to_string(),
                    row.tags.join(", "),
                ]);
            }
            println!("{table}");
        }
    }
}

/// Print success message
pub fn print_success(message: &str) {
    println!("✅ {}", message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("❌ {}", message);
}
