use std::path::Path;

use donburi_core::summary::count_placeholders;
use donburi_core::{DocumentSummary, ListSummary, Task};
use serde::Serialize;

use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::OutputArgs;

use super::config::{parse_document, read_file};

#[derive(Serialize)]
struct InspectResult {
    #[serde(flatten)]
    summary: DocumentSummary,
    placeholders: usize,
}

fn placeholders(tasks: &[Task]) -> usize {
    tasks
        .iter()
        .flat_map(|t| t.actions.values())
        .map(count_placeholders)
        .sum()
}

fn print_list(name: &str, list: &ListSummary) {
    println!("{name}: {} top-level, {} total, depth {}", list.top_level, list.total, list.max_depth);
    if list.total == 0 {
        return;
    }
    println!(
        "  guarded: {}, iterated: {}, retried: {}",
        list.guarded, list.iterated, list.retried
    );
    for (action, count) in &list.actions {
        println!("  - {action} x{count}");
    }
    if !list.registers.is_empty() {
        let names: Vec<&str> = list.registers.iter().map(String::as_str).collect();
        println!("  registers: {}", names.join(", "));
    }
}

pub async fn inspect_cmd(path: &Path, output: OutputArgs) -> i32 {
    let Some(content) = read_file(path, &output) else {
        return exit_codes::RUNTIME_ERROR;
    };

    let document = match parse_document(&content, path) {
        Ok(d) => d,
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            return exit_codes::VALIDATION_FAILED;
        }
    };

    let result = InspectResult {
        summary: DocumentSummary::of(&document),
        placeholders: placeholders(&document.tasks) + placeholders(&document.db_tasks),
    };

    if output.format == OutputFormat::Text && !output.quiet {
        print_list("tasks", &result.summary.tasks);
        print_list("db_tasks", &result.summary.db_tasks);
        println!("placeholders: {}", result.placeholders);
    } else {
        print_result(output.format, output.quiet, &result);
    }

    exit_codes::SUCCESS
}
