use std::path::Path;

use donburi_core::{parse_document_str, validate_document_with, DocumentFormat, ValidateOptions};
use donburi_exec::actions::builtin_registry;
use serde::Serialize;

use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::OutputArgs;

use super::config::read_file;

/// Every action a fully configured `run` can dispatch to.
const HOST_ACTIONS: [&str; 8] = ["list", "fetch", "resource", "update", "delete", "http", "heat", "rest"];

#[derive(Serialize)]
struct ValidateResult {
    valid: bool,
    format: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

pub async fn validate_cmd(path: &Path, strict: bool, output: OutputArgs) -> i32 {
    let Some(content) = read_file(path, &output) else {
        return exit_codes::RUNTIME_ERROR;
    };

    let parsed = match parse_document_str(&content, DocumentFormat::from_path(path)) {
        Ok(p) => p,
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            return exit_codes::VALIDATION_FAILED;
        }
    };

    let options = if strict {
        let builtins = builtin_registry();
        ValidateOptions::with_known_actions(builtins.names().chain(HOST_ACTIONS)).strict()
    } else {
        ValidateOptions::default()
    };

    let format = format!("{:?}", parsed.format);
    match validate_document_with(&parsed.document, &options) {
        Ok(()) => {
            if output.format == OutputFormat::Text && !output.quiet {
                println!("ok: valid task document ({format})");
            } else {
                let result = ValidateResult {
                    valid: true,
                    format,
                    errors: vec![],
                };
                print_result(output.format, output.quiet, &result);
            }
            exit_codes::SUCCESS
        }
        Err(err) => {
            let errors: Vec<String> = err
                .violations
                .iter()
                .map(|v| format!("{}: {}", v.path, v.message))
                .collect();
            if output.format == OutputFormat::Text && !output.quiet {
                eprintln!("error: validation failed");
                for e in &errors {
                    eprintln!("- {e}");
                }
            } else {
                let result = ValidateResult {
                    valid: false,
                    format,
                    errors,
                };
                print_result(output.format, output.quiet, &result);
            }
            exit_codes::VALIDATION_FAILED
        }
    }
}
