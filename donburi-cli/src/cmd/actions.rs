use std::sync::Arc;

use donburi_store::MemoryStore;
use serde::Serialize;

use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::{HostArgs, OutputArgs};

use super::config::build_registry;

#[derive(Serialize)]
struct ActionInfo {
    name: String,
    templated: bool,
}

pub async fn actions_cmd(host: HostArgs, output: OutputArgs) -> i32 {
    let registry = match build_registry(&host, Arc::new(MemoryStore::new())) {
        Ok(r) => r,
        Err(e) => {
            print_error(output.format, output.quiet, &e);
            return exit_codes::RUNTIME_ERROR;
        }
    };

    let actions: Vec<ActionInfo> = registry
        .names()
        .filter_map(|name| {
            registry.get(name).map(|a| ActionInfo {
                name: name.to_string(),
                templated: a.templated(),
            })
        })
        .collect();

    if output.format == OutputFormat::Text && !output.quiet {
        for a in &actions {
            let note = if a.templated { "" } else { " (raw)" };
            println!("{}{note}", a.name);
        }
    } else {
        print_result(output.format, output.quiet, &actions);
    }
    exit_codes::SUCCESS
}
