use clap::Parser;

mod args;
mod cmd;
mod commands;
mod exit_codes;
mod logging;
mod output;

pub use args::*;
use commands::Command;

#[derive(Debug, Parser)]
#[command(name = "donburi", version, about = "Declarative task-orchestration engine")]
struct Cli {
    #[command(flatten)]
    log: LogArgs,
    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to create tokio runtime: {e}");
            std::process::exit(exit_codes::RUNTIME_ERROR);
        }
    };

    let exit_code = rt.block_on(run_command(cli.command));
    std::process::exit(exit_code);
}

async fn run_command(command: Command) -> i32 {
    match command {
        Command::Validate {
            path,
            strict,
            output,
        } => cmd::validate::validate_cmd(&path, strict, output).await,
        Command::Inspect { path, output } => cmd::inspect::inspect_cmd(&path, output).await,
        Command::Actions { host, output } => cmd::actions::actions_cmd(host, output).await,
        Command::Run {
            path,
            event,
            context,
            set_vars,
            events,
            metrics,
            engine,
            host,
            output,
        } => {
            cmd::run::run_cmd(cmd::run::RunRequest {
                path: &path,
                event: &event,
                context_path: context.as_deref(),
                set_vars: &set_vars,
                events,
                metrics,
                engine,
                host,
                output,
            })
            .await
        }
    }
}
