//! sprint-submit - Submit a Code Sprint solution from the command line

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use libsprint::logging::config_from_env;
use libsprint::service::submission::{RefreshOutcome, ResetConfirmation, SubmitOutcome};
use libsprint::{BackendError, BestTime, Result, SprintError, SprintService, SubmissionResult};
use serde_json::json;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "sprint-submit")]
#[command(version, about = "Submit a Code Sprint solution and query the team's best time")]
#[command(long_about = r#"Submit a Code Sprint solution and query the team's best time.

EXAMPLES:
    # Submit the code saved by the editor
    sprint-submit submit

    # Submit a file, or stdin with "-"
    sprint-submit submit solution.py
    cat solution.py | sprint-submit submit -

    # Save the rendered path image
    sprint-submit submit --image-out path.png

    # Team's fastest time, as JSON
    sprint-submit --format json best-time

    # Print the saved code, or reset it to the template
    sprint-submit code
    sprint-submit reset --confirm

EXIT CODES:
    0 - Success
    1 - Error (backend unreachable, store unreadable, etc.)
    2 - Submission rejected by the backend
    3 - Invalid input (no team registered, missing --confirm, etc.)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Output format
    #[arg(short, long, global = true, default_value = "text", value_name = "FORMAT")]
    #[arg(value_parser = ["text", "json"])]
    format: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit code for evaluation
    Submit {
        /// File to submit ("-" reads stdin); defaults to the saved code
        file: Option<PathBuf>,

        /// Write the rendered image to this path
        #[arg(long, value_name = "PATH")]
        image_out: Option<PathBuf>,
    },

    /// Show the team's fastest recorded time
    BestTime,

    /// Print the saved code
    Code,

    /// Replace the saved code with the template
    Reset {
        /// Required; resetting discards the saved code
        #[arg(long)]
        confirm: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    config_from_env(cli.verbose).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e.display_message());
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let service = SprintService::new()?;
    let json = cli.format == "json";

    match cli.command {
        Command::Submit { file, image_out } => submit(&service, file.as_deref(), image_out.as_deref(), json).await,
        Command::BestTime => best_time(&service, json).await,
        Command::Code => {
            let code = service.controller().code();
            if json {
                let is_template = code == service.controller().template();
                print_json(&json!({ "code": code, "is_template": is_template }));
            } else {
                print!("{}", code);
                if !code.ends_with('\n') {
                    println!();
                }
            }
            Ok(())
        }
        Command::Reset { confirm } => {
            if !confirm {
                return Err(SprintError::InvalidInput(
                    "Resetting discards the saved code; pass --confirm to proceed".to_string(),
                ));
            }
            let mut confirmation = ResetConfirmation::default();
            confirmation.arm();
            service.controller().reset_to_template(&mut confirmation)?;
            if json {
                print_json(&json!({ "reset": true }));
            } else {
                println!("Code reset successfully!");
            }
            Ok(())
        }
    }
}

async fn submit(service: &SprintService, file: Option<&Path>, image_out: Option<&Path>, json: bool) -> Result<()> {
    let team_id = service.team().require_team_id()?;
    let code = match file {
        Some(path) => read_source(path)?,
        None => service.controller().code(),
    };

    debug!("Submitting {} chars for team {}", code.chars().count(), team_id);
    let outcome = service.controller().submit(&team_id, &code).await?;
    let best = service.controller().best_time();

    match outcome {
        SubmitOutcome::Succeeded(result) => {
            if let Some(path) = image_out {
                write_image(&result, path)?;
            }
            if json {
                print_json(&json!({
                    "status": "succeeded",
                    "elapsed_seconds": result.elapsed_seconds,
                    "image_produced": result.image.is_produced(),
                    "output": result.output,
                    "best_time": best.seconds(),
                }));
            } else {
                print_result(&result, best);
            }
            Ok(())
        }
        SubmitOutcome::Failed(message) => {
            if json {
                print_json(&json!({
                    "status": "failed",
                    "message": message,
                    "best_time": best.seconds(),
                }));
            }
            Err(BackendError::Rejected(message).into())
        }
        SubmitOutcome::TriggerDisabled => Err(SprintError::InvalidInput(
            "A submission is already running".to_string(),
        )),
    }
}

async fn best_time(service: &SprintService, json: bool) -> Result<()> {
    let team_id = service.team().require_team_id()?;
    let best = match service.controller().refresh_best_time(&team_id).await? {
        RefreshOutcome::Updated(best) => best,
        RefreshOutcome::Skipped => service.controller().best_time(),
    };

    if json {
        print_json(&json!({ "team_id": team_id, "best_time": best.seconds() }));
    } else {
        match best {
            BestTime::Seconds(seconds) => println!("Best time: {} seconds", seconds),
            BestTime::Unset => println!("No submissions yet for this team."),
        }
    }
    Ok(())
}

fn read_source(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut code = String::new();
        std::io::stdin()
            .read_to_string(&mut code)
            .map_err(|e| SprintError::InvalidInput(format!("Failed to read stdin: {}", e)))?;
        return Ok(code);
    }
    std::fs::read_to_string(path)
        .map_err(|e| SprintError::InvalidInput(format!("Failed to read {}: {}", path.display(), e)))
}

fn write_image(result: &SubmissionResult, path: &Path) -> Result<()> {
    if result.no_image_produced() {
        eprintln!("No image generated!");
        return Ok(());
    }
    let bytes = result.image.decode()?;
    std::fs::write(path, &bytes)
        .map_err(|e| SprintError::InvalidInput(format!("Failed to write {}: {}", path.display(), e)))?;
    debug!("Wrote {} image bytes to {}", bytes.len(), path.display());
    Ok(())
}

fn print_result(result: &SubmissionResult, best: BestTime) {
    println!("Code ran in {} seconds", result.elapsed_seconds);
    if result.no_image_produced() {
        println!("No image generated!");
    }
    match best {
        BestTime::Seconds(seconds) => println!("Best time: {} seconds", seconds),
        BestTime::Unset => println!("Best time: -"),
    }
    if let Some(output) = result.output.as_deref().filter(|o| !o.is_empty()) {
        println!();
        println!("{}", output.trim_end());
    }
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Failed to format output: {}", e),
    }
}
