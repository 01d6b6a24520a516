//! sprint-team - Register or join a Code Sprint team

use clap::{Parser, Subcommand};
use libsprint::logging::config_from_env;
use libsprint::{Result, SprintError, SprintService, TeamIdentity};
use serde_json::json;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "sprint-team")]
#[command(version, about = "Register or join a Code Sprint team and view the leaderboard")]
#[command(long_about = r#"Register or join a Code Sprint team and view the leaderboard.

The team identity is saved in the session store, where sprint-submit and
sprint-tui pick it up.

EXAMPLES:
    sprint-team register "Speedsters"
    sprint-team join "Speedsters"
    sprint-team whoami
    sprint-team --format json leaderboard
    sprint-team logout

EXIT CODES:
    0 - Success
    1 - Error (backend unreachable, store unreadable, etc.)
    2 - Rejected by the backend (name taken, unknown team)
    3 - Invalid input (empty name, no team registered)
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
    /// Create a new team
    Register {
        /// Team name
        name: String,
    },

    /// Join an existing team
    Join {
        /// Team name
        name: String,
    },

    /// Show the saved team
    Whoami,

    /// Show every team's fastest time
    Leaderboard,

    /// Forget the saved team
    Logout,
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
    let team = service.team();
    let json = cli.format == "json";

    match cli.command {
        Command::Register { name } => {
            let identity = team.register(&name).await?;
            print_identity(&identity, json, "created successfully");
        }
        Command::Join { name } => {
            let identity = team.join(&name).await?;
            print_identity(&identity, json, "joined successfully");
        }
        Command::Whoami => {
            let identity = team.current()?.ok_or(SprintError::MissingTeamIdentity)?;
            if json {
                print_json(&json!({ "team_name": identity.team_name, "team_id": identity.team_id }));
            } else if identity.team_name.is_empty() {
                println!("Team #{}", identity.team_id);
            } else {
                println!("{} (#{})", identity.team_name, identity.team_id);
            }
        }
        Command::Leaderboard => {
            let entries = team.leaderboard().await?;
            if json {
                let rows: Vec<_> = entries
                    .iter()
                    .map(|entry| json!({ "team_name": entry.team_name, "fastest_time": entry.fastest_time }))
                    .collect();
                print_json(&serde_json::Value::Array(rows));
            } else if entries.is_empty() {
                println!("No submissions yet.");
            } else {
                let current = team.current()?.map(|identity| identity.team_name);
                for (rank, entry) in entries.iter().enumerate() {
                    let marker = if current.as_deref() == Some(entry.team_name.as_str()) { "*" } else { " " };
                    println!("{}{:>3}. {:<24} {} s", marker, rank + 1, entry.team_name, entry.fastest_time);
                }
            }
        }
        Command::Logout => {
            let had_team = team.current()?.is_some();
            team.forget()?;
            info!("Logged out (had team: {})", had_team);
            if json {
                print_json(&json!({ "logged_out": had_team }));
            } else if had_team {
                println!("Team identity removed.");
            } else {
                println!("No team was saved.");
            }
        }
    }

    Ok(())
}

fn print_identity(identity: &TeamIdentity, json: bool, verb: &str) {
    if json {
        print_json(&json!({ "team_name": identity.team_name, "team_id": identity.team_id }));
    } else {
        println!("Team '{}' {} (ID {})", identity.team_name, verb, identity.team_id);
    }
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Failed to format output: {}", e),
    }
}
