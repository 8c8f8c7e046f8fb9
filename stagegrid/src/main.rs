mod script;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use stagegrid_core::{
    logging, Config, RoomSession, Stage, StageController, StageSnapshot, StageView,
};
use std::path::PathBuf;
use tracing::{error, info};

use script::{load_script, ScriptStep};

#[derive(Parser, Debug)]
#[command(name = "stagegrid")]
#[command(about = "Replay a session script and print the stage after each step", long_about = None)]
struct Args {
    /// Session script (JSON)
    #[arg(long, env = "STAGEGRID_SCRIPT")]
    script: PathBuf,

    /// Configuration file (YAML, TOML or JSON)
    #[arg(long, env = "STAGEGRID_CONFIG_PATH")]
    config: Option<String>,
}

/// One line of replay output
#[derive(Serialize)]
struct ReplayLine<'a> {
    step: usize,
    action: &'a str,
    revision: u64,
    #[serde(flatten)]
    view: StageView,
}

fn print_line(
    step: usize,
    action: &str,
    session: &RoomSession,
    snapshot: &StageSnapshot,
) -> Result<()> {
    let line = ReplayLine {
        step,
        action,
        revision: snapshot.revision,
        view: StageView::for_session(session, snapshot),
    };
    println!("{}", serde_json::to_string(&line)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Load and validate configuration
    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Err(errors) = config.validate() {
        for e in &errors {
            eprintln!("Config validation error: {e}");
        }
        return Err(anyhow::anyhow!(
            "Configuration validation failed with {} error(s)",
            errors.len()
        ));
    }

    // 2. Initialize logging
    logging::init_logging(&config.logging)?;
    info!(
        max_visible = config.stage.max_visible,
        promotion = ?config.stage.promotion,
        "Stagegrid replay starting"
    );

    // 3. Load the script
    let script = load_script(&args.script)
        .with_context(|| format!("Failed to load script {}", args.script.display()))?;
    info!(room = %script.room, steps = script.steps.len(), "Script loaded");

    // 4. Attach a stage controller to a fresh session
    let session =
        RoomSession::new(script.room.clone(), script.local.into_local(), &config.session)?;
    let mut controller = StageController::spawn(session.clone(), Stage::new(&config.stage));
    print_line(0, "start", &session, &controller.snapshot())?;

    // 5. Replay
    let mut published = 0u64;
    for (index, step) in script.steps.into_iter().enumerate() {
        let action = step.action();
        let terminal = matches!(step, ScriptStep::Close);

        if step.apply(&session) {
            published += 1;
            if !controller.wait_for_processed(published).await {
                error!(step = index + 1, "Stage controller stopped early");
                break;
            }
        }
        print_line(index + 1, action, &session, &controller.snapshot())?;

        if terminal {
            break;
        }
    }

    if !session.is_closed() {
        session.close();
    }
    controller.join().await;

    info!("Stagegrid replay finished");
    Ok(())
}
