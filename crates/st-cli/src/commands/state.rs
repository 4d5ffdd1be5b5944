//! State command implementation (init, show, plan, apply)

use anyhow::Result;
use std::io::{BufRead, Write};

use st_core::{ApplyMode, ApplyOutcome, Planner, Settings, StateStore};

use crate::cli::{GlobalArgs, StateCommands, StateEnvArgs};
use crate::commands::common::{load_corpus, LoadedCorpus};
use crate::commands::generate::resolve_against_root;

/// Execute a state subcommand.
pub fn execute(command: &StateCommands, global: &GlobalArgs) -> Result<()> {
    match command {
        StateCommands::Init(args) => init(&settings_for(args, ApplyMode::Auto, global)),
        StateCommands::Show(args) => show(&settings_for(args, ApplyMode::DryRun, global)),
        StateCommands::Plan(args) => plan(&settings_for(args, ApplyMode::DryRun, global)),
        StateCommands::Apply(args) => {
            let settings = settings_for(&args.env, args.mode.into(), global);
            apply(&settings)
        }
    }
}

/// The frozen per-invocation record for a state operation.
fn settings_for(args: &StateEnvArgs, mode: ApplyMode, global: &GlobalArgs) -> Settings {
    Settings {
        env: args.env.clone(),
        mode,
        state_dir: resolve_against_root(&global.root, &args.state_dir),
        ..Settings::new(global.root.clone())
    }
}

fn store(settings: &Settings) -> StateStore {
    StateStore::new(settings.state_dir.clone())
}

fn init(settings: &Settings) -> Result<()> {
    let corpus = load_corpus(&settings.root, false)?;
    let snapshot = planner(&corpus, settings).init(&settings.env)?;
    println!(
        "Initialized state for '{}' with {} model(s)",
        settings.env,
        snapshot.models.len()
    );
    Ok(())
}

fn planner<'a>(corpus: &'a LoadedCorpus, settings: &Settings) -> Planner<'a> {
    Planner::new(&corpus.models, &corpus.dag, store(settings))
}

fn show(settings: &Settings) -> Result<()> {
    match store(settings).load(&settings.env)? {
        Some(snapshot) => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        None => println!("No snapshot for environment '{}'", settings.env),
    }
    Ok(())
}

fn plan(settings: &Settings) -> Result<()> {
    let corpus = load_corpus(&settings.root, false)?;
    let plan = planner(&corpus, settings).plan(&settings.env)?;
    println!("{}", plan.format_tree());
    Ok(())
}

fn apply(settings: &Settings) -> Result<()> {
    let corpus = load_corpus(&settings.root, false)?;
    let planner = planner(&corpus, settings);

    match planner.apply(&settings.env, settings.mode, false)? {
        ApplyOutcome::DryRun(plan) => {
            println!("{}", plan.format_tree());
            println!("\nDry run: snapshot not written.");
        }
        ApplyOutcome::Applied(plan) => {
            println!("{}", plan.format_tree());
            println!("\nSnapshot written for '{}'.", settings.env);
        }
        ApplyOutcome::NeedsConfirmation(plan) => {
            println!("{}", plan.format_tree());
            if plan.is_empty() {
                println!("\nNothing to apply.");
                return Ok(());
            }
            if confirm_from_stdin()? {
                match planner.apply(&settings.env, settings.mode, true)? {
                    ApplyOutcome::Applied(_) => {
                        println!("Snapshot written for '{}'.", settings.env)
                    }
                    _ => unreachable!("confirmed apply either writes or errors"),
                }
            } else {
                println!("Aborted: snapshot not written.");
            }
        }
    }
    Ok(())
}

/// Ask the operator to confirm on stdin.
fn confirm_from_stdin() -> Result<bool> {
    print!("Apply these changes? [y/N] ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let answer = line.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}
