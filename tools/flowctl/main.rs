use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use switchyard::prelude::*;
use tracing_subscriber::EnvFilter;

/// Edit, validate and route flow snapshots from the command line
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply a JSON array of operations to a flow's draft and save the result
    Apply {
        /// Snapshot to edit; created as a new flow if it does not exist
        snapshot: PathBuf,
        /// JSON file holding an array of `{"type": ..., "request": ...}` operations
        operations: PathBuf,
        /// Where to write the edited snapshot (defaults to overwriting the input)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Display name for a newly created flow
        #[arg(long, default_value = "Untitled")]
        name: String,
    },
    /// Route a router step against a JSON context and print the decision
    Route {
        snapshot: PathBuf,
        /// Name of the router step
        step: String,
        /// JSON file holding the resolution context, e.g. `{"trigger": {...}}`
        context: PathBuf,
        /// Id of the version to route on (defaults to the draft)
        #[arg(long)]
        at: Option<u64>,
    },
    /// Print validation issues of every version in a snapshot
    Validate { snapshot: PathBuf },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Apply {
            snapshot,
            operations,
            out,
            name,
        } => run_apply(&snapshot, &operations, out.as_deref(), &name),
        Command::Route {
            snapshot,
            step,
            context,
            at,
        } => run_route(&snapshot, &step, &context, at.map(VersionId)),
        Command::Validate { snapshot } => run_validate(&snapshot),
    };

    if let Err(e) = outcome {
        exit_with_error(&e.to_string());
    }
}

fn run_apply(
    snapshot_path: &Path,
    operations_path: &Path,
    out: Option<&Path>,
    name: &str,
) -> Result<()> {
    let mut editor = if snapshot_path.exists() {
        FlowEditor::from_snapshot(FlowSnapshot::from_file(&path_str(snapshot_path))?)?
    } else {
        println!("Snapshot '{}' not found; starting a new flow.", snapshot_path.display());
        FlowEditor::builder(MemoryStore::new())
            .display_name(name)
            .build()?
    };
    editor.subscribe(|event| {
        if !event.removed_steps.is_empty() {
            println!("  removed: {}", event.removed_steps.join(", "));
        }
    });

    let operations_json = fs::read_to_string(operations_path)?;
    let operations: Vec<FlowOperation> = serde_json::from_str(&operations_json)?;

    for (index, operation) in operations.iter().enumerate() {
        print!("[{}] {} ... ", index + 1, operation.kind());
        match editor.apply(operation) {
            Ok(version) => println!("ok ({}, valid: {})", version.id(), version.is_valid()),
            Err(e) => {
                println!("rejected");
                return Err(format!("operation {} ({}) failed: {}", index + 1, operation.kind(), e).into());
            }
        }
    }

    let draft = editor.draft();
    println!(
        "\nDraft {} of {}: {} steps, valid: {}",
        draft.id(),
        editor.flow().id(),
        draft.steps().len(),
        draft.is_valid()
    );

    let target = out.unwrap_or(snapshot_path);
    editor.snapshot().save(&path_str(target))?;
    println!("Saved snapshot to '{}'.", target.display());
    Ok(())
}

fn run_route(
    snapshot_path: &Path,
    step: &str,
    context_path: &Path,
    version: Option<VersionId>,
) -> Result<()> {
    let snapshot = FlowSnapshot::from_file(&path_str(snapshot_path))?;
    let version_id = version.unwrap_or(snapshot.flow.draft_version_id());
    let flow_version = snapshot
        .version(version_id)
        .ok_or(StructuralError::VersionNotFound { id: version_id })?;
    let router = flow_version
        .get_step(step)
        .ok_or_else(|| StructuralError::StepNotFound {
            name: step.to_string(),
        })?
        .settings
        .as_router()
        .ok_or_else(|| format!("step '{}' is not a router", step))?;

    let context: serde_json::Value = serde_json::from_str(&fs::read_to_string(context_path)?)?;
    let decision = route(router, &ContextResolver::new(context))?;

    println!("Router '{}' on {} ({:?}):", step, version_id, router.execution_type);
    for trace in &decision.branches {
        let marker = if decision.selected.contains(&trace.index) {
            "->"
        } else {
            "  "
        };
        println!(
            "{} [{}] {}: {}",
            marker,
            trace.index,
            trace.branch_name,
            TraceFormatter::format_branch(trace)
        );
    }
    if decision.selected.is_empty() {
        println!("-> No branch was selected.");
    }
    Ok(())
}

fn run_validate(snapshot_path: &Path) -> Result<()> {
    let snapshot = FlowSnapshot::from_file(&path_str(snapshot_path))?;
    let editor = FlowEditor::from_snapshot(snapshot)?;
    let mut invalid = 0;

    for id in editor.flow().versions() {
        let Some(version) = editor.version(*id) else {
            continue;
        };
        let issues = version.validation_issues();
        println!(
            "{} [{:?}] {}",
            version.id(),
            version.state(),
            if issues.is_empty() { "valid" } else { "invalid" }
        );
        for issue in &issues {
            println!("    {}", issue);
        }
        if !issues.is_empty() {
            invalid += 1;
        }
    }

    if invalid > 0 {
        return Err(format!("{} version(s) are invalid", invalid).into());
    }
    Ok(())
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
