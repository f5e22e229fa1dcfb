use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::warn;

use lh_app::{
    AppResult, PlanOptions, consolidate_project, export_picklists, list_plates, load_export,
    load_project, modified_files, plan_project, validate_project,
};

#[derive(Parser)]
#[command(name = "lh-cli")]
#[command(about = "Liquid-handling transfer planner for acoustic dispensers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate project file syntax and structure
    Validate {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
    },
    /// List plates in a project
    Plates {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
    },
    /// Pool low-volume reagents into mastermixes and show the recipes
    Consolidate {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
        /// Shuffle seed; replaces the project's seed
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Plan all transfers and write picklists
    Plan {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
        /// Output directory for picklists (defaults to a summary only)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// One picklist per source plate type instead of per source plate
        #[arg(long)]
        merge_plate_types: bool,
        /// Shuffle seed; replaces the project's seed
        #[arg(long)]
        seed: Option<u64>,
        /// Plan from raw sources even when a mastermix is configured
        #[arg(long)]
        no_mastermix: bool,
    },
    /// Check exported picklists against their manifest
    Verify {
        /// Directory written by `plan --out`
        out_dir: PathBuf,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Plates { project_path } => cmd_plates(&project_path),
        Commands::Consolidate { project_path, seed } => cmd_consolidate(&project_path, seed),
        Commands::Plan {
            project_path,
            out,
            merge_plate_types,
            seed,
            no_mastermix,
        } => cmd_plan(
            &project_path,
            out.as_deref(),
            merge_plate_types,
            PlanOptions { no_mastermix, seed },
        ),
        Commands::Verify { out_dir } => cmd_verify(&out_dir),
    }
}

fn cmd_validate(project_path: &Path) -> AppResult<()> {
    println!("Validating project: {}", project_path.display());
    let project = load_project(project_path)?;
    validate_project(&project)?;
    println!("✓ Project is valid");
    Ok(())
}

fn cmd_plates(project_path: &Path) -> AppResult<()> {
    let project = load_project(project_path)?;
    let plates = list_plates(&project)?;

    println!("Plates in project:");
    for plate in plates {
        println!(
            "  {} [{}] {} ({}x{}, {} wells used)",
            plate.name,
            plate.role.label(),
            plate.plate_type,
            plate.rows,
            plate.columns,
            plate.wells_used
        );
        if !plate.reagents.is_empty() {
            println!("    reagents: {}", plate.reagents.join(", "));
        }
    }
    Ok(())
}

fn cmd_consolidate(project_path: &Path, seed: Option<u64>) -> AppResult<()> {
    let project = load_project(project_path)?;
    let Some(consolidation) = consolidate_project(&project, seed)? else {
        println!("Project has no mastermix section");
        return Ok(());
    };

    if consolidation.is_empty() {
        println!("No reagent is below the minimum transfer volume");
        return Ok(());
    }

    println!(
        "✓ {} mastermix(es) after {} attempt(s)",
        consolidation.mastermixes.len(),
        consolidation.attempts
    );
    for mastermix in &consolidation.mastermixes {
        let (plate, well) = mastermix.location();
        println!(
            "  {} at {} {}: {:.3} uL per well into {} well(s)",
            mastermix.name(),
            plate,
            well,
            mastermix.per_well_volume(),
            mastermix.wells().len()
        );
    }
    for recipe in &consolidation.recipes {
        println!("Recipe plate {}:", recipe.name());
        for (well, entries) in recipe.content() {
            for entry in entries {
                println!("  {} {}: {:.3} uL", well, entry.reagent, entry.volume);
            }
        }
    }
    Ok(())
}

fn cmd_plan(
    project_path: &Path,
    out: Option<&Path>,
    merge_plate_types: bool,
    options: PlanOptions,
) -> AppResult<()> {
    let project = load_project(project_path)?;
    let response = plan_project(&project, &options)?;

    for warning in &response.warnings {
        warn!("{warning}");
    }
    if let Some(consolidation) = &response.consolidation {
        for mastermix in &consolidation.mastermixes {
            println!("  mastermix {}", mastermix.name());
        }
    }

    println!(
        "✓ Planned {} transfers in {} stage(s)",
        response.protocol.action_count(),
        response.stage_count()
    );
    for list in response.protocol.transfer_lists() {
        println!(
            "  {} ({}): {} transfers",
            list.source_plate(),
            list.source_plate_type(),
            list.len()
        );
    }

    if let Some(out_dir) = out {
        let merge = merge_plate_types || project.picklist.merge_plate_types;
        let manifest = export_picklists(&response.protocol, out_dir, merge)?;
        println!("✓ Wrote {} picklist(s) to {}", manifest.files.len(), out_dir.display());
        for file in &manifest.files {
            println!(
                "  {} - {} transfers, {} nL",
                file.file, file.transfers, file.total_volume_nl
            );
        }
    }
    Ok(())
}

fn cmd_verify(out_dir: &Path) -> AppResult<()> {
    let manifest = load_export(out_dir)?;
    let modified = modified_files(out_dir)?;
    if modified.is_empty() {
        println!("✓ {} picklist(s) match the manifest", manifest.files.len());
    } else {
        for file in &modified {
            println!("✗ {file} differs from the manifest");
        }
    }
    Ok(())
}
