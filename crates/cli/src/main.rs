use anyhow::Result;
use clap::{Parser, Subcommand};
use native_surface::commands::*;
use native_surface::logging::{init_logging, LogFormat};

/// Registry and consistency checks for the managed entry points native code calls.
///
/// This CLI is a thin wrapper around `surface-core` (exposed in code as `surface_core`).
/// All substantive logic lives in the library so it can be tested thoroughly
/// and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "native-surface",
    version,
    about = "Track and verify the native-callable surface of managed code",
    long_about = None
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format on stderr.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new project at the given root.
    ///
    /// This will:
    /// - Create a `.surface` metadata directory with `project.json` and the database.
    /// - Create `metadata`, `manifests`, and `reports` directories.
    InitProject {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Optional project name. If omitted, the name is derived from the root directory.
        #[arg(long)]
        name: Option<String>,
    },

    /// Show basic information about an existing project.
    ProjectInfo {
        #[arg(long, default_value = ".")]
        root: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Scan a metadata document and list its native-callable symbols.
    Scan {
        #[arg(long, default_value = ".")]
        root: String,

        /// Metadata document (JSON or YAML). Defaults to `metadata` in the project config.
        #[arg(long)]
        metadata: Option<String>,

        #[arg(long, default_value_t = false)]
        json: bool,

        /// Scan types in parallel.
        #[arg(long, default_value_t = false)]
        parallel: bool,
    },

    /// Scan, build the registry, and verify it. Exits non-zero on any violation.
    Check {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        metadata: Option<String>,

        /// Expected manifest from the native layer. Defaults to `manifest` in the project config.
        #[arg(long)]
        manifest: Option<String>,

        /// Treat any overloaded native-callable member as a collision.
        #[arg(long, default_value_t = false)]
        forbid_overloads: bool,

        /// Also store the scanned surface as a snapshot with this label.
        #[arg(long)]
        save_snapshot: Option<String>,

        #[arg(long, default_value_t = false)]
        parallel: bool,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Scan the metadata and store the surface under a label.
    SnapshotSave {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        label: String,

        #[arg(long)]
        metadata: Option<String>,
    },

    /// List stored snapshots.
    SnapshotList {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show the descriptors of one snapshot.
    SnapshotShow {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        label: String,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Write a snapshot to a JSON file.
    SnapshotExport {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        label: String,

        /// Output path; relative paths resolve against the project root.
        #[arg(long)]
        out: String,
    },

    /// Verify a stored snapshot without rescanning.
    SnapshotVerify {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        label: String,

        #[arg(long)]
        manifest: Option<String>,

        #[arg(long, default_value_t = false)]
        forbid_overloads: bool,
    },

    /// Compare a snapshot against another snapshot or the current metadata.
    Diff {
        #[arg(long, default_value = ".")]
        root: String,

        /// Baseline snapshot label.
        #[arg(long)]
        old: String,

        /// Snapshot to compare against. If omitted, the metadata is scanned.
        #[arg(long, conflicts_with = "metadata")]
        new: Option<String>,

        #[arg(long)]
        metadata: Option<String>,

        #[arg(long, default_value_t = false)]
        json: bool,

        /// Exit non-zero when symbols were removed or changed.
        #[arg(long, default_value_t = false)]
        fail_on_breaking: bool,
    },

    /// List recorded check runs.
    ListRuns {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_format);

    match cli.command {
        Command::InitProject { root, name } => init_project_command(&root, name)?,
        Command::ProjectInfo { root, json } => project_info_command(&root, json)?,
        Command::Scan { root, metadata, json, parallel } => {
            scan_command(&root, metadata.as_deref(), json, parallel)?
        }
        Command::Check {
            root,
            metadata,
            manifest,
            forbid_overloads,
            save_snapshot,
            parallel,
            json,
        } => {
            let args =
                CheckArgs { metadata, manifest, forbid_overloads, save_snapshot, parallel, json };
            check_command(&root, &args)?
        }
        Command::SnapshotSave { root, label, metadata } => {
            snapshot_save_command(&root, &label, metadata.as_deref())?
        }
        Command::SnapshotList { root, json } => snapshot_list_command(&root, json)?,
        Command::SnapshotShow { root, label, json } => snapshot_show_command(&root, &label, json)?,
        Command::SnapshotExport { root, label, out } => {
            snapshot_export_command(&root, &label, &out)?
        }
        Command::SnapshotVerify { root, label, manifest, forbid_overloads } => {
            snapshot_verify_command(&root, &label, manifest.as_deref(), forbid_overloads)?
        }
        Command::Diff { root, old, new, metadata, json, fail_on_breaking } => diff_command(
            &root,
            &old,
            new.as_deref(),
            metadata.as_deref(),
            json,
            fail_on_breaking,
        )?,
        Command::ListRuns { root, json } => list_runs_command(&root, json)?,
    }

    Ok(())
}
