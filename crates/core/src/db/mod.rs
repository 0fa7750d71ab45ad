//! Project store: on-disk layout, configuration, and the SQLite database that
//! keeps snapshots and check-run history between builds.
//!
//! - `ProjectConfig` / `DbConfig`: serializable project metadata.
//! - `ProjectLayout`: computed paths for project directories/files.
//! - `SurfaceDb`: a small SQLite wrapper with versioned migrations.
//! - `ProjectContext`: layout + config + open database.

mod config;
mod context;
mod layout;
mod models;
mod surface_db;
mod util;

pub use config::{DbConfig, ProjectConfig};
pub use context::ProjectContext;
pub use layout::ProjectLayout;
pub use models::{CheckRunRecord, CheckRunStatus, SnapshotRecord};
pub use surface_db::{DbError, DbResult, SurfaceDb, CURRENT_SCHEMA_VERSION};
pub use util::{load_project_config, open_project_db};
