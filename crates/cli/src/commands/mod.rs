pub mod check;
pub mod diff;
pub mod project;
pub mod runs;
pub mod scan;
pub mod snapshots;
pub mod util;

pub use check::*;
pub use diff::*;
pub use project::*;
pub use runs::*;
pub use scan::*;
pub use snapshots::*;
pub use util::*;
