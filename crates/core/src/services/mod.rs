//! Services that tie the core pieces into end-to-end pipelines.

pub mod check;
