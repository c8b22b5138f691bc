//! File-facing collaborators for the `mbook` binary: delimited-text loading
//! and result export. The engine itself lives in `matchbook-recon`.

pub mod export;
pub mod load;
