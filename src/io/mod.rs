//! Input/output helpers.
//!
//! - spreadsheet/CSV bytes → string grids (`sheet`)
//! - user upload converters (`upload`) and country-code lookup (`countries`)
//! - CSV exports (`export`)

pub mod countries;
pub mod export;
pub mod sheet;
pub mod upload;

pub use export::*;
pub use upload::{Deployment, Installation, InstallationUpload, RowError, load_deployments, load_installations, top_deployments};
