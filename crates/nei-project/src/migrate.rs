//! Run-definition version migration.

use crate::ProjectError;
use crate::schema::RunDef;

pub const LATEST_VERSION: u32 = 1;

pub fn migrate_to_latest(mut run: RunDef) -> Result<RunDef, ProjectError> {
    while run.version < LATEST_VERSION {
        run = migrate_one_version(run)?;
    }
    Ok(run)
}

fn migrate_one_version(run: RunDef) -> Result<RunDef, ProjectError> {
    match run.version {
        0 => migrate_v0_to_v1(run),
        v => Err(ProjectError::Migration {
            what: format!("No migration path from version {}", v),
        }),
    }
}

/// Unversioned files carry the same fields as version 1.
fn migrate_v0_to_v1(mut run: RunDef) -> Result<RunDef, ProjectError> {
    run.version = 1;
    Ok(run)
}
