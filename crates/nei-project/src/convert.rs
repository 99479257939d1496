//! Conversion from a validated [`RunDef`] to engine inputs.

use crate::schema::{ProfileDef, RateSourceDef, RunDef};
use crate::validate::resolve_element;
use crate::{ProjectResult, validate_run};
use nei_atomic::{HydrogenicRates, RateCatalog, RateSource};
use nei_sim::{Profile, RunConfig};
use std::path::Path;

fn profile(what: &'static str, def: &ProfileDef) -> ProjectResult<Profile> {
    Ok(match def {
        ProfileDef::Constant { value } => Profile::Constant(*value),
        ProfileDef::Sampled { times, values } => {
            Profile::sampled(what, times.clone(), values.clone()).map_err(nei_sim::SimError::from)?
        }
    })
}

/// Build the run configuration. Physical checks happen in `RunConfig::build`.
pub fn to_config(run: &RunDef) -> ProjectResult<RunConfig> {
    validate_run(run)?;
    let mut builder = RunConfig::builder()
        .temperature(profile("temperature", &run.temperature)?)
        .density_scale(profile("density_scale", &run.density_scale)?)
        .dt(run.dt);
    for def in &run.elements {
        let element = resolve_element(&def.element)?;
        builder = builder.element(element, def.abundance);
        if let Some(f) = &def.initial_fractions {
            builder = builder.initial_fractions(element, f.clone());
        }
    }
    if let Some(t) = run.time_start {
        builder = builder.time_start(t);
    }
    if let Some(t) = run.time_max {
        builder = builder.time_max(t);
    }
    if let Some(n) = run.max_steps {
        builder = builder.max_steps(n);
    }
    if let Some(tol) = run.tol {
        builder = builder.tol(tol);
    }
    if let Some(tol) = run.final_tol {
        builder = builder.final_tol(tol);
    }
    Ok(builder.build()?)
}

/// Open the rate source named by the run. Relative catalog paths are
/// resolved against `base_dir`.
pub fn rate_source(run: &RunDef, base_dir: &Path) -> ProjectResult<Box<dyn RateSource>> {
    let source: Box<dyn RateSource> = match &run.rates {
        RateSourceDef::Hydrogenic {
            log_t_min,
            log_t_max,
            nodes,
        } => Box::new(HydrogenicRates::with_log_grid(*log_t_min, *log_t_max, *nodes)),
        RateSourceDef::Catalog { path } => {
            let path = Path::new(path);
            let full = if path.is_relative() {
                base_dir.join(path)
            } else {
                path.to_path_buf()
            };
            Box::new(RateCatalog::from_json_file(&full)?)
        }
    };
    Ok(source)
}
