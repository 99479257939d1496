//! Run-definition schema.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunDef {
    #[serde(default)]
    pub version: u32,
    pub name: String,
    pub elements: Vec<ElementDef>,
    pub temperature: ProfileDef,
    pub density_scale: ProfileDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_max: Option<f64>,
    pub dt: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tol: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_tol: Option<f64>,
    #[serde(default)]
    pub rates: RateSourceDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementDef {
    /// Symbol, name or atomic number as text ("O", "oxygen", "8").
    pub element: String,
    /// Number density relative to hydrogen.
    pub abundance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_fractions: Option<Vec<f64>>,
}

/// Electron temperature (K) or hydrogen density (cm^-3) over time (s).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ProfileDef {
    Constant { value: f64 },
    Sampled { times: Vec<f64>, values: Vec<f64> },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum RateSourceDef {
    Hydrogenic {
        #[serde(default = "default_log_t_min")]
        log_t_min: f64,
        #[serde(default = "default_log_t_max")]
        log_t_max: f64,
        #[serde(default = "default_nodes")]
        nodes: usize,
    },
    /// JSON catalog, relative paths resolved against the run file.
    Catalog { path: String },
}

impl Default for RateSourceDef {
    fn default() -> Self {
        RateSourceDef::Hydrogenic {
            log_t_min: default_log_t_min(),
            log_t_max: default_log_t_max(),
            nodes: default_nodes(),
        }
    }
}

fn default_log_t_min() -> f64 {
    4.0
}

fn default_log_t_max() -> f64 {
    9.0
}

fn default_nodes() -> usize {
    501
}
