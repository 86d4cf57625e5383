//! Named parameter presets.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::config::bundle::{ConfigBundle, ProductSizeRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// General purpose PCR primers.
    Standard,
    /// Templates with high GC content (>60%).
    GcRich,
    /// AT-rich templates (<40% GC).
    GcPoor,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Standard, Preset::GcRich, Preset::GcPoor];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Standard => "standard",
            Preset::GcRich => "gc-rich",
            Preset::GcPoor => "gc-poor",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Preset::Standard => "General purpose PCR primers",
            Preset::GcRich => "Optimized for GC-rich templates",
            Preset::GcPoor => "Optimized for AT-rich templates",
        }
    }

    pub fn bundle(self) -> &'static ConfigBundle {
        match self {
            Preset::Standard => &STANDARD,
            Preset::GcRich => &GC_RICH,
            Preset::GcPoor => &GC_POOR,
        }
    }
}

pub const STANDARD: ConfigBundle = ConfigBundle::DEFAULT;

pub const GC_RICH: ConfigBundle = ConfigBundle {
    primer_opt_size: 22,
    primer_min_size: 20,
    primer_max_size: 27,
    primer_opt_tm: 62.0,
    primer_min_tm: 59.0,
    primer_max_tm: 65.0,
    primer_min_gc: 50.0,
    primer_max_gc: 70.0,
    primer_max_poly_x: 3,
    product_size_range: ProductSizeRange { min: 150, max: 800 },
    ..ConfigBundle::DEFAULT
};

pub const GC_POOR: ConfigBundle = ConfigBundle {
    primer_opt_size: 18,
    primer_min_size: 16,
    primer_max_size: 22,
    primer_opt_tm: 58.0,
    primer_min_tm: 55.0,
    primer_max_tm: 61.0,
    primer_min_gc: 30.0,
    primer_max_gc: 50.0,
    primer_max_poly_x: 5,
    product_size_range: ProductSizeRange { min: 100, max: 1200 },
    ..ConfigBundle::DEFAULT
};
