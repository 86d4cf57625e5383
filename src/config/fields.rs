//! Field table for the design parameter bundle.
//!
//! One row per field: name, human description, absolute bounds and unit. The
//! validator, `--show-params` and the documented template all read from this
//! table, so bounds live in exactly one place.

use serde::Serialize;

/// Parameter groups, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    PrimerSize,
    MeltingTemperature,
    GcContent,
    SecondaryStructure,
    Concentrations,
    Product,
}

impl FieldCategory {
    pub const ALL: [FieldCategory; 6] = [
        FieldCategory::PrimerSize,
        FieldCategory::MeltingTemperature,
        FieldCategory::GcContent,
        FieldCategory::SecondaryStructure,
        FieldCategory::Concentrations,
        FieldCategory::Product,
    ];

    pub fn title(self) -> &'static str {
        match self {
            FieldCategory::PrimerSize => "Primer size",
            FieldCategory::MeltingTemperature => "Melting temperature",
            FieldCategory::GcContent => "GC content",
            FieldCategory::SecondaryStructure => "Secondary structure",
            FieldCategory::Concentrations => "Salt and concentrations",
            FieldCategory::Product => "PCR product",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub category: FieldCategory,
    pub min: f64,
    /// `None` means unbounded above.
    pub max: Option<f64>,
    pub unit: &'static str,
}

impl FieldSpec {
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && self.max.is_none_or(|max| value <= max)
    }

    /// "15-35" style range label.
    pub fn range_label(&self) -> String {
        match self.max {
            Some(max) => format!("{}-{}", self.min, max),
            None => format!(">= {}", self.min),
        }
    }
}

pub const PRODUCT_SIZE_FLOOR: u32 = 50;

pub const FIELD_SPECS: &[FieldSpec] = &[
    FieldSpec {
        name: "primer_opt_size",
        description: "Optimal primer length",
        category: FieldCategory::PrimerSize,
        min: 15.0,
        max: Some(35.0),
        unit: "bp",
    },
    FieldSpec {
        name: "primer_min_size",
        description: "Minimum primer length",
        category: FieldCategory::PrimerSize,
        min: 15.0,
        max: Some(35.0),
        unit: "bp",
    },
    FieldSpec {
        name: "primer_max_size",
        description: "Maximum primer length",
        category: FieldCategory::PrimerSize,
        min: 15.0,
        max: Some(35.0),
        unit: "bp",
    },
    FieldSpec {
        name: "primer_opt_tm",
        description: "Optimal primer Tm",
        category: FieldCategory::MeltingTemperature,
        min: 50.0,
        max: Some(70.0),
        unit: "°C",
    },
    FieldSpec {
        name: "primer_min_tm",
        description: "Minimum primer Tm",
        category: FieldCategory::MeltingTemperature,
        min: 50.0,
        max: Some(70.0),
        unit: "°C",
    },
    FieldSpec {
        name: "primer_max_tm",
        description: "Maximum primer Tm",
        category: FieldCategory::MeltingTemperature,
        min: 50.0,
        max: Some(70.0),
        unit: "°C",
    },
    FieldSpec {
        name: "primer_opt_gc_percent",
        description: "Optimal GC content (optional)",
        category: FieldCategory::GcContent,
        min: 20.0,
        max: Some(80.0),
        unit: "%",
    },
    FieldSpec {
        name: "primer_min_gc",
        description: "Minimum GC content",
        category: FieldCategory::GcContent,
        min: 20.0,
        max: Some(80.0),
        unit: "%",
    },
    FieldSpec {
        name: "primer_max_gc",
        description: "Maximum GC content",
        category: FieldCategory::GcContent,
        min: 20.0,
        max: Some(80.0),
        unit: "%",
    },
    FieldSpec {
        name: "primer_max_poly_x",
        description: "Maximum mononucleotide repeat length",
        category: FieldCategory::SecondaryStructure,
        min: 3.0,
        max: Some(6.0),
        unit: "bases",
    },
    FieldSpec {
        name: "primer_max_self_any",
        description: "Maximum self-complementarity",
        category: FieldCategory::SecondaryStructure,
        min: 0.0,
        max: Some(12.0),
        unit: "score",
    },
    FieldSpec {
        name: "primer_max_self_end",
        description: "Maximum 3' self-complementarity",
        category: FieldCategory::SecondaryStructure,
        min: 0.0,
        max: Some(8.0),
        unit: "score",
    },
    FieldSpec {
        name: "primer_salt_monovalent",
        description: "Monovalent salt concentration",
        category: FieldCategory::Concentrations,
        min: 0.0,
        max: Some(1000.0),
        unit: "mM",
    },
    FieldSpec {
        name: "primer_salt_divalent",
        description: "Divalent salt concentration",
        category: FieldCategory::Concentrations,
        min: 0.0,
        max: Some(10.0),
        unit: "mM",
    },
    FieldSpec {
        name: "primer_dntp_conc",
        description: "dNTP concentration",
        category: FieldCategory::Concentrations,
        min: 0.0,
        max: Some(10.0),
        unit: "mM",
    },
    FieldSpec {
        name: "primer_dna_conc",
        description: "Primer concentration",
        category: FieldCategory::Concentrations,
        min: 0.0,
        max: Some(1000.0),
        unit: "nM",
    },
    FieldSpec {
        name: "product_size_range",
        description: "PCR product size range [min, max]",
        category: FieldCategory::Product,
        min: PRODUCT_SIZE_FLOOR as f64,
        max: None,
        unit: "bp",
    },
];

/// Look up a field by name.
pub fn field_spec(name: &str) -> Option<&'static FieldSpec> {
    FIELD_SPECS.iter().find(|f| f.name == name)
}
