//! Engine-native parameter names.
//!
//! The design engine speaks in `PRIMER_*` keys. `NativeParams` is the
//! translation of a validated `ConfigBundle` into that vocabulary, plus the
//! task keys the pipeline always sets.

use std::collections::BTreeMap;
use std::fmt;

use crate::config::ConfigBundle;
use crate::error::EngineError;

/// Maximum Tm difference allowed between the two primers of a pair.
pub const PAIR_MAX_DIFF_TM: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Int(u32),
    Float(f64),
    Range(u32, u32),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Range(lo, hi) => write!(f, "{lo}-{hi}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NativeParams {
    values: BTreeMap<&'static str, ParamValue>,
}

impl NativeParams {
    pub fn from_config(config: &ConfigBundle) -> Self {
        use ParamValue::*;

        let mut values = BTreeMap::new();
        values.insert("PRIMER_OPT_SIZE", Int(config.primer_opt_size));
        values.insert("PRIMER_MIN_SIZE", Int(config.primer_min_size));
        values.insert("PRIMER_MAX_SIZE", Int(config.primer_max_size));
        values.insert("PRIMER_OPT_TM", Float(config.primer_opt_tm));
        values.insert("PRIMER_MIN_TM", Float(config.primer_min_tm));
        values.insert("PRIMER_MAX_TM", Float(config.primer_max_tm));
        if let Some(gc) = config.primer_opt_gc_percent {
            values.insert("PRIMER_OPT_GC_PERCENT", Float(gc));
        }
        values.insert("PRIMER_MIN_GC", Float(config.primer_min_gc));
        values.insert("PRIMER_MAX_GC", Float(config.primer_max_gc));
        values.insert("PRIMER_MAX_POLY_X", Int(config.primer_max_poly_x));
        values.insert("PRIMER_MAX_SELF_ANY", Float(config.primer_max_self_any));
        values.insert("PRIMER_MAX_SELF_END", Float(config.primer_max_self_end));
        values.insert("PRIMER_SALT_MONOVALENT", Float(config.primer_salt_monovalent));
        values.insert("PRIMER_SALT_DIVALENT", Float(config.primer_salt_divalent));
        values.insert("PRIMER_DNTP_CONC", Float(config.primer_dntp_conc));
        values.insert("PRIMER_DNA_CONC", Float(config.primer_dna_conc));
        values.insert(
            "PRIMER_PRODUCT_SIZE_RANGE",
            Range(config.product_size_range.min, config.product_size_range.max),
        );
        values.insert("PRIMER_PAIR_MAX_DIFF_TM", Float(PAIR_MAX_DIFF_TM));

        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.values.get(name).copied()
    }

    pub fn set(&mut self, name: &'static str, value: ParamValue) {
        self.values.insert(name, value);
    }

    pub fn remove(&mut self, name: &str) -> Option<ParamValue> {
        self.values.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, ParamValue)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    pub fn int(&self, name: &'static str) -> Result<u32, EngineError> {
        match self.get(name) {
            Some(ParamValue::Int(v)) => Ok(v),
            _ => Err(EngineError::MissingParam(name)),
        }
    }

    /// Integers are accepted where a float is expected.
    pub fn float(&self, name: &'static str) -> Result<f64, EngineError> {
        match self.get(name) {
            Some(ParamValue::Float(v)) => Ok(v),
            Some(ParamValue::Int(v)) => Ok(v.into()),
            _ => Err(EngineError::MissingParam(name)),
        }
    }

    pub fn optional_float(&self, name: &'static str) -> Option<f64> {
        self.float(name).ok()
    }

    pub fn range(&self, name: &'static str) -> Result<(u32, u32), EngineError> {
        match self.get(name) {
            Some(ParamValue::Range(lo, hi)) => Ok((lo, hi)),
            _ => Err(EngineError::MissingParam(name)),
        }
    }
}
