//! The design parameter bundle and its validator.
//!
//! `RawConfig` is whatever arrived from outside (a file, a template, a test).
//! `ConfigBundle::validate` is the only way to turn it into a `ConfigBundle`:
//! every field is range-checked first, then the cross-field orderings are
//! checked against the fully populated set. All violations are reported
//! together.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::fields::{PRODUCT_SIZE_FLOOR, field_spec};
use crate::error::{ConfigError, FieldViolation};

/// Validated, read-only design parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfigBundle {
    pub primer_opt_size: u32,
    pub primer_min_size: u32,
    pub primer_max_size: u32,

    pub primer_opt_tm: f64,
    pub primer_min_tm: f64,
    pub primer_max_tm: f64,

    pub primer_opt_gc_percent: Option<f64>,
    pub primer_min_gc: f64,
    pub primer_max_gc: f64,

    pub primer_max_poly_x: u32,
    pub primer_max_self_any: f64,
    pub primer_max_self_end: f64,

    pub primer_salt_monovalent: f64,
    pub primer_salt_divalent: f64,
    pub primer_dntp_conc: f64,
    pub primer_dna_conc: f64,

    pub product_size_range: ProductSizeRange,
}

/// `[min, max]` amplicon size in bp. Serialized as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "[u32; 2]")]
pub struct ProductSizeRange {
    pub min: u32,
    pub max: u32,
}

impl From<ProductSizeRange> for [u32; 2] {
    fn from(r: ProductSizeRange) -> Self {
        [r.min, r.max]
    }
}

impl ProductSizeRange {
    pub fn contains(&self, size: u32) -> bool {
        size >= self.min && size <= self.max
    }
}

/// Unvalidated input. Every field falls back to the general-purpose default.
///
/// Integer-valued fields are kept wide so out-of-range values (negative sizes,
/// for instance) produce a field violation instead of a parse error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub primer_opt_size: i64,
    pub primer_min_size: i64,
    pub primer_max_size: i64,

    pub primer_opt_tm: f64,
    pub primer_min_tm: f64,
    pub primer_max_tm: f64,

    pub primer_opt_gc_percent: Option<f64>,
    pub primer_min_gc: f64,
    pub primer_max_gc: f64,

    pub primer_max_poly_x: i64,
    pub primer_max_self_any: f64,
    pub primer_max_self_end: f64,

    pub primer_salt_monovalent: f64,
    pub primer_salt_divalent: f64,
    pub primer_dntp_conc: f64,
    pub primer_dna_conc: f64,

    pub product_size_range: Vec<i64>,
}

impl Default for RawConfig {
    fn default() -> Self {
        RawConfig::from(&ConfigBundle::DEFAULT)
    }
}

impl From<&ConfigBundle> for RawConfig {
    fn from(c: &ConfigBundle) -> Self {
        RawConfig {
            primer_opt_size: c.primer_opt_size.into(),
            primer_min_size: c.primer_min_size.into(),
            primer_max_size: c.primer_max_size.into(),
            primer_opt_tm: c.primer_opt_tm,
            primer_min_tm: c.primer_min_tm,
            primer_max_tm: c.primer_max_tm,
            primer_opt_gc_percent: c.primer_opt_gc_percent,
            primer_min_gc: c.primer_min_gc,
            primer_max_gc: c.primer_max_gc,
            primer_max_poly_x: c.primer_max_poly_x.into(),
            primer_max_self_any: c.primer_max_self_any,
            primer_max_self_end: c.primer_max_self_end,
            primer_salt_monovalent: c.primer_salt_monovalent,
            primer_salt_divalent: c.primer_salt_divalent,
            primer_dntp_conc: c.primer_dntp_conc,
            primer_dna_conc: c.primer_dna_conc,
            product_size_range: vec![
                c.product_size_range.min.into(),
                c.product_size_range.max.into(),
            ],
        }
    }
}

impl Default for ConfigBundle {
    fn default() -> Self {
        ConfigBundle::DEFAULT
    }
}

impl ConfigBundle {
    /// Field defaults; identical to the `standard` preset.
    pub const DEFAULT: ConfigBundle = ConfigBundle {
        primer_opt_size: 20,
        primer_min_size: 18,
        primer_max_size: 25,
        primer_opt_tm: 60.0,
        primer_min_tm: 57.0,
        primer_max_tm: 63.0,
        primer_opt_gc_percent: Some(50.0),
        primer_min_gc: 40.0,
        primer_max_gc: 60.0,
        primer_max_poly_x: 4,
        primer_max_self_any: 8.0,
        primer_max_self_end: 3.0,
        primer_salt_monovalent: 50.0,
        primer_salt_divalent: 1.5,
        primer_dntp_conc: 0.6,
        primer_dna_conc: 50.0,
        product_size_range: ProductSizeRange { min: 100, max: 1000 },
    };

    /// Validate raw input into a bundle.
    pub fn validate(raw: &RawConfig) -> Result<ConfigBundle, ConfigError> {
        let mut v = Violations::default();

        // 1) Per-field absolute bounds.
        v.int("primer_opt_size", raw.primer_opt_size);
        v.int("primer_min_size", raw.primer_min_size);
        v.int("primer_max_size", raw.primer_max_size);

        v.float("primer_opt_tm", raw.primer_opt_tm);
        v.float("primer_min_tm", raw.primer_min_tm);
        v.float("primer_max_tm", raw.primer_max_tm);

        if let Some(x) = raw.primer_opt_gc_percent {
            v.float("primer_opt_gc_percent", x);
        }
        v.float("primer_min_gc", raw.primer_min_gc);
        v.float("primer_max_gc", raw.primer_max_gc);

        v.int("primer_max_poly_x", raw.primer_max_poly_x);
        v.float("primer_max_self_any", raw.primer_max_self_any);
        v.float("primer_max_self_end", raw.primer_max_self_end);

        v.float("primer_salt_monovalent", raw.primer_salt_monovalent);
        v.float("primer_salt_divalent", raw.primer_salt_divalent);
        v.float("primer_dntp_conc", raw.primer_dntp_conc);
        v.float("primer_dna_conc", raw.primer_dna_conc);

        let product = v.product_range(&raw.product_size_range);

        // 2) Cross-field orderings over the complete set.
        v.ordered(
            "primer_max_size",
            "primer_min_size",
            raw.primer_min_size as f64,
            raw.primer_max_size as f64,
        );
        v.ordered("primer_max_tm", "primer_min_tm", raw.primer_min_tm, raw.primer_max_tm);
        v.ordered("primer_max_gc", "primer_min_gc", raw.primer_min_gc, raw.primer_max_gc);

        let Some(product_size_range) = product.filter(|_| v.is_empty()) else {
            return Err(ConfigError::Invalid(v.into_inner()));
        };

        // Integer fields passed their bounds above, so the narrowing is lossless.
        Ok(ConfigBundle {
            primer_opt_size: raw.primer_opt_size as u32,
            primer_min_size: raw.primer_min_size as u32,
            primer_max_size: raw.primer_max_size as u32,
            primer_opt_tm: raw.primer_opt_tm,
            primer_min_tm: raw.primer_min_tm,
            primer_max_tm: raw.primer_max_tm,
            primer_opt_gc_percent: raw.primer_opt_gc_percent,
            primer_min_gc: raw.primer_min_gc,
            primer_max_gc: raw.primer_max_gc,
            primer_max_poly_x: raw.primer_max_poly_x as u32,
            primer_max_self_any: raw.primer_max_self_any,
            primer_max_self_end: raw.primer_max_self_end,
            primer_salt_monovalent: raw.primer_salt_monovalent,
            primer_salt_divalent: raw.primer_salt_divalent,
            primer_dntp_conc: raw.primer_dntp_conc,
            primer_dna_conc: raw.primer_dna_conc,
            product_size_range,
        })
    }

    /// Validate an arbitrary JSON value (a bare `config` object).
    ///
    /// Type errors are reported against the key that carried the bad value;
    /// every offending key is listed, not just the first.
    pub fn from_json_value(value: serde_json::Value) -> Result<ConfigBundle, ConfigError> {
        if let serde_json::Value::Object(map) = &value {
            let mut v = Violations::default();
            for (key, entry) in map {
                let Some(spec) = field_spec(key) else {
                    continue;
                };
                let single = serde_json::Map::from_iter([(key.clone(), entry.clone())]);
                if let Err(e) = serde_json::from_value::<RawConfig>(serde_json::Value::Object(single)) {
                    v.push(spec.name, e.to_string());
                }
            }
            if !v.is_empty() {
                return Err(ConfigError::Invalid(v.into_inner()));
            }
        }

        let raw: RawConfig = serde_json::from_value(value).map_err(|e| {
            ConfigError::Invalid(vec![FieldViolation {
                field: "config",
                message: e.to_string(),
            }])
        })?;
        ConfigBundle::validate(&raw)
    }

    /// Human-readable summary used in JSON metadata and terminal output.
    pub fn config_summary(&self) -> BTreeMap<&'static str, String> {
        let mut out = BTreeMap::new();
        out.insert(
            "primer_size_range",
            format!("{}-{} bp", self.primer_min_size, self.primer_max_size),
        );
        out.insert("optimal_size", format!("{} bp", self.primer_opt_size));
        out.insert(
            "tm_range",
            format!("{}-{}°C", self.primer_min_tm, self.primer_max_tm),
        );
        out.insert("optimal_tm", format!("{}°C", self.primer_opt_tm));
        out.insert(
            "gc_range",
            format!("{}-{}%", self.primer_min_gc, self.primer_max_gc),
        );
        out.insert(
            "product_size_range",
            format!(
                "{}-{} bp",
                self.product_size_range.min, self.product_size_range.max
            ),
        );
        out.insert(
            "salt_concentration",
            format!("{} mM", self.primer_salt_monovalent),
        );
        out.insert("primer_concentration", format!("{} nM", self.primer_dna_conc));
        out
    }
}

#[derive(Default)]
struct Violations(Vec<FieldViolation>);

impl Violations {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldViolation {
            field,
            message: message.into(),
        });
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn into_inner(self) -> Vec<FieldViolation> {
        self.0
    }

    fn float(&mut self, field: &'static str, value: f64) {
        let Some(spec) = field_spec(field) else {
            self.push(field, "unknown field");
            return;
        };
        if !spec.contains(value) {
            self.push(
                field,
                format!("{value} is outside {} {}", spec.range_label(), spec.unit),
            );
        }
    }

    fn int(&mut self, field: &'static str, value: i64) {
        self.float(field, value as f64);
    }

    /// Only compared when both ends are finite; non-finite values were already reported.
    fn ordered(&mut self, max_field: &'static str, min_field: &'static str, lo: f64, hi: f64) {
        if lo.is_finite() && hi.is_finite() && hi < lo {
            self.push(max_field, format!("must be >= {min_field} ({hi} < {lo})"));
        }
    }

    fn product_range(&mut self, values: &[i64]) -> Option<ProductSizeRange> {
        const FIELD: &str = "product_size_range";
        let [lo, hi] = values else {
            self.push(
                FIELD,
                format!("must be a pair of (min, max), got {} values", values.len()),
            );
            return None;
        };
        let (lo, hi) = (*lo, *hi);
        let mut ok = true;
        if lo >= hi {
            self.push(FIELD, format!("max must be > min ({hi} <= {lo})"));
            ok = false;
        }
        if lo < i64::from(PRODUCT_SIZE_FLOOR) {
            self.push(
                FIELD,
                format!("minimum product size should be >= {PRODUCT_SIZE_FLOOR} bp (got {lo})"),
            );
            ok = false;
        }
        let (Ok(min), Ok(max)) = (u32::try_from(lo), u32::try_from(hi)) else {
            if ok {
                self.push(FIELD, "values do not fit in 32 bits");
            }
            return None;
        };
        ok.then_some(ProductSizeRange { min, max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn defaults_validate() {
        let bundle = ConfigBundle::validate(&RawConfig::default()).unwrap();
        assert_eq!(bundle, ConfigBundle::DEFAULT);
    }

    #[test]
    fn max_below_min_is_rejected_per_triple() {
        let raw = RawConfig {
            primer_min_size: 25,
            primer_max_size: 20,
            primer_min_tm: 62.0,
            primer_max_tm: 58.0,
            primer_min_gc: 55.0,
            primer_max_gc: 45.0,
            ..RawConfig::default()
        };
        let err = ConfigBundle::validate(&raw).unwrap_err();
        assert!(err.names_field("primer_max_size"));
        assert!(err.names_field("primer_max_tm"));
        assert!(err.names_field("primer_max_gc"));
        assert_eq!(err.violations().len(), 3);
    }

    #[test]
    fn opt_is_not_checked_against_min_max() {
        let raw = RawConfig {
            primer_opt_size: 30,
            primer_opt_tm: 51.0,
            ..RawConfig::default()
        };
        assert!(ConfigBundle::validate(&raw).is_ok());
    }

    #[test]
    fn inverted_product_range_fails() {
        let raw = RawConfig {
            product_size_range: vec![200, 100],
            ..RawConfig::default()
        };
        let err = ConfigBundle::validate(&raw).unwrap_err();
        assert!(err.names_field("product_size_range"));
    }

    #[test]
    fn product_range_floor_and_arity() {
        let low = RawConfig {
            product_size_range: vec![40, 400],
            ..RawConfig::default()
        };
        assert!(ConfigBundle::validate(&low).is_err());

        let three = RawConfig {
            product_size_range: vec![100, 200, 300],
            ..RawConfig::default()
        };
        let err = ConfigBundle::validate(&three).unwrap_err();
        assert!(err.to_string().contains("got 3 values"));

        let equal = RawConfig {
            product_size_range: vec![100, 100],
            ..RawConfig::default()
        };
        assert!(ConfigBundle::validate(&equal).is_err());
    }

    #[test]
    fn out_of_bounds_fields_are_all_reported() {
        let raw = RawConfig {
            primer_opt_size: 10,
            primer_salt_divalent: 11.0,
            primer_max_poly_x: -1,
            primer_dna_conc: f64::NAN,
            ..RawConfig::default()
        };
        let err = ConfigBundle::validate(&raw).unwrap_err();
        for field in [
            "primer_opt_size",
            "primer_salt_divalent",
            "primer_max_poly_x",
            "primer_dna_conc",
        ] {
            assert!(err.names_field(field), "{field} missing from {err}");
        }
    }

    #[test]
    fn opt_gc_may_be_absent() {
        let raw = RawConfig {
            primer_opt_gc_percent: None,
            ..RawConfig::default()
        };
        let bundle = ConfigBundle::validate(&raw).unwrap();
        assert_eq!(bundle.primer_opt_gc_percent, None);
    }

    #[test]
    fn json_round_trip_is_identity() {
        let value = serde_json::to_value(ConfigBundle::DEFAULT).unwrap();
        assert_eq!(value["product_size_range"], serde_json::json!([100, 1000]));
        let back = ConfigBundle::from_json_value(value).unwrap();
        assert_eq!(back, ConfigBundle::DEFAULT);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let value = serde_json::json!({ "primer_opt_tm": 61.5 });
        let bundle = ConfigBundle::from_json_value(value).unwrap();
        assert_eq!(bundle.primer_opt_tm, 61.5);
        assert_eq!(bundle.primer_min_size, 18);
    }

    #[test]
    fn type_errors_name_their_field() {
        let value = serde_json::json!({
            "primer_opt_size": "twenty",
            "product_size_range": [100.0, 200.0],
            "primer_max_tm": null,
            "primer_min_tm": 57.0,
        });
        let err = ConfigBundle::from_json_value(value).unwrap_err();
        assert!(err.names_field("primer_opt_size"));
        assert!(err.names_field("product_size_range"));
        assert!(err.names_field("primer_max_tm"));
        assert!(!err.names_field("primer_min_tm"));
        assert!(!err.names_field("config"));
        assert_eq!(err.violations().len(), 3);
    }

    #[test]
    fn null_opt_gc_is_not_a_type_error() {
        let value = serde_json::json!({ "primer_opt_gc_percent": null });
        let bundle = ConfigBundle::from_json_value(value).unwrap();
        assert_eq!(bundle.primer_opt_gc_percent, None);
    }

    #[test]
    fn non_object_value_is_a_config_error() {
        let err = ConfigBundle::from_json_value(serde_json::json!([1, 2])).unwrap_err();
        assert!(err.names_field("config"));
    }

    #[test]
    fn summary_is_stable() {
        let summary = ConfigBundle::DEFAULT.config_summary();
        assert_eq!(summary["primer_size_range"], "18-25 bp");
        assert_eq!(summary["product_size_range"], "100-1000 bp");
        assert_eq!(summary["tm_range"], "57-63°C");
    }

    proptest! {
        #[test]
        fn accepted_bundles_keep_triples_ordered(
            min_size in 15i64..=35,
            max_size in 15i64..=35,
            min_tm in 50.0f64..=70.0,
            max_tm in 50.0f64..=70.0,
            min_gc in 20.0f64..=80.0,
            max_gc in 20.0f64..=80.0,
        ) {
            let raw = RawConfig {
                primer_min_size: min_size,
                primer_max_size: max_size,
                primer_min_tm: min_tm,
                primer_max_tm: max_tm,
                primer_min_gc: min_gc,
                primer_max_gc: max_gc,
                ..RawConfig::default()
            };
            let ordered = min_size <= max_size && min_tm <= max_tm && min_gc <= max_gc;
            match ConfigBundle::validate(&raw) {
                Ok(b) => {
                    prop_assert!(ordered);
                    prop_assert!(b.primer_min_size <= b.primer_max_size);
                    prop_assert!(b.primer_min_tm <= b.primer_max_tm);
                    prop_assert!(b.primer_min_gc <= b.primer_max_gc);
                }
                Err(_) => prop_assert!(!ordered),
            }
        }

        #[test]
        fn serialize_then_validate_is_identity(
            min_size in 15u32..=25,
            extra in 0u32..=10,
            lo in 50u32..=500,
            span in 1u32..=2000,
        ) {
            let bundle = ConfigBundle {
                primer_min_size: min_size,
                primer_max_size: min_size + extra,
                product_size_range: ProductSizeRange { min: lo, max: lo + span },
                ..ConfigBundle::DEFAULT
            };
            let back = ConfigBundle::from_json_value(serde_json::to_value(bundle).unwrap()).unwrap();
            prop_assert_eq!(back, bundle);
        }
    }
}
