use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::model::{CellValue, Column, Table};

pub const DISCHARGE_CAPACITY: &str = "Discharge_Capacity(Ah)";
pub const CHARGE_CAPACITY: &str = "Charge_Capacity(Ah)";
pub const NORMALIZED_CAPACITY: &str = "Normalized Capacity";
pub const COULOMBIC_EFFICIENCY: &str = "Coulombic Efficiency";

/// Which capacity column feeds the normalized capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacitySource {
    #[default]
    Discharge,
    Charge,
}

impl CapacitySource {
    pub fn column(self) -> &'static str {
        match self {
            CapacitySource::Discharge => DISCHARGE_CAPACITY,
            CapacitySource::Charge => CHARGE_CAPACITY,
        }
    }
}

/// Normalized capacity in mAh/g from a capacity column and the active mass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedCapacity {
    #[serde(default)]
    pub source: CapacitySource,
    /// Active material mass in grams.
    pub active_mass_g: f64,
}

/// Derived columns to append to each dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedColumns {
    #[serde(default)]
    pub normalized_capacity: Option<NormalizedCapacity>,
    #[serde(default)]
    pub coulombic_efficiency: bool,
    /// Active mass per dataset label, overriding `normalized_capacity`'s.
    #[serde(default)]
    pub mass_overrides: BTreeMap<String, f64>,
}

impl DerivedColumns {
    pub fn is_empty(&self) -> bool {
        self.normalized_capacity.is_none() && !self.coulombic_efficiency
    }

    /// Active mass to use for the dataset labelled `label`.
    pub fn mass_for(&self, label: &str) -> Option<f64> {
        let normalized = self.normalized_capacity.as_ref()?;
        Some(
            self.mass_overrides
                .get(label)
                .copied()
                .unwrap_or(normalized.active_mass_g),
        )
    }

    /// Return a copy of `table` with the configured columns appended, and the
    /// names of the columns that were actually added.
    pub fn apply(&self, label: &str, table: &Table) -> (Table, Vec<String>) {
        let mut derived = table.clone();
        let mut added = Vec::new();

        if let (Some(normalized), Some(mass)) = (&self.normalized_capacity, self.mass_for(label)) {
            if let Some(column) = normalized_capacity(&derived, normalized.source.column(), mass) {
                derived.insert_column(column);
                added.push(NORMALIZED_CAPACITY.to_string());
            } else {
                log::debug!("{label}: normalized capacity skipped");
            }
        }

        if self.coulombic_efficiency {
            if let Some(column) = coulombic_efficiency(&derived) {
                derived.insert_column(column);
                added.push(COULOMBIC_EFFICIENCY.to_string());
            } else {
                log::debug!("{label}: coulombic efficiency skipped");
            }
        }

        (derived, added)
    }
}

/// `(cap[i] - cap[i-1]) * 1000 / mass`; the first row has no prior and is
/// missing. `None` when the column is absent or the mass is not positive.
pub fn normalized_capacity(table: &Table, capacity_column: &str, mass_g: f64) -> Option<Column> {
    if !mass_g.is_finite() || mass_g <= 0.0 {
        return None;
    }
    let capacity = table.column(capacity_column)?.numbers();

    let values = (0..capacity.len())
        .map(|i| {
            let diff = match (i.checked_sub(1).and_then(|p| capacity[p]), capacity[i]) {
                (Some(prev), Some(cur)) => Some(cur - prev),
                _ => None,
            };
            CellValue::from_f64(diff.map(|d| d * 1000.0 / mass_g))
        })
        .collect();

    Some(Column::new(NORMALIZED_CAPACITY, values))
}

/// `discharge[i] / charge[i]`, with a zero charge capacity treated as missing.
/// `None` unless both capacity columns are present.
pub fn coulombic_efficiency(table: &Table) -> Option<Column> {
    let discharge = table.column(DISCHARGE_CAPACITY)?.numbers();
    let charge = table.column(CHARGE_CAPACITY)?.numbers();

    let values = discharge
        .iter()
        .zip(&charge)
        .map(|(d, c)| match (d, c) {
            (Some(d), Some(c)) if *c != 0.0 => CellValue::from_f64(Some(d / c)),
            _ => CellValue::Missing,
        })
        .collect();

    Some(Column::new(COULOMBIC_EFFICIENCY, values))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capacities() -> Table {
        Table::from_columns(vec![
            Column::numeric(DISCHARGE_CAPACITY, &[0.0, 0.001, 0.003, 0.004]),
            Column::numeric(CHARGE_CAPACITY, &[0.0, 0.002, 0.004, 0.005]),
        ])
    }

    fn close(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn test_normalized_capacity_first_row_missing() {
        let column = normalized_capacity(&capacities(), DISCHARGE_CAPACITY, 0.5).unwrap();
        let values = column.numbers();
        assert_eq!(values[0], None);
        assert!(close(values[1], 2.0));
        assert!(close(values[2], 4.0));
        assert!(close(values[3], 2.0));
    }

    #[test]
    fn test_normalized_capacity_skips_without_inputs() {
        assert!(normalized_capacity(&capacities(), "Other(Ah)", 1.0).is_none());
        assert!(normalized_capacity(&capacities(), DISCHARGE_CAPACITY, 0.0).is_none());
        assert!(normalized_capacity(&capacities(), DISCHARGE_CAPACITY, -1.0).is_none());
        assert!(normalized_capacity(&capacities(), DISCHARGE_CAPACITY, f64::NAN).is_none());
    }

    #[test]
    fn test_zero_charge_capacity_is_missing() {
        let values = coulombic_efficiency(&capacities()).unwrap().numbers();
        assert_eq!(values[0], None);
        assert!(close(values[1], 0.5));
        assert!(close(values[2], 0.75));
        assert!(close(values[3], 0.8));
    }

    #[test]
    fn test_coulombic_efficiency_needs_both_columns() {
        let table = Table::from_columns(vec![Column::numeric(DISCHARGE_CAPACITY, &[1.0])]);
        assert!(coulombic_efficiency(&table).is_none());
    }

    #[test]
    fn test_apply_leaves_original_untouched() {
        let table = capacities();
        let config = DerivedColumns {
            normalized_capacity: Some(NormalizedCapacity {
                source: CapacitySource::Charge,
                active_mass_g: 1.0,
            }),
            coulombic_efficiency: true,
            mass_overrides: BTreeMap::new(),
        };

        let (derived, added) = config.apply("cell", &table);

        assert_eq!(added, vec![NORMALIZED_CAPACITY, COULOMBIC_EFFICIENCY]);
        assert_eq!(table.columns().len(), 2);
        assert_eq!(derived.columns().len(), 4);
        assert!(close(derived.column(NORMALIZED_CAPACITY).unwrap().numbers()[1], 2.0));
    }

    #[test]
    fn test_mass_override_per_dataset() {
        let config = DerivedColumns {
            normalized_capacity: Some(NormalizedCapacity {
                source: CapacitySource::Discharge,
                active_mass_g: 1.0,
            }),
            coulombic_efficiency: false,
            mass_overrides: BTreeMap::from([("heavy".to_string(), 2.0)]),
        };

        assert_eq!(config.mass_for("heavy"), Some(2.0));
        assert_eq!(config.mass_for("other"), Some(1.0));

        let (derived, _) = config.apply("heavy", &capacities());
        assert!(close(derived.column(NORMALIZED_CAPACITY).unwrap().numbers()[1], 0.5));
    }

    #[test]
    fn test_nothing_configured_adds_nothing() {
        let (derived, added) = DerivedColumns::default().apply("cell", &capacities());
        assert!(added.is_empty());
        assert_eq!(derived, capacities());
    }
}
