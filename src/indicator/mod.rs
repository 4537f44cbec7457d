//! # Indicator matrix and Burt-style normalization
//!
//! Expands categorical observations into a (possibly fractional) indicator matrix and turns it
//! into the normalized residual matrix that the decomposition operates on.
//!
//! Every variable occupies one column block, one column per category. A matched value yields a
//! one-hot block; a missing variable, or a value that matches none of the categories, yields the
//! uniform block `1 / |categories|`. Either way each block sums to one.

use std::collections::HashSet;

use log::debug;
use ndarray::{Array1, Array2, Axis};

use crate::categorical::{CategorySchema, CategoryValue, Observation};
use crate::error::MCAError;
use crate::utils::inv_sqrt;

/// A variable's column block inside the indicator matrix.
#[derive(Debug, Clone)]
pub struct VariableBlock {
    pub name: String,
    pub categories: Vec<CategoryValue>,
    /// Index of the block's first column.
    pub offset: usize,
}

impl VariableBlock {
    pub fn width(&self) -> usize {
        self.categories.len()
    }

    pub fn columns(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.categories.len()
    }
}

/// Raw indicator matrix before normalization.
#[derive(Debug, Clone)]
pub struct IndicatorMatrix {
    values: Array2<f64>,
    blocks: Vec<VariableBlock>,
    total_count: f64,
}

impl IndicatorMatrix {
    /// Builds the indicator matrix for `rows` over the variables of `schema` that carry at least
    /// one category.
    pub fn build(rows: &[Observation], schema: &CategorySchema) -> anyhow::Result<Self> {
        let blocks = Self::schema_blocks(schema);
        if blocks.is_empty() {
            return Err(MCAError::EmptySchema.into());
        }
        if rows.is_empty() {
            return Err(MCAError::NoObservations.into());
        }

        let n_cols: usize = blocks.iter().map(VariableBlock::width).sum();
        let mut values = Array2::<f64>::zeros((rows.len(), n_cols));
        let mut unknown: HashSet<&str> = HashSet::new();
        let mut total_count = 0.0;

        for (obs, mut row) in rows.iter().zip(values.rows_mut()) {
            for key in obs.keys() {
                if !schema.contains(key) {
                    unknown.insert(key);
                }
            }

            for block in &blocks {
                let hit = obs
                    .get(&block.name)
                    .and_then(|v| block.categories.iter().position(|c| c == v));
                match hit {
                    Some(j) => row[block.offset + j] = 1.0,
                    None => {
                        let share = 1.0 / block.width() as f64;
                        for col in block.columns() {
                            row[col] = share;
                        }
                    }
                }
                total_count += 1.0;
            }
        }

        if !unknown.is_empty() {
            debug!(
                "Ignoring {} observation key(s) not present in the category schema",
                unknown.len()
            );
        }

        Ok(IndicatorMatrix {
            values,
            blocks,
            total_count,
        })
    }

    fn schema_blocks(schema: &CategorySchema) -> Vec<VariableBlock> {
        let mut offset = 0;
        let mut blocks = Vec::new();
        for (name, categories) in schema.iter() {
            if categories.is_empty() {
                continue;
            }
            blocks.push(VariableBlock {
                name: name.to_string(),
                categories: categories.to_vec(),
                offset,
            });
            offset += categories.len();
        }
        blocks
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn blocks(&self) -> &[VariableBlock] {
        &self.blocks
    }

    /// Number of variable assignments, one per variable per row.
    pub fn total_count(&self) -> f64 {
        self.total_count
    }
}

/// Residual matrix plus the marginal masses needed to project back out of factor space.
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    pub residual: Array2<f64>,
    pub row_mass: Array1<f64>,
    pub col_mass: Array1<f64>,
    pub row_inv_sqrt: Array1<f64>,
    pub col_inv_sqrt: Array1<f64>,
    pub blocks: Vec<VariableBlock>,
}

impl NormalizedTable {
    pub fn build(rows: &[Observation], schema: &CategorySchema) -> anyhow::Result<Self> {
        Ok(Self::from_indicator(IndicatorMatrix::build(rows, schema)?))
    }

    /// Scales the indicator matrix to unit total mass and replaces it in place with
    /// `D_r^-1/2 (Z - r c^T) D_c^-1/2`.
    pub fn from_indicator(indicator: IndicatorMatrix) -> Self {
        let IndicatorMatrix {
            values: mut z,
            blocks,
            total_count,
        } = indicator;

        let (n_rows, n_cols) = z.dim();
        let scale = 1.0 / total_count;
        let mut row_mass = Array1::<f64>::zeros(n_rows);
        let mut col_mass = Array1::<f64>::zeros(n_cols);
        for ((i, j), v) in z.indexed_iter_mut() {
            *v *= scale;
            row_mass[i] += *v;
            col_mass[j] += *v;
        }

        let row_inv_sqrt = row_mass.mapv(inv_sqrt);
        let col_inv_sqrt = col_mass.mapv(inv_sqrt);

        for (i, mut row) in z.axis_iter_mut(Axis(0)).enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = row_inv_sqrt[i] * col_inv_sqrt[j] * (*v - row_mass[i] * col_mass[j]);
            }
        }

        debug!(
            "Normalized {} x {} indicator matrix over {} variables",
            n_rows,
            n_cols,
            blocks.len()
        );

        NormalizedTable {
            residual: z,
            row_mass,
            col_mass,
            row_inv_sqrt,
            col_inv_sqrt,
            blocks,
        }
    }

    /// K: number of variables retained in the analysis.
    pub fn n_variables(&self) -> usize {
        self.blocks.len()
    }

    /// J: total number of category columns.
    pub fn n_categories(&self) -> usize {
        self.col_mass.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn schema() -> CategorySchema {
        CategorySchema::new()
            .variable("fruity", [true, false])
            .variable("woody", [1, 2, 3])
            .variable("unused", Vec::<CategoryValue>::new())
            .variable("oak", [1, 2])
    }

    fn rows() -> Vec<Observation> {
        vec![
            Observation::new().with("fruity", true).with("woody", 3).with("oak", 1),
            Observation::new().with("fruity", false).with("woody", 2).with("oak", 2),
            Observation::new().with("woody", 1).with("oak", 2),
            Observation::new(),
        ]
    }

    #[test]
    fn test_blocks_skip_empty_variables() {
        let ind = IndicatorMatrix::build(&rows(), &schema()).unwrap();
        let names: Vec<&str> = ind.blocks().iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["fruity", "woody", "oak"]);
        assert_eq!(ind.blocks()[2].offset, 5);
        assert_eq!(ind.values().ncols(), 7);
    }

    #[test]
    fn test_column_blocks_sum_to_one() {
        let ind = IndicatorMatrix::build(&rows(), &schema()).unwrap();
        for row in ind.values().rows() {
            for block in ind.blocks() {
                let sum: f64 = block.columns().map(|c| row[c]).sum();
                assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-12);
            }
        }
        assert_eq!(ind.total_count(), 12.0);
    }

    #[test]
    fn test_one_hot_and_missing_rows() {
        let ind = IndicatorMatrix::build(&rows(), &schema()).unwrap();
        let z = ind.values();
        assert_eq!(z.row(0).to_vec(), vec![1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0]);
        // missing "fruity" falls back to the uniform block
        assert_eq!(z.row(2).to_vec(), vec![0.5, 0.5, 1.0, 0.0, 0.0, 0.0, 1.0]);

        let third = 1.0 / 3.0;
        assert_eq!(z.row(3).to_vec(), vec![0.5, 0.5, third, third, third, 0.5, 0.5]);
    }

    // An unmatched value is treated like a missing variable rather than rejected. Kept as
    // documented behavior; confirm before relying on it.
    #[test]
    fn test_unmatched_value_degrades_to_uniform() {
        let rows = vec![
            Observation::new().with("fruity", "very").with("woody", 7).with("oak", 1),
            Observation::new().with("oak", 1),
        ];
        let ind = IndicatorMatrix::build(&rows, &schema()).unwrap();
        assert_eq!(ind.values().row(0), ind.values().row(1));
        assert_eq!(ind.total_count(), 6.0);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let with_extra = vec![Observation::new()
            .with("fruity", true)
            .with("name", "W1")
            .with("expert1:coffee", false)];
        let plain = vec![Observation::new().with("fruity", true)];
        let a = IndicatorMatrix::build(&with_extra, &schema()).unwrap();
        let b = IndicatorMatrix::build(&plain, &schema()).unwrap();
        assert_eq!(a.values(), b.values());
    }

    #[test]
    fn test_empty_schema_is_rejected() {
        let schema = CategorySchema::new().variable("nothing", Vec::<CategoryValue>::new());
        let err = IndicatorMatrix::build(&rows(), &schema).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MCAError>(),
            Some(MCAError::EmptySchema)
        ));
    }

    #[test]
    fn test_no_rows_is_rejected() {
        let err = IndicatorMatrix::build(&[], &schema()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MCAError>(),
            Some(MCAError::NoObservations)
        ));
    }

    #[test]
    fn test_masses_sum_to_one() {
        let table = NormalizedTable::build(&rows(), &schema()).unwrap();
        assert_abs_diff_eq!(table.row_mass.sum(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(table.col_mass.sum(), 1.0, epsilon = 1e-12);
        assert_eq!(table.n_variables(), 3);
        assert_eq!(table.n_categories(), 7);
    }

    #[test]
    fn test_fully_missing_rows_share_weight() {
        let rows = vec![
            Observation::new(),
            Observation::new().with("fruity", true).with("woody", 1).with("oak", 2),
            Observation::new(),
        ];
        let table = NormalizedTable::build(&rows, &schema()).unwrap();
        assert_eq!(table.row_mass[0], table.row_mass[2]);
        assert_eq!(table.residual.row(0), table.residual.row(2));
    }

    #[test]
    fn test_residual_entries() {
        let table = NormalizedTable::build(&rows(), &schema()).unwrap();
        // every row carries K / totalCount = 1 / n of the mass
        for &r in table.row_mass.iter() {
            assert_abs_diff_eq!(r, 0.25, epsilon = 1e-12);
        }
        // fruity=true: (1 + 0 + 0.5 + 0.5) / 12
        let c0 = 2.0 / 12.0;
        assert_abs_diff_eq!(table.col_mass[0], c0, epsilon = 1e-12);
        let expected = (1.0 / 12.0 - 0.25 * c0) / (0.25_f64.sqrt() * c0.sqrt());
        assert_abs_diff_eq!(table.residual[[0, 0]], expected, epsilon = 1e-12);
    }

    #[test]
    fn test_single_category_variable_is_degenerate() {
        let schema = CategorySchema::new()
            .variable("constant", ["yes"])
            .variable("oak", [1, 2]);
        let rows = vec![
            Observation::new().with("constant", "yes").with("oak", 1),
            Observation::new().with("oak", 2),
            Observation::new().with("constant", "no").with("oak", 2),
        ];
        let table = NormalizedTable::build(&rows, &schema).unwrap();
        for &v in table.residual.column(0).iter() {
            assert_abs_diff_eq!(v, 0.0, epsilon = 1e-12);
        }
    }
}
