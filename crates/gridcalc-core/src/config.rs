//! Sheet configuration.

use serde::Deserialize;

use crate::error::GridError;
use gridcalc_engine::engine::{MAX_ROWS, RESERVED_PREFIX};

/// Default cap on the number of columns.
pub const DEFAULT_MAX_COLUMNS: usize = 1024;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SheetConfig {
    pub rows: usize,
    pub cols: usize,
    /// Upper bound accepted for `cols`.
    pub max_columns: usize,
    /// Namespace entries starting with this prefix are never imported.
    pub reserved_prefix: String,
    /// Load the builtin math namespace at construction.
    pub import_math: bool,
}

impl Default for SheetConfig {
    fn default() -> Self {
        SheetConfig {
            rows: 4,
            cols: 4,
            max_columns: DEFAULT_MAX_COLUMNS,
            reserved_prefix: RESERVED_PREFIX.to_string(),
            import_math: true,
        }
    }
}

impl SheetConfig {
    pub fn with_size(rows: usize, cols: usize) -> Self {
        SheetConfig {
            rows,
            cols,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), GridError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(GridError::Empty);
        }
        if self.rows > MAX_ROWS {
            return Err(GridError::TooManyRows(self.rows));
        }
        if self.cols > self.max_columns {
            return Err(GridError::TooManyColumns {
                cols: self.cols,
                max: self.max_columns,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(SheetConfig::default().validate(), Ok(()));
    }

    #[test]
    fn row_limit() {
        assert_eq!(SheetConfig::with_size(26, 3).validate(), Ok(()));
        assert_eq!(
            SheetConfig::with_size(27, 3).validate(),
            Err(GridError::TooManyRows(27))
        );
    }

    #[test]
    fn column_limit() {
        let config = SheetConfig {
            max_columns: 10,
            ..SheetConfig::with_size(2, 11)
        };
        assert_eq!(
            config.validate(),
            Err(GridError::TooManyColumns { cols: 11, max: 10 })
        );
    }

    #[test]
    fn empty_grid() {
        assert_eq!(SheetConfig::with_size(0, 3).validate(), Err(GridError::Empty));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: SheetConfig = toml::from_str("rows = 10\nimport_math = false").unwrap();
        assert_eq!(config.rows, 10);
        assert_eq!(config.cols, 4);
        assert!(!config.import_math);
        assert_eq!(config.reserved_prefix, "__");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<SheetConfig>("colour = 'red'").is_err());
    }
}
