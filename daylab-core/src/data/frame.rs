//! Columnar price table for one instrument-day, as read from disk.
//!
//! The loader keeps every numeric column it finds; the simulator only needs
//! the four named by a `ColumnMap`. A missing column invalidates the whole
//! instrument-day instead of producing partial rows.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::Bar;
use crate::error::DayError;

/// Names of the four price columns in an instrument file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            open: "Open".into(),
            high: "High".into(),
            low: "Low".into(),
            close: "Close".into(),
        }
    }
}

impl ColumnMap {
    /// Required columns in open/high/low/close order.
    pub fn required(&self) -> [&str; 4] {
        [&self.open, &self.high, &self.low, &self.close]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceFrame {
    timestamps: Vec<NaiveDateTime>,
    columns: BTreeMap<String, Vec<f64>>,
}

impl PriceFrame {
    pub fn new(timestamps: Vec<NaiveDateTime>) -> Self {
        Self {
            timestamps,
            columns: BTreeMap::new(),
        }
    }

    /// Attach a column. Its length must match the timestamp index.
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<Self, DayError> {
        self.insert_column(name, values)?;
        Ok(self)
    }

    pub fn insert_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), DayError> {
        let name = name.into();
        if values.len() != self.timestamps.len() {
            return Err(DayError::ColumnLength {
                column: name,
                expected: self.timestamps.len(),
                actual: values.len(),
            });
        }
        self.columns.insert(name, values);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(|v| v.as_slice())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| k.as_str())
    }

    /// Reorder rows chronologically (stable for equal timestamps).
    pub fn sort_by_time(&mut self) {
        if self.timestamps.windows(2).all(|w| w[0] <= w[1]) {
            return;
        }
        let mut order: Vec<usize> = (0..self.timestamps.len()).collect();
        order.sort_by_key(|&i| self.timestamps[i]);

        self.timestamps = order.iter().map(|&i| self.timestamps[i]).collect();
        for values in self.columns.values_mut() {
            *values = order.iter().map(|&i| values[i]).collect();
        }
    }

    /// Extract OHLC bars using the given column names.
    pub fn bars(&self, columns: &ColumnMap) -> Result<Vec<Bar>, DayError> {
        let mut series = Vec::with_capacity(4);
        for name in columns.required() {
            let values = self.column(name).ok_or_else(|| DayError::MissingColumn {
                column: name.to_string(),
            })?;
            series.push(values);
        }
        let (open, high, low, close) = (series[0], series[1], series[2], series[3]);

        Ok(self
            .timestamps
            .iter()
            .enumerate()
            .map(|(i, &ts)| Bar::new(ts, open[i], high[i], low[i], close[i]))
            .collect())
    }
}
