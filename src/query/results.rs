//! Result table assembly and access.
//!
//! This module provides the in-memory table a completed query materializes
//! into: an ordered list of record batches sharing one schema.

use crate::error::ConvertError;
use crate::query::convert;
use arrow::compute::concat_batches;
use arrow::datatypes::{Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

/// Fully collected query result.
///
/// Batches are held in stream order. The caller owns the table once a query
/// returns; nothing references the transport anymore.
#[derive(Debug, Clone)]
pub struct ResultTable {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl ResultTable {
    /// Create a table from collected record batches.
    ///
    /// The schema is taken from the first batch; a result with no batches
    /// gets an empty schema.
    pub fn new(batches: Vec<RecordBatch>) -> Self {
        let schema = batches
            .first()
            .map(|batch| batch.schema())
            .unwrap_or_else(|| Arc::new(Schema::empty()));
        Self { schema, batches }
    }

    /// Schema shared by all batches.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Total number of rows across all batches.
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(|batch| batch.num_rows()).sum()
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.schema.fields().len()
    }

    /// Whether the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// Get column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect()
    }

    /// The collected batches, in stream order.
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Consume the table, returning its batches.
    pub fn into_batches(self) -> Vec<RecordBatch> {
        self.batches
    }

    /// Concatenate all batches into a single record batch.
    ///
    /// # Errors
    ///
    /// Returns `ConvertError::ArrowError` if the batches cannot be combined.
    pub fn to_batch(&self) -> Result<RecordBatch, ConvertError> {
        Ok(concat_batches(&self.schema, &self.batches)?)
    }

    /// Render a date or timestamp column as formatted text in place.
    ///
    /// Every value of `column` is formatted with the strftime pattern in
    /// `format` and the column is replaced by a nullable Utf8 column of the
    /// rendered strings. Nulls stay null.
    ///
    /// # Arguments
    ///
    /// * `column` - Name of the temporal column to render
    /// * `format` - strftime pattern, e.g. `%Y-%m-%d %H:%M:%S`
    ///
    /// # Errors
    ///
    /// Checked in order: [`ConvertError::UnknownColumn`] if `column` does not
    /// exist, [`ConvertError::InvalidColumnType`] if it is not a date or
    /// timestamp column, [`ConvertError::MissingFormat`] if `format` is
    /// `None`, and [`ConvertError::InvalidFormat`] if the pattern cannot be
    /// parsed or rendered. The table is left unmodified on error.
    pub fn format_temporal(
        &mut self,
        column: &str,
        format: Option<&str>,
    ) -> Result<(), ConvertError> {
        let (schema, batches) =
            convert::format_temporal_column(&self.schema, &self.batches, column, format)?;
        self.schema = schema;
        self.batches = batches;
        Ok(())
    }
}
