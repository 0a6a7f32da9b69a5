//! Temporal column rendering.
//!
//! Turns a date or timestamp column into formatted text using a chrono
//! strftime pattern. Preconditions are checked in a fixed order: column
//! existence, column type, then format presence. The column type is read from
//! the schema, so individual values are never inspected for validity.

use crate::error::ConvertError;
use arrow::array::{
    Array, ArrayRef, Date32Array, Date64Array, StringArray, StringBuilder,
    TimestampMicrosecondArray, TimestampMillisecondArray, TimestampNanosecondArray,
    TimestampSecondArray,
};
use arrow::datatypes::{DataType, Field, FieldRef, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDateTime;
use std::fmt::Write;
use std::sync::Arc;

/// Render `column` of every batch as text, yielding the updated schema and
/// rebuilt batches. The inputs are left untouched on error.
pub(crate) fn format_temporal_column(
    schema: &SchemaRef,
    batches: &[RecordBatch],
    column: &str,
    format: Option<&str>,
) -> Result<(SchemaRef, Vec<RecordBatch>), ConvertError> {
    let index = schema
        .fields()
        .iter()
        .position(|field| field.name() == column)
        .ok_or_else(|| ConvertError::UnknownColumn {
            column: column.to_string(),
            available: schema.fields().iter().map(|f| f.name().clone()).collect(),
        })?;

    let data_type = schema.field(index).data_type().clone();
    if !is_temporal(&data_type) {
        return Err(ConvertError::InvalidColumnType {
            column: column.to_string(),
            observed: format!("{data_type:?}"),
        });
    }

    let format = format.ok_or_else(|| ConvertError::MissingFormat {
        column: column.to_string(),
    })?;

    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(ConvertError::InvalidFormat {
            format: format.to_string(),
        });
    }

    let mut fields: Vec<FieldRef> = schema.fields().iter().cloned().collect();
    fields[index] = Arc::new(Field::new(column, DataType::Utf8, true));
    let rendered_schema: SchemaRef =
        Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()));

    let mut rendered_batches = Vec::with_capacity(batches.len());
    for batch in batches {
        let rendered = render_array(batch.column(index), &data_type, &items, format)?;
        let mut columns = batch.columns().to_vec();
        columns[index] = Arc::new(rendered) as ArrayRef;
        rendered_batches.push(RecordBatch::try_new(rendered_schema.clone(), columns)?);
    }

    Ok((rendered_schema, rendered_batches))
}

fn is_temporal(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _)
    )
}

fn render_array(
    array: &ArrayRef,
    data_type: &DataType,
    items: &[Item<'_>],
    format: &str,
) -> Result<StringArray, ConvertError> {
    let mut builder = StringBuilder::new();
    for row in 0..array.len() {
        if array.is_null(row) {
            builder.append_null();
            continue;
        }
        match temporal_value(array, data_type, row) {
            Some(value) => {
                let mut rendered = String::new();
                // Directives like %z parse but cannot render for naive
                // values; the fmt error surfaces here instead of panicking
                // in Display.
                if write!(rendered, "{}", value.format_with_items(items.iter())).is_err() {
                    return Err(ConvertError::InvalidFormat {
                        format: format.to_string(),
                    });
                }
                builder.append_value(rendered);
            }
            // Values outside the representable datetime range become null
            None => builder.append_null(),
        }
    }
    Ok(builder.finish())
}

/// Read one value as a naive datetime. Dates map to midnight; timezone-aware
/// timestamps yield their UTC wall clock.
fn temporal_value(array: &ArrayRef, data_type: &DataType, row: usize) -> Option<NaiveDateTime> {
    match data_type {
        DataType::Date32 => array
            .as_any()
            .downcast_ref::<Date32Array>()?
            .value_as_datetime(row),
        DataType::Date64 => array
            .as_any()
            .downcast_ref::<Date64Array>()?
            .value_as_datetime(row),
        DataType::Timestamp(TimeUnit::Second, _) => array
            .as_any()
            .downcast_ref::<TimestampSecondArray>()?
            .value_as_datetime(row),
        DataType::Timestamp(TimeUnit::Millisecond, _) => array
            .as_any()
            .downcast_ref::<TimestampMillisecondArray>()?
            .value_as_datetime(row),
        DataType::Timestamp(TimeUnit::Microsecond, _) => array
            .as_any()
            .downcast_ref::<TimestampMicrosecondArray>()?
            .value_as_datetime(row),
        DataType::Timestamp(TimeUnit::Nanosecond, _) => array
            .as_any()
            .downcast_ref::<TimestampNanosecondArray>()?
            .value_as_datetime(row),
        _ => None,
    }
}
