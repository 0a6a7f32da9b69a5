//! Query results and post-processing.
//!
//! This module holds the collected result table returned by a query and the
//! temporal column rendering applied on top of it.
//!
//! # Overview
//!
//! The query module is organized into:
//! - `results` - Collected result tables over Arrow record batches
//! - `convert` - Temporal column rendering (crate internal)
//!
//! # Example
//!
//! ```no_run
//! use lakeflight::{ConnectionParams, Session};
//!
//! # async fn example() -> Result<(), lakeflight::LakeflightError> {
//! # let params = ConnectionParams::builder().username("u").password("p").build()?;
//! let mut session = Session::new(params);
//! let mut table = session.query("SELECT * FROM samples.employees", None, None).await?;
//!
//! println!("{} rows, columns: {:?}", table.num_rows(), table.column_names());
//!
//! // Render a temporal column as text after the fact
//! table.format_temporal("hire_date", Some("%Y-%m-%d"))?;
//! # Ok(())
//! # }
//! ```

pub(crate) mod convert;
pub mod results;

// Re-export commonly used types
pub use results::ResultTable;
