//! Tabular preprocessing: encoders, column meta and table transformation.
//!
//! ```
//! use tabsim::preprocessing::{ColumnMeta, Encoder, RawTable, TableOptions, transform};
//!
//! let rows = vec![
//!     vec!["a".to_owned(), "b".to_owned()],
//!     vec!["s1".to_owned(), "1".to_owned()],
//!     vec!["s2".to_owned(), "0".to_owned()],
//! ];
//! let table = RawTable::from_rows(rows, true)?;
//! let options = TableOptions::new()
//!     .with_default(ColumnMeta::encoding(Encoder::one_hot()))
//!     .with_label("b");
//!
//! let encoded = transform(&table, &options)?;
//! assert_eq!(encoded.context_width(), 2);
//! # Ok::<(), tabsim::error::SimError>(())
//! ```

pub mod encoders;
pub mod meta;
pub mod table;

pub use encoders::{
    Encoded, Encoder, FactorEncoder, InferredEncoder, NumericEncoder, OneHotEncoder, Scalar,
    StringEncoder,
};
pub use meta::{ColumnKey, ColumnMeta, ColumnOverrides, ResolvedMeta, resolve_columns};
pub use table::{EncodedTable, RawTable, TableOptions, transform};
