//! Acoustic transfer lists and CSV import/export for aliquot mixes.
//!
//! This crate provides:
//!
//! - **Transfer lists**: [`transfer_list`] projects the acoustic actions of a
//!   mix into one [`TransferRow`] per component transfer
//! - **CSV export**: [`write_transfer_csv`] and [`transfers_to_csv_string`]
//!   write those rows in the column layout acoustic dispensers import
//! - **Reference import**: [`read_reference_csv`] loads a plate reference table
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use aliquot_io::{transfer_list, write_transfer_csv};
//!
//! let rows = transfer_list(&mix)?;
//! write_transfer_csv("picklist.csv", &rows)?;
//! ```

mod reference_csv;
mod transfer;

pub use reference_csv::{ReferenceRecord, read_reference_csv, reference_from_reader};
pub use transfer::{
    CONCENTRATION_UNITS, TransferRow, transfer_list, transfers_to_csv_string, write_transfer_csv,
    write_transfers,
};

/// Error types for transfer-list and CSV operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// CSV read/write error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The mix could not be resolved.
    #[error(transparent)]
    Mix(#[from] aliquot_core::MixError),

    /// A reference row names a well that does not parse.
    #[error("invalid well '{value}' for '{name}': {source}")]
    InvalidWell {
        /// Component name on the row.
        name: String,
        /// The raw well text.
        value: String,
        /// Parser error.
        #[source]
        source: aliquot_core::WellError,
    },

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for transfer-list and CSV operations.
pub type Result<T> = std::result::Result<T, Error>;
