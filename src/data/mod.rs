//! Data layer: core types, loading, and row filters.
//!
//! Architecture:
//! ```text
//!  .xlsx / .csv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → ProteinTable
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────────┐
//!   │ ProteinTable  │  named columns, ordered rows
//!   └──────────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  contaminants, MW cut-off → new ProteinTable
//!   └──────────┘
//! ```

pub mod loader;
pub mod model;
pub mod filter;
