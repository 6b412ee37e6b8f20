//! Store traits for the dairy operations core, with an in-memory reference
//! backend, a conformance suite, and a REST client backend (feature `http`).

mod auth;
pub mod conformance;
mod error;
pub mod memory;
mod traits;

#[cfg(feature = "http")]
pub mod http;

pub use auth::BearerToken;
pub use error::{FieldErrors, StoreError};
pub use memory::{
    MemoryAccountStore, MemoryCatalog, MemoryExportService, MemoryRecordStore, StoreCall,
};
pub use traits::{
    Account, AccountStore, CatalogKind, EntityCatalog, ExportFile, ExportService, ListHints,
    RecordStore,
};
