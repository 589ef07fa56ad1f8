mod memory_store;
mod models;
mod schema;
mod store;
mod trait_def;

pub use memory_store::{MemoryTables, MemoryWarehouseStore};
pub use models::*;
pub use schema::WAREHOUSE_VERSIONED_SCHEMAS;
pub use store::SqliteWarehouseStore;
pub use trait_def::{SongLookup, WarehouseStore};
