//! Transport backends for the inventory store and the image catalog.
//!
//! The check only ever talks to these traits. In-memory backends serve tests
//! and dry runs; HTTP backends speak the JSON gateway protocol.

mod http;
mod memory;
mod traits;

pub use http::{HttpCatalog, HttpInventory};
pub use memory::{InMemoryCatalog, InMemoryInventory};
pub use traits::{ImageCatalog, InventoryStore, ListPage};
