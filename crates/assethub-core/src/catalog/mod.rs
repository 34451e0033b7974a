//! Catalog store: the system of record for assets, tags and categories.

mod store;
mod types;

pub use store::CatalogStore;
pub use types::{
    asset_id_for_path, asset_id_for_remote, Asset, AssetKind, Category, CategoryNode, Tag,
    UpsertOutcome, LOCAL_SOURCE,
};
