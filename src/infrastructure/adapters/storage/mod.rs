//! Storage Adapters
//!
//! StorageAdapterPort 的实现：本地目录、Azure Blob、Cloudinary

mod azure_storage;
mod cloudinary_storage;
mod disabled_storage;
mod local_storage;
mod storage_factory;

pub use azure_storage::{parse_blob_url, AzureBlobStorage, AzureStorageConfig};
pub use cloudinary_storage::{
    parse_asset_url, sign_params, AssetLocator, CloudinaryConfig, CloudinaryStorage,
};
pub use disabled_storage::DisabledStorage;
pub use local_storage::LocalStorage;
pub use storage_factory::StorageFactory;
