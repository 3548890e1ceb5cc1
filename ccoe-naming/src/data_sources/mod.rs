pub mod data_source_resources;

pub use data_source_resources::ResourcesDataSource;
