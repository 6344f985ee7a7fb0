pub mod model;
pub mod repository;

pub use model::StoreState;
pub use repository::KeyValueStore;
