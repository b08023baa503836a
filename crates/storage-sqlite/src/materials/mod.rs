mod model;
mod repository;

pub use repository::MaterialRepository;
