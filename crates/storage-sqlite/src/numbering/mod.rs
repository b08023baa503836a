mod repository;

pub use repository::NumberingRepository;
