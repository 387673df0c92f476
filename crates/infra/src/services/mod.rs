//! Application services over the record stores.

pub mod products;
pub mod users;

pub use products::ProductService;
pub use users::UserService;
