pub mod category;
pub mod product;
pub mod subcategory;
pub mod user;

pub use category::Category;
pub use product::Product;
pub use subcategory::Subcategory;
pub use user::User;
