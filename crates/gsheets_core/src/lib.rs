pub mod arrays;
pub mod grid;
pub mod locator;
pub mod scan;
pub mod schema;
pub mod values;
