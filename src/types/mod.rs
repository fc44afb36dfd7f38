pub mod forecast;
pub mod history;
pub mod price;

pub use forecast::*;
pub use history::*;
pub use price::*;
