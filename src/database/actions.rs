pub mod favorites;
pub mod ingredients;
pub mod recipes;
pub mod shopping_cart;
pub mod shopping_list;
pub mod subscriptions;
pub mod tags;
pub mod users;

pub use favorites::*;
pub use ingredients::*;
pub use recipes::*;
pub use shopping_cart::*;
pub use shopping_list::*;
pub use subscriptions::*;
pub use tags::*;
pub use users::*;
