mod category;
mod filters;
mod money;
mod period;
mod query;
mod summary;
mod transaction;
mod unit;
mod view;

pub use category::*;
pub use filters::*;
pub use money::*;
pub use period::*;
pub use query::*;
pub use summary::*;
pub use transaction::*;
pub use unit::*;
pub use view::*;
