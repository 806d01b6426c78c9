pub mod credits;
pub mod ledger;
pub mod payment;
pub mod payment_method;
pub mod user;

pub use credits::*;
pub use ledger::*;
pub use payment::*;
pub use payment_method::*;
pub use user::*;
