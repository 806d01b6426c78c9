pub mod admin;
pub mod methods;
pub mod payments;
pub mod quota;
pub mod root;
pub mod users;
