pub mod admin;
pub mod handlers;
pub mod sadmin;
pub mod site;
