pub mod resolver;
pub mod visual;
