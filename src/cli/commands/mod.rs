pub mod evaluate;
pub mod route;
