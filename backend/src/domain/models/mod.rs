pub mod expense;
pub mod owner;
pub mod salary;
pub mod user;
