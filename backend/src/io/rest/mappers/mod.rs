pub mod expense_mapper;
pub mod salary_mapper;
pub mod summary_mapper;
pub mod user_mapper;
