use shared::UserProfile;

use crate::domain::models::salary::SalaryHistory;
use crate::domain::models::user::User;
use crate::io::rest::mappers::salary_mapper::SalaryMapper;

pub struct UserMapper;

impl UserMapper {
    /// Public view of a user; credentials never leave the backend
    pub fn to_profile(user: User, history: &SalaryHistory) -> UserProfile {
        UserProfile {
            id: user.id,
            username: user.username,
            salary: user.salary,
            monthly_salaries: SalaryMapper::to_dto_list(history),
        }
    }
}
