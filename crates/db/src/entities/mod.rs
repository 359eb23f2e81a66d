//! `SeaORM` entity definitions.

pub mod applications;
pub mod messages;
pub mod sea_orm_active_enums;
pub mod transactions;
pub mod users;
pub mod vacancies;
pub mod zzp_profiles;
