//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod application;
pub mod ledger;
pub mod message;
pub mod profile;
pub mod user;
pub mod vacancy;

pub use application::{ApplicationError, ApplicationRepository, ApplicationWithVacancy};
pub use ledger::{LedgerError, LedgerRepository, PurchaseOutcome};
pub use message::MessageRepository;
pub use profile::{ProfileError, ProfileInput, ProfileRepository};
pub use user::UserRepository;
pub use vacancy::{CreateVacancyInput, VacancyError, VacancyRepository};
