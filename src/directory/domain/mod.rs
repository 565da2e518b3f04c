//! Domain model for users, roles, and their scheduling preferences.

mod error;
mod ids;
mod role;
mod user;

pub use error::DirectoryDomainError;
pub use ids::{RoleId, UserId};
pub use role::Role;
pub use user::{PersistedUserData, Timezone, User, WorkHours};
