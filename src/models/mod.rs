pub mod task;
pub mod user;

pub use task::{Task, TaskInput};
pub use user::{
    ConfirmQuery, DeleteUserRequest, EmailQuery, NewUser, PasswordRecoveryRequest, ProfileUpdate,
    RegisterRequest, UpdatePasswordRequest, UpdateUserRequest, User,
};
