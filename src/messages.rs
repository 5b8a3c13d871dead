//! User-facing response strings.

pub const WELCOME: &str = "Welcome to my Todo App";

pub const USER_EXISTS: &str = "User already exists";
pub const USER_CREATED: &str = "User created successfully!";
pub const USER_CONFIRMED: &str = "User confirmed successfully!";
pub const USER_ALREADY_CONFIRMED: &str = "User already confirmed";
pub const USER_NOT_CONFIRMED: &str = "User not confirmed";
pub const USER_INVALID: &str = "Invalid user id";
pub const USER_UPDATED: &str = "User updated successfully!";
pub const USER_DELETED: &str = "User deleted successfully!";
pub const USER_CONFIRMATION_SENT_AGAIN: &str = "Confirmation mail sent again";
pub const CONFIRMATION_INVALID: &str = "Not valid request";

pub const PASSWORD_RECOVERY_MAIL_SENT: &str = "Password recovery mail sent";
pub const PASSWORD_RECOVERY_ERROR: &str = "Password recovery error";
pub const PASSWORD_UPDATED: &str = "Password updated successfully!";
pub const WRONG_PASSWORD: &str = "Wrong password";
pub const MISSING_EMAIL: &str = "Missing email";

pub const TASK_CREATED: &str = "Task created successfully!";
pub const TASK_NOT_FOUND: &str = "No todo found!";
pub const TASK_INVALID: &str = "Invalid todo id";
pub const TASK_UPDATED: &str = "Task updated successfully!";
pub const TASK_DELETED: &str = "Task deleted successfully!";
pub const TASK_UNAUTHORIZED: &str = "You are not allowed to access this todo";

pub const MISSING_AUTH_TYPE: &str = "Missing auth type";
pub const INVALID_AUTH_TYPE: &str = "Not valid auth type";
pub const MISSING_LOGIN_VALUES: &str = "missing Username or Password";
pub const FAILED_AUTHENTICATION: &str = "incorrect Username or Password";
pub const MISSING_TOKEN: &str = "auth header is empty";
pub const TOKEN_EXPIRED: &str = "token is expired";
pub const PERMISSION_DENIED: &str = "you don't have permission to access this resource";
pub const OAUTH_DISABLED: &str = "OAuth login is not configured";
pub const OAUTH_STATE_MISMATCH: &str = "OAuth state does not match";

pub const MAIL_SEND_FAILED: &str = "Failed to send mail";
