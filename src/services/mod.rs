pub mod conversation;
pub mod messaging;
pub mod password;
pub mod profile;
pub mod session;
pub mod signup;
