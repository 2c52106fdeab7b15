pub mod cookie;
pub mod jwt;
pub mod password;
pub mod validate;
pub mod verification_code;
