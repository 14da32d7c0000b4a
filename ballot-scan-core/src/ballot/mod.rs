pub mod book;
pub mod validator;
