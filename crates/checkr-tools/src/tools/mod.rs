pub mod add2;
pub mod echo;
pub mod secret;
