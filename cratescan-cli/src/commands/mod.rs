pub mod export;
pub mod folders;
pub mod login;
pub mod scan;
