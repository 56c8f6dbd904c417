pub mod mail;
pub mod webutils;
