pub mod action;
pub mod expr;
