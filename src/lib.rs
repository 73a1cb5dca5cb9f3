time::serde::format_description!(pub(crate) iso_date, Date, "[year]-[month]-[day]");

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod ratings;
pub mod recipes;
pub mod state;
pub mod tags;
