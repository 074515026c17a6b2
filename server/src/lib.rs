pub mod auth;
pub mod cloudinary;
pub mod config;
pub mod db;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod models;
pub mod startup;
pub mod state;
