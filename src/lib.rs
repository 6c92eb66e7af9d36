pub mod app;
pub mod avatars;
pub mod config;
pub mod fandub;
pub mod genres;
pub mod tmdb;
