//! Gabi - content backend for the Gabi Club website
//!
//! This library provides the blog, camps, trainings schedule, contact
//! information and lead intake behind the club site, plus a JSON admin
//! interface for editors.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
