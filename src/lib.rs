// src/lib.rs

//! novel-dl Library
//!
//! Finds a novel on its catalog site and downloads every chapter into a
//! single text file with concurrent workers.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod session;
pub mod storage;
pub mod utils;
