//! Scripted page sources for testing collection without the Compute API.

mod pages;
mod scenarios;

pub use pages::MockPages;
