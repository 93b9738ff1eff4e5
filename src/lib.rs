//! Static book gallery generator backed by an Airtable base.
//!
//! - `site`: build-time page generation (fetch → render → write).
//! - `assets`: cover image downloader.
//! - `fallback`: live renderer driven by a user-supplied token.

pub mod airtable;
pub mod assets;
pub mod config;
pub mod dom;
pub mod fallback;
pub mod page;
pub mod render;
pub mod site;
