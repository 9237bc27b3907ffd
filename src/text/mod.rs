//! Display-text normalization for catalog metadata.
//!
//! Remote catalogs disagree on casing, punctuation, and typography for the
//! same artist/album/title strings. Everything that is stored, displayed, or
//! compared as free text is funneled through [`normalize`] first so that
//! heterogeneous spellings become comparable.

pub mod normalizer;

pub use normalizer::normalize;
