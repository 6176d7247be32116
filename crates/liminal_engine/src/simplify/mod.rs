//! Simplification: local rules, canonicalization passes and the search
//! driver that stitches them into a bounded best-of search.

mod driver;
mod expand;
mod factor;
mod passes;
mod rules;
