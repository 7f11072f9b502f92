// Transdoc PDF Engine Infrastructure

mod extract;
mod font;
mod render;

pub use extract::LopdfExtractor;
pub use font::{FontFetcher, HttpFontFetcher};
pub use render::PrintpdfRenderer;
