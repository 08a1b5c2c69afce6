//! Card sheet layout, page compositing and duplex page ordering.

mod compose;
mod io;
pub mod layout;
mod merge;
mod types;

pub use compose::{RenderedPages, raster_to_pdf, render_page, render_page_raster, render_pages};
pub use io::save_pdf;
pub use layout::{LayoutConstants, PixelRect, mm_to_px};
pub use merge::{PairingPattern, copy_object_deep, merge_pages, page_order};
pub use types::*;
