//! Built-in processors of the `base` module.

mod canvas;
mod colormap;
mod filters;
mod source;
mod volume;

pub use canvas::Canvas;
pub use colormap::{ColorMap, Colorize};
pub use filters::{Blur, Sharpen};
pub use source::{ImageSource, VolumeSource};
pub use volume::VolumeMip;

use crate::core::processor::Processor;

/// Prototypes of all built-in processors.
pub fn builtin() -> Vec<Box<dyn Processor>> {
    vec![
        Box::new(ImageSource),
        Box::new(VolumeSource),
        Box::new(Blur),
        Box::new(Sharpen),
        Box::new(ColorMap),
        Box::new(Colorize),
        Box::new(VolumeMip),
        Box::new(Canvas::default()),
    ]
}
