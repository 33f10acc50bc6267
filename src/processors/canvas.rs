//! Canvas: the end processor displaying a rendered image.

use crate::core::context::ProcessContext;
use crate::core::error::{ProcessError, ProcessResult};
use crate::core::port::{PortDefinition, PortKind};
use crate::core::processor::{Category, Processor, ProcessorMetadata};
use crate::core::property::Property;
use crate::core::types::Value;
use image::DynamicImage;
use std::sync::Arc;

/// Receives the final image of a network.
///
/// The canvas is processed in every pass. It publishes the size of the
/// received image through its `imageSize` property and optionally writes
/// a PNG snapshot.
#[derive(Debug, Clone, Default)]
pub struct Canvas {
    last: Option<Arc<DynamicImage>>,
    frames: u64,
}

impl Canvas {
    /// Image received in the last pass.
    pub fn last_image(&self) -> Option<&Arc<DynamicImage>> {
        self.last.as_ref()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Processor for Canvas {
    fn metadata(&self) -> ProcessorMetadata {
        ProcessorMetadata::builder("Canvas")
            .category(Category::Output)
            .description("Displays the rendered image")
            .inport(PortDefinition::inport("image.input", PortKind::RenderImage))
            .property(
                Property::new("imageSize", "Image Size", Value::IntVec2([0, 0]))
                    .with_bounds(Value::IntVec2([0, 0]), Value::IntVec2([16384, 16384])),
            )
            .property(Property::file("snapshot", "Snapshot File", ""))
            .end_processor()
            .build()
    }

    fn create(&self) -> Box<dyn Processor> {
        Box::new(Canvas::default())
    }

    fn deinitialize(&mut self) {
        self.last = None;
    }

    fn process(&mut self, ctx: &mut ProcessContext) -> ProcessResult<()> {
        let image = ctx.image("image.input")?;
        let size = [image.width() as i64, image.height() as i64];
        if ctx.property("imageSize")? != &Value::IntVec2(size) {
            ctx.request_property("imageSize", Value::IntVec2(size));
        }

        if let Some(path) = ctx.property("snapshot")?.as_path() {
            if !path.as_os_str().is_empty() {
                image
                    .save(path)
                    .map_err(|e| ProcessError::Failed(format!("snapshot {}: {}", path.display(), e)))?;
            }
        }

        self.frames += 1;
        self.last = Some(image);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::port::{Payload, Port};
    use image::RgbaImage;
    use indexmap::IndexMap;

    fn show(canvas: &mut Canvas, snapshot: Option<&std::path::Path>) -> Vec<(String, Value)> {
        let metadata = canvas.metadata();
        let mut properties: IndexMap<String, Property> = metadata
            .properties
            .iter()
            .map(|p| (p.id().to_string(), p.clone()))
            .collect();
        if let Some(path) = snapshot {
            properties["snapshot"].set(Value::FilePath(path.to_path_buf())).unwrap();
        }
        let mut ports: IndexMap<String, Port> = IndexMap::new();
        let mut inputs = IndexMap::new();
        let image = DynamicImage::ImageRgba8(RgbaImage::new(8, 4));
        inputs.insert("image.input".to_string(), vec![Payload::Image(Arc::new(image))]);

        let mut ctx = ProcessContext::new("Canvas", &properties, inputs, &mut ports);
        canvas.process(&mut ctx).unwrap();
        ctx.into_requests()
    }

    #[test]
    fn test_publishes_image_size() {
        let mut canvas = Canvas::default();
        let requests = show(&mut canvas, None);
        assert_eq!(requests, vec![("imageSize".to_string(), Value::IntVec2([8, 4]))]);
        assert_eq!(canvas.frames(), 1);
        assert_eq!(canvas.last_image().map(|i| i.width()), Some(8));

        canvas.deinitialize();
        assert!(canvas.last_image().is_none());
    }

    #[test]
    fn test_writes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        show(&mut Canvas::default(), Some(&path));

        let written = image::open(&path).unwrap();
        assert_eq!((written.width(), written.height()), (8, 4));
    }

    #[test]
    fn test_missing_input_fails() {
        let mut canvas = Canvas::default();
        let properties = IndexMap::new();
        let mut ports = IndexMap::new();
        let mut ctx = ProcessContext::new("Canvas", &properties, IndexMap::new(), &mut ports);
        assert!(canvas.process(&mut ctx).is_err());
    }
}
