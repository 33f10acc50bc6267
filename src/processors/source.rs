//! Data sources: synthetic images and volumes.

use crate::core::context::ProcessContext;
use crate::core::error::ProcessResult;
use crate::core::port::{Payload, PortDefinition, PortKind, Volume};
use crate::core::processor::{Category, Processor, ProcessorMetadata};
use crate::core::property::Property;
use crate::core::types::Value;
use image::{DynamicImage, Rgba, RgbaImage};
use std::sync::Arc;

/// Generates a test image.
#[derive(Debug, Clone, Default)]
pub struct ImageSource;

impl Processor for ImageSource {
    fn metadata(&self) -> ProcessorMetadata {
        ProcessorMetadata::builder("ImageSource")
            .category(Category::Source)
            .description("Generates a solid, checkerboard or gradient image")
            .outport(
                PortDefinition::outport("image.output", PortKind::RenderImage)
                    .with_description("Generated image"),
            )
            .property(Property::int("width", "Width", 64, 1, 4096))
            .property(Property::int("height", "Height", 64, 1, 4096))
            .property(
                Property::new("color", "Color", Value::IntVec4([255, 255, 255, 255]))
                    .with_bounds(Value::IntVec4([0; 4]), Value::IntVec4([255; 4])),
            )
            .property(Property::option(
                "pattern",
                "Pattern",
                &[
                    ("solid", "Solid"),
                    ("checker", "Checkerboard"),
                    ("gradient", "Gradient"),
                ],
                "solid",
            ))
            .tags(["generator", "test"])
            .build()
    }

    fn create(&self) -> Box<dyn Processor> {
        Box::new(ImageSource)
    }

    fn process(&mut self, ctx: &mut ProcessContext) -> ProcessResult<()> {
        let width = ctx.int("width")? as u32;
        let height = ctx.int("height")? as u32;
        let [r, g, b, a] = ctx.int_vec4("color")?.map(|c| c as u8);
        let color = Rgba([r, g, b, a]);

        let image = match ctx.string("pattern")? {
            "checker" => RgbaImage::from_fn(width, height, |x, y| {
                if (x / 8 + y / 8) % 2 == 0 {
                    color
                } else {
                    Rgba([0, 0, 0, a])
                }
            }),
            "gradient" => RgbaImage::from_fn(width, height, |x, _| {
                let t = x as f32 / width.max(2).saturating_sub(1) as f32;
                let scale = |c: u8| (c as f32 * t).round().min(255.0) as u8;
                Rgba([scale(r), scale(g), scale(b), a])
            }),
            _ => RgbaImage::from_pixel(width, height, color),
        };

        ctx.set_image("image.output", DynamicImage::ImageRgba8(image))
    }
}

/// Generates a synthetic volume.
#[derive(Debug, Clone, Default)]
pub struct VolumeSource;

impl Processor for VolumeSource {
    fn metadata(&self) -> ProcessorMetadata {
        ProcessorMetadata::builder("VolumeSource")
            .category(Category::Source)
            .description("Generates a sphere or ramp volume")
            .outport(PortDefinition::outport("volume.output", PortKind::Volume))
            .property(
                Property::new("dimensions", "Dimensions", Value::IntVec3([16, 16, 16]))
                    .with_bounds(Value::IntVec3([1; 3]), Value::IntVec3([256; 3])),
            )
            .property(Property::option(
                "shape",
                "Shape",
                &[("sphere", "Sphere"), ("ramp", "Ramp")],
                "sphere",
            ))
            .tags(["generator", "volume"])
            .build()
    }

    fn create(&self) -> Box<dyn Processor> {
        Box::new(VolumeSource)
    }

    fn process(&mut self, ctx: &mut ProcessContext) -> ProcessResult<()> {
        let dims = match ctx.property("dimensions")? {
            Value::IntVec3(d) => d.map(|c| c.max(1) as usize),
            _ => [1, 1, 1],
        };
        let sphere = ctx.string("shape")? == "sphere";

        let mut voxels = Vec::with_capacity(dims.iter().product());
        let center = dims.map(|d| (d as f32 - 1.0) / 2.0);
        let radius = center.iter().copied().fold(f32::MAX, f32::min).max(0.5);
        for z in 0..dims[2] {
            for y in 0..dims[1] {
                for x in 0..dims[0] {
                    voxels.push(if sphere {
                        let d = [x as f32 - center[0], y as f32 - center[1], z as f32 - center[2]];
                        let dist = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
                        (1.0 - dist / radius).max(0.0)
                    } else {
                        z as f32 / (dims[2].max(2) - 1) as f32
                    });
                }
            }
        }

        let volume = Volume::from_voxels(dims, voxels)?;
        ctx.set_output("volume.output", Payload::Volume(Arc::new(volume)))
    }
}
