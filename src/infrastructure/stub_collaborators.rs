//! Stub Collaborators (§6 interface-only boundary)
//!
//! `FrameSource`, `FaceDetector`, `FaceEmbedder`, `FrameCropper`, and
//! `SharpnessMetric` have no mandated production backend. These minimal
//! defaults let the binary link and run end to end; a real CV backend is
//! plugged in by swapping the trait object passed to the composition root.

use crate::domain::ports::{FaceDetector, FaceEmbedder, Frame, FrameCropper, FrameSource, SharpnessMetric};
use crate::domain::value_objects::{BoundingBox, FaceEmbedding, EMBEDDING_DIMENSION};

/// A frame source that never produces a frame. Swap in a real camera or
/// file/network reader to drive the pipeline.
pub struct NullFrameSource;

impl FrameSource for NullFrameSource {
    fn next_frame(&mut self) -> Option<Frame> {
        None
    }
}

/// A detector that reports no faces. Swap in a real model to drive
/// admission; without one the tracker never sees a detection.
pub struct NullFaceDetector;

impl FaceDetector for NullFaceDetector {
    fn detect(&self, _frame: &Frame) -> Vec<BoundingBox> {
        Vec::new()
    }
}

/// An embedder that returns the zero vector regardless of input. Every
/// detection looks identical to this embedder, so it is unsuitable for
/// recognition or duplicate suppression beyond exercising the pipeline.
pub struct ZeroFaceEmbedder;

impl FaceEmbedder for ZeroFaceEmbedder {
    fn embed(&self, _frame: &Frame, _bounding_box: &BoundingBox) -> FaceEmbedding {
        FaceEmbedding::new(vec![0.0; EMBEDDING_DIMENSION])
    }
}

/// Crops by taking the frame's raw pixel buffer as-is, ignoring the
/// bounding box. A real implementation decodes and crops actual image data.
pub struct PassthroughCropper;

impl FrameCropper for PassthroughCropper {
    fn crop(&self, frame: &Frame, _bounding_box: &BoundingBox) -> Vec<u8> {
        frame.pixels.clone()
    }
}

/// Scores sharpness as the variance of raw bytes. A real implementation
/// would compute a Laplacian variance over decoded grayscale pixels.
pub struct ByteVarianceSharpness;

impl SharpnessMetric for ByteVarianceSharpness {
    fn sharpness(&self, cropped_image: &[u8]) -> f32 {
        if cropped_image.is_empty() {
            return 0.0;
        }
        let mean = cropped_image.iter().map(|b| *b as f64).sum::<f64>() / cropped_image.len() as f64;
        let variance = cropped_image
            .iter()
            .map(|b| {
                let d = *b as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / cropped_image.len() as f64;
        variance as f32
    }
}
