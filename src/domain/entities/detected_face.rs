//! Detected Face Entity
//!
//! Transient per-frame detection: a bounding box, its embedding once
//! computed, and the cropped image used for sharpness scoring and quality
//! collection. Lives only for the duration of one frame's processing.

use crate::domain::value_objects::{BoundingBox, FaceEmbedding};

/// A single face detected within one frame, prior to tracker classification.
#[derive(Debug, Clone)]
pub struct DetectedFace {
    bounding_box: BoundingBox,
    confidence: f32,
    embedding: Option<FaceEmbedding>,
    cropped_image: Option<Vec<u8>>,
    sharpness: Option<f32>,
}

impl DetectedFace {
    /// Creates a new detected face from a raw bounding box and confidence.
    pub fn new(bounding_box: BoundingBox, confidence: f32) -> Self {
        Self {
            bounding_box,
            confidence,
            embedding: None,
            cropped_image: None,
            sharpness: None,
        }
    }

    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bounding_box
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn embedding(&self) -> Option<&FaceEmbedding> {
        self.embedding.as_ref()
    }

    pub fn cropped_image(&self) -> Option<&[u8]> {
        self.cropped_image.as_deref()
    }

    pub fn sharpness(&self) -> Option<f32> {
        self.sharpness
    }

    /// Sets the face embedding computed by the external embedder.
    pub fn set_embedding(&mut self, embedding: FaceEmbedding) {
        self.embedding = Some(embedding);
    }

    /// Sets the cropped face image, encoded by the caller (PNG recommended).
    pub fn set_cropped_image(&mut self, image: Vec<u8>) {
        self.cropped_image = Some(image);
    }

    /// Sets the sharpness score computed by the external quality metric.
    pub fn set_sharpness(&mut self, sharpness: f32) {
        self.sharpness = Some(sharpness);
    }

    /// True once this face carries an embedding, a crop, and a sharpness
    /// score — the point at which the tracker core may classify it.
    pub fn is_ready_for_tracking(&self) -> bool {
        self.embedding.is_some() && self.cropped_image.is_some() && self.sharpness.is_some()
    }
}

/// A frame's raw detections, prior to per-face tracking.
#[derive(Debug, Clone)]
pub struct FrameDetections {
    source_id: String,
    frame_number: u64,
    timestamp_ms: i64,
    faces: Vec<DetectedFace>,
}

impl FrameDetections {
    /// Creates a new, empty frame detection result.
    pub fn new(source_id: impl Into<String>, frame_number: u64, timestamp_ms: i64) -> Self {
        Self {
            source_id: source_id.into(),
            frame_number,
            timestamp_ms,
            faces: Vec::new(),
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    pub fn faces(&self) -> &[DetectedFace] {
        &self.faces
    }

    pub fn faces_mut(&mut self) -> &mut Vec<DetectedFace> {
        &mut self.faces
    }

    /// Adds a detected face to this frame, in detector-returned order.
    pub fn add_face(&mut self, face: DetectedFace) {
        self.faces.push(face);
    }

    /// Returns the number of faces detected in this frame.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Returns true if any faces were detected in this frame.
    pub fn has_faces(&self) -> bool {
        !self.faces.is_empty()
    }
}
