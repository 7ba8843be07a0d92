// src/labels.rs
use std::borrow::Cow;

/// COCO category names in model output order. Must stay index-aligned with
/// the class ids the weights were trained on.
pub const COCO_CLASS_NAMES: [&str; 80] = [
    "person", "bicycle", "car", "motorbike", "aeroplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat",
    "dog", "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack",
    "umbrella", "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball",
    "kite", "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket",
    "bottle", "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple",
    "sandwich", "orange", "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair",
    "sofa", "pottedplant", "bed", "diningtable", "toilet", "tvmonitor", "laptop", "mouse",
    "remote", "keyboard", "cell phone", "microwave", "oven", "toaster", "sink", "refrigerator",
    "book", "clock", "vase", "scissors", "teddy bear", "hair drier", "toothbrush",
];

/// Read-only lookup from class id to display name.
#[derive(Debug, Clone, Copy)]
pub struct ClassNameTable {
    names: &'static [&'static str],
}

impl ClassNameTable {
    pub const fn coco() -> Self {
        Self {
            names: &COCO_CLASS_NAMES,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &'static [&'static str] {
        self.names
    }

    /// Ids outside the table get a placeholder rather than a panic.
    pub fn name(&self, class_id: usize) -> Cow<'static, str> {
        match self.names.get(class_id) {
            Some(name) => Cow::Borrowed(*name),
            None => Cow::Owned(format!("class {}", class_id)),
        }
    }
}

impl Default for ClassNameTable {
    fn default() -> Self {
        Self::coco()
    }
}
