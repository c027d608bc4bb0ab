/// Before/after comparison view
/// Shows the original and the transformed image in two equal columns
use iced::widget::image::Handle;
use iced::widget::{column, image, row, text};
use iced::{Alignment, Element, Length};

use crate::state::data::{ComparisonResult, ImageSide};
use crate::Message;

/// Image handles are built once per result; rebuilding them in `view`
/// would re-upload the textures every frame
#[derive(Debug, Clone)]
pub struct Comparison {
    original: Handle,
    transformed: Handle,
    original_caption: String,
    transformed_caption: String,
}

impl Comparison {
    pub fn new(result: &ComparisonResult) -> Self {
        Self {
            original: handle(&result.original),
            transformed: handle(&result.transformed),
            original_caption: caption("Original Image", &result.original),
            transformed_caption: caption("Transformed Image", &result.transformed),
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        column![
            text("Compare Images").size(28),
            row![
                captioned(&self.original, &self.original_caption),
                captioned(&self.transformed, &self.transformed_caption),
            ]
            .spacing(20)
            .width(Length::Fill),
        ]
        .spacing(12)
        .into()
    }
}

pub fn handle(side: &ImageSide) -> Handle {
    Handle::from_bytes(side.bytes.clone())
}

pub fn caption(label: &str, side: &ImageSide) -> String {
    format!("{} ({}×{})", label, side.width, side.height)
}

/// Image filling its column with a caption underneath
pub fn captioned<'a>(handle: &Handle, caption: &'a str) -> Element<'a, Message> {
    column![
        image(handle.clone()).width(Length::Fill),
        text(caption).size(14),
    ]
    .spacing(6)
    .width(Length::FillPortion(1))
    .align_x(Alignment::Center)
    .into()
}
