/// Image acquisition view: drop zone with picker/camera buttons, or the live
/// camera preview while capturing
use iced::widget::{button, column, container, image, row, text};
use iced::{Alignment, Background, Border, Color, ContentFit, Element, Length, Theme};

use crate::acquire::Acquirer;
use crate::Message;

pub fn view<'a>(acquirer: &Acquirer, camera_preview: Option<&'a image::Handle>) -> Element<'a, Message> {
    if acquirer.is_capturing() {
        camera_view(camera_preview)
    } else {
        drop_zone(acquirer.is_dragging(), acquirer.is_loading_file())
    }
}

fn camera_view<'a>(preview: Option<&'a image::Handle>) -> Element<'a, Message> {
    let video: Element<'a, Message> = match preview {
        Some(handle) => image(handle.clone())
            .width(Length::Fill)
            .content_fit(ContentFit::Contain)
            .into(),
        None => container(text("Starting camera...").size(18))
            .center_x(Length::Fill)
            .center_y(Length::Fixed(320.0))
            .into(),
    };

    let controls = row![
        button(text("Capture").size(18))
            .on_press_maybe(preview.map(|_| Message::CaptureFrame))
            .padding([10, 24]),
        button(text("×").size(18))
            .on_press(Message::CancelCamera)
            .style(button::secondary)
            .padding([10, 16]),
    ]
    .spacing(16);

    container(
        column![video, controls]
            .spacing(16)
            .align_x(Alignment::Center),
    )
    .padding(16)
    .max_width(640)
    .style(container::rounded_box)
    .into()
}

fn drop_zone<'a>(dragging: bool, loading: bool) -> Element<'a, Message> {
    let buttons = row![
        button(text("Upload from Device").size(16))
            .on_press_maybe((!loading).then_some(Message::PickFile))
            .padding([10, 20]),
        button(text("Use Camera").size(16))
            .on_press_maybe((!loading).then_some(Message::StartCamera))
            .style(button::secondary)
            .padding([10, 20]),
    ]
    .spacing(16);

    let subtitle = if loading {
        "Reading image..."
    } else {
        "or choose one of the options below"
    };

    let content = column![
        text("⬆").size(48),
        text("Drag & Drop Image").size(28),
        text(subtitle).size(16).style(text::secondary),
        buttons,
    ]
    .spacing(12)
    .align_x(Alignment::Center);

    container(content)
        .padding(32)
        .max_width(576)
        .style(move |theme: &Theme| {
            let palette = theme.extended_palette();
            let (border_color, background) = if dragging {
                (
                    palette.primary.base.color,
                    Some(Background::Color(Color { a: 0.2, ..palette.primary.weak.color })),
                )
            } else {
                (palette.background.strong.color, None)
            };
            container::Style {
                background,
                border: Border {
                    color: border_color,
                    width: 2.0,
                    radius: 16.0.into(),
                },
                ..container::Style::default()
            }
        })
        .into()
}
