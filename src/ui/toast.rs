/// Non-blocking toast notifications
///
/// `Toasts` is a small queue; the app schedules each toast's expiry with a
/// timer task when it is pushed.
use iced::widget::{button, column, container, row, text, Column};
use iced::{Border, Element, Length, Theme};
use std::time::Duration;

use crate::Message;

/// How long a toast stays on screen
pub const TOAST_DURATION: Duration = Duration::from_secs(5);

/// Older toasts are dropped beyond this many
const MAX_VISIBLE: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Default)]
pub struct Toasts {
    items: Vec<Toast>,
    next_id: u64,
}

impl Toasts {
    /// Show a toast; returns its id for the expiry timer
    pub fn push(&mut self, title: impl Into<String>, body: impl Into<String>) -> u64 {
        self.next_id += 1;
        self.items.push(Toast {
            id: self.next_id,
            title: title.into(),
            body: body.into(),
        });

        if self.items.len() > MAX_VISIBLE {
            self.items.remove(0);
        }

        self.next_id
    }

    /// Remove a toast (expired or closed). Unknown ids are ignored.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|toast| toast.id != id);
        self.items.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Stack of error toasts, newest last
pub fn view(toasts: &Toasts) -> Element<'_, Message> {
    let cards = toasts.iter().map(|toast| {
        let content = row![
            column![text(&toast.title).size(16), text(&toast.body).size(14)]
                .spacing(4)
                .width(Length::Fill),
            button(text("×").size(16))
                .on_press(Message::DismissToast(toast.id))
                .style(button::text),
        ]
        .spacing(12);

        container(content)
            .padding(12)
            .width(Length::Fixed(360.0))
            .style(|theme: &Theme| {
                let pair = theme.extended_palette().danger.base;
                container::Style {
                    text_color: Some(pair.text),
                    background: Some(pair.color.into()),
                    border: Border {
                        radius: 8.0.into(),
                        ..Border::default()
                    },
                    ..container::Style::default()
                }
            })
            .into()
    });

    Column::with_children(cards).spacing(8).into()
}
