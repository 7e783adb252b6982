/// Species result view
///
/// Pure rendering of an `IdentificationResult` next to the photo it came from.
/// The derived flags (low confidence, venom badge) live in plain functions so
/// they can be tested without a renderer.
use iced::widget::{button, column, container, image, progress_bar, row, text, Space};
use iced::{Alignment, Border, ContentFit, Element, Length, Theme};

use crate::state::data::IdentificationResult;
use crate::Message;

/// Below this confidence the result gets a warning
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 70.0;

pub fn is_low_confidence(confidence: f64) -> bool {
    confidence < LOW_CONFIDENCE_THRESHOLD
}

/// Badge shown when the result says anything about venom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VenomBadge {
    Venomous,
    NonVenomous,
}

impl VenomBadge {
    /// No flag, no badge
    pub fn from_flag(venomous: Option<bool>) -> Option<Self> {
        venomous.map(|v| if v { VenomBadge::Venomous } else { VenomBadge::NonVenomous })
    }

    pub fn label(self) -> &'static str {
        match self {
            VenomBadge::Venomous => "Venomous",
            VenomBadge::NonVenomous => "Non-Venomous",
        }
    }
}

pub fn format_confidence(confidence: f64) -> String {
    format!("{:.1}%", confidence)
}

/// Titled detail cards, in display order
pub fn info_cards(result: &IdentificationResult) -> [(&'static str, &str); 5] {
    [
        ("Classification", result.species_classification.as_str()),
        ("Habitat", result.habitat.as_str()),
        ("Diet", result.diet.as_str()),
        ("Conservation Status", result.conservation_status.as_str()),
        ("Interesting Facts", result.interesting_facts.as_str()),
    ]
}

/// Full result page
pub fn view<'a>(
    result: &'a IdentificationResult,
    preview: Option<&'a image::Handle>,
    on_reset: Message,
) -> Element<'a, Message> {
    let photo: Element<'a, Message> = match preview {
        Some(handle) => image(handle.clone())
            .width(Length::Fixed(280.0))
            .height(Length::Fixed(280.0))
            .content_fit(ContentFit::Cover)
            .into(),
        None => container(text("Preview unavailable").size(14).style(text::secondary))
            .center_x(Length::Fixed(280.0))
            .center_y(Length::Fixed(280.0))
            .style(container::bordered_box)
            .into(),
    };

    let mut summary = column![
        text(&result.species_name).size(36),
        text(&result.scientific_name).size(18).style(text::secondary),
        Space::with_height(8),
        row![
            text("Confidence").size(16),
            Space::with_width(Length::Fill),
            text(format_confidence(result.confidence)).size(16).style(text::primary),
        ],
        progress_bar(0.0..=100.0, result.confidence as f32).height(8),
    ]
    .spacing(6);

    if let Some(badge) = VenomBadge::from_flag(result.venomous) {
        summary = summary.push(badge_view(badge));
    }

    let mut header = column![card(summary)].spacing(12).width(Length::Fill);

    if is_low_confidence(result.confidence) {
        header = header.push(low_confidence_warning());
    }

    let cards = info_cards(result);
    let [classification, habitat, diet, status, facts] = cards.map(|(title, body)| info_card(title, body));

    let details = column![
        row![classification, habitat].spacing(16),
        row![diet, status].spacing(16),
        facts,
    ]
    .spacing(16);

    column![
        row![photo, header].spacing(24).align_y(Alignment::Start),
        details,
        container(
            button(text("Identify Another Species").size(18))
                .on_press(on_reset)
                .padding([10, 24])
        )
        .center_x(Length::Fill),
    ]
    .spacing(24)
    .max_width(960)
    .into()
}

fn card<'a>(content: impl Into<Element<'a, Message>>) -> Element<'a, Message> {
    container(content)
        .padding(16)
        .width(Length::Fill)
        .style(container::bordered_box)
        .into()
}

fn info_card<'a>(title: &'static str, body: &'a str) -> Element<'a, Message> {
    card(column![text(title).size(18), text(body).size(15).style(text::secondary)].spacing(6))
}

fn badge_view<'a>(badge: VenomBadge) -> Element<'a, Message> {
    container(text(badge.label()).size(14))
        .padding([4, 10])
        .style(move |theme: &Theme| {
            let palette = theme.extended_palette();
            let pair = match badge {
                VenomBadge::Venomous => palette.danger.base,
                VenomBadge::NonVenomous => palette.success.base,
            };
            container::Style {
                text_color: Some(pair.text),
                background: Some(pair.color.into()),
                border: Border {
                    radius: 12.0.into(),
                    ..Border::default()
                },
                ..container::Style::default()
            }
        })
        .into()
}

fn low_confidence_warning<'a>() -> Element<'a, Message> {
    container(
        column![
            text("Low Confidence").size(16),
            text(
                "The identification confidence is low. For a more accurate result, \
                 please try a clearer, higher-quality image."
            )
            .size(14),
        ]
        .spacing(4),
    )
    .padding(12)
    .width(Length::Fill)
    .style(|theme: &Theme| {
        let danger = theme.extended_palette().danger.base;
        container::Style {
            text_color: Some(danger.color),
            border: Border {
                color: danger.color,
                width: 1.0,
                radius: 8.0.into(),
            },
            ..container::Style::default()
        }
    })
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_confidence_boundary() {
        assert!(is_low_confidence(69.9));
        assert!(!is_low_confidence(70.0));
        assert!(!is_low_confidence(99.0));
        assert!(is_low_confidence(0.0));
    }

    #[test]
    fn test_venom_badge() {
        assert_eq!(VenomBadge::from_flag(None), None);
        assert_eq!(VenomBadge::from_flag(Some(true)).map(VenomBadge::label), Some("Venomous"));
        assert_eq!(VenomBadge::from_flag(Some(false)).map(VenomBadge::label), Some("Non-Venomous"));
    }

    #[test]
    fn test_confidence_format() {
        assert_eq!(format_confidence(88.24), "88.2%");
        assert_eq!(format_confidence(70.0), "70.0%");
    }

    #[test]
    fn test_info_cards_order() {
        let result = IdentificationResult {
            species_name: "Fly Agaric".to_string(),
            scientific_name: "Amanita muscaria".to_string(),
            species_classification: "Fungi > Agaricales".to_string(),
            habitat: "Birch and pine woodland".to_string(),
            diet: "Mycorrhizal".to_string(),
            conservation_status: "Not Evaluated".to_string(),
            interesting_facts: "Iconic red cap with white spots.".to_string(),
            confidence: 91.0,
            venomous: None,
        };
        let titles: Vec<&str> = info_cards(&result).iter().map(|(title, _)| *title).collect();
        assert_eq!(
            titles,
            ["Classification", "Habitat", "Diet", "Conservation Status", "Interesting Facts"]
        );
        assert_eq!(info_cards(&result)[2].1, "Mycorrhizal");
    }
}
