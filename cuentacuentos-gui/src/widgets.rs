use cuentacuentos_core::{PageAction, PageMarker, PaginationControl};
use iced::widget::{button, column, row, text};
use iced::{Alignment, Element};

/// Previous/next buttons around the page window, with the item range below.
/// Renders nothing when everything fits on one page.
pub fn pagination<'a, Message: Clone + 'a>(
    control: Option<PaginationControl>,
    on_action: impl Fn(PageAction) -> Message,
) -> Element<'a, Message> {
    let Some(control) = control else {
        return row![].into();
    };

    let mut buttons = row![
        button("‹ Prev")
            .on_press_maybe(control.has_previous.then(|| on_action(PageAction::Previous)))
            .style(button::secondary)
            .padding(5)
    ]
    .spacing(4)
    .align_y(Alignment::Center);

    for marker in &control.markers {
        buttons = buttons.push(match marker_action(marker) {
            None => Element::from(text(marker.to_string()).size(14)),
            // The current page stays clickable and only differs in style
            Some(action) => button(text(marker.to_string()))
                .on_press(on_action(action))
                .style(if control.is_current(marker) {
                    button::primary
                } else {
                    button::secondary
                })
                .padding(5)
                .into(),
        });
    }

    buttons = buttons.push(
        button("Next ›")
            .on_press_maybe(control.has_next.then(|| on_action(PageAction::Next)))
            .style(button::secondary)
            .padding(5),
    );

    column![buttons, text(format!("Showing {}", control.label())).size(12)]
        .spacing(4)
        .align_x(Alignment::Center)
        .into()
}

/// What pressing a marker sends. Ellipses are plain text and send nothing.
fn marker_action(marker: &PageMarker) -> Option<PageAction> {
    match marker {
        PageMarker::Page(_) => Some(PageAction::Select(*marker)),
        PageMarker::Ellipsis => None,
    }
}
