use crate::api::{Character, Lesson, Story};
use crate::pagination::{PageMarker, PaginationControl};
use time::OffsetDateTime;

pub const PREVIEW_CHARS: usize = 150;

/// First 150 characters of a story, with `...` when it was cut.
pub fn story_preview(content: &str) -> String {
    let mut chars = content.chars();
    let preview: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

pub fn format_date(date: &OffsetDateTime) -> String {
    format!(
        "{:02}/{:02}/{} {:02}:{:02}",
        date.day(),
        u8::from(date.month()),
        date.year(),
        date.hour(),
        date.minute()
    )
}

/// One library entry: title, date and version on the first line, preview below.
pub fn story_card(story: &Story) -> String {
    format!(
        "{}  ({} · v{})\n    {}",
        story.title,
        format_date(&story.created_at),
        story.version,
        story_preview(&story.content).replace('\n', " ")
    )
}

pub fn character_line(character: &Character) -> String {
    format!(
        "{} - {}",
        character.name,
        character.apparent_age.as_deref().unwrap_or("Character")
    )
}

pub fn lesson_line(lesson: &Lesson) -> String {
    let id = lesson
        .lesson_id
        .map(|id| format!("#{} ", id))
        .unwrap_or_default();
    format!(
        "{}[{}|{}|{}] {}",
        id, lesson.category, lesson.priority, lesson.status, lesson.insight
    )
}

/// Text rendering of a pagination control, the current page in brackets.
pub fn render_control(control: &PaginationControl) -> String {
    let markers: Vec<String> = control
        .markers
        .iter()
        .map(|marker| match marker {
            PageMarker::Page(_) if control.is_current(marker) => format!("[{}]", marker),
            _ => marker.to_string(),
        })
        .collect();

    let prev = if control.has_previous { "← Prev" } else { "      " };
    let next = if control.has_next { "Next →" } else { "" };

    format!(
        "Showing {}\n{}  {}  {}",
        control.label(),
        prev,
        markers.join(" "),
        next
    )
    .trim_end()
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Month};

    #[test]
    fn test_story_preview_cuts_long_text() {
        let long = "a".repeat(200);
        let preview = story_preview(&long);
        assert_eq!(preview.len(), 153);
        assert!(preview.ends_with("..."));

        assert_eq!(story_preview("short tale"), "short tale");
        assert_eq!(story_preview(&"b".repeat(150)), "b".repeat(150));
    }

    #[test]
    fn test_story_preview_counts_characters_not_bytes() {
        let text = "ñ".repeat(151);
        let preview = story_preview(&text);
        assert_eq!(preview.chars().count(), 153);
    }

    #[test]
    fn test_format_date() {
        let date = Date::from_calendar_date(2024, Month::May, 1)
            .unwrap()
            .with_hms(9, 5, 0)
            .unwrap()
            .assume_utc();
        assert_eq!(format_date(&date), "01/05/2024 09:05");
    }

    #[test]
    fn test_render_control() {
        let control = PaginationControl::from_parts(5, 10, 120, 12).unwrap();
        assert_eq!(
            render_control(&control),
            "Showing 49-60 of 120\n← Prev  1 … 4 [5] 6 … 10  Next →"
        );

        let first = PaginationControl::from_parts(1, 3, 25, 12).unwrap();
        assert_eq!(
            render_control(&first),
            "Showing 1-12 of 25\n        [1] 2 3  Next →"
        );

        let last = PaginationControl::from_parts(3, 3, 25, 12).unwrap();
        assert_eq!(render_control(&last), "Showing 25-25 of 25\n← Prev  1 2 [3]");
    }

    #[test]
    fn test_lesson_line() {
        let lesson = Lesson {
            lesson_id: Some(3),
            insight: "Vary sentence length".to_string(),
            category: "pacing".to_string(),
            priority: "high".to_string(),
            status: "active".to_string(),
            ..Default::default()
        };
        assert_eq!(lesson_line(&lesson), "#3 [pacing|high|active] Vary sentence length");
    }
}
