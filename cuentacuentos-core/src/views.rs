//! Paged list views. Each one owns its current page and resets it to 1
//! whenever its items are reloaded or its filters change.

use crate::api::{ApiClient, Lesson, LessonList, LessonStatus, Story};
use crate::error::ClientError;
use crate::pagination::{PageAction, PaginatedView, PaginationControl};
use log::info;

pub const LIBRARY_PAGE_SIZE: usize = 12;
pub const LIBRARY_FETCH_LIMIT: usize = 50;
pub const LESSONS_PAGE_SIZE: usize = 8;

/// Saved stories, 12 per page.
#[derive(Debug, Clone)]
pub struct LibraryView {
    stories: PaginatedView<Story>,
}

impl LibraryView {
    pub fn new() -> Self {
        Self {
            stories: PaginatedView::empty(LIBRARY_PAGE_SIZE),
        }
    }

    pub async fn load(&mut self, client: &ApiClient) -> Result<(), ClientError> {
        let stories = client.stories(LIBRARY_FETCH_LIMIT).await?;
        info!("Library loaded: {} stories", stories.len());
        self.set_stories(stories);
        Ok(())
    }

    pub fn set_stories(&mut self, stories: Vec<Story>) {
        self.stories.set_items(stories);
    }

    pub fn stories(&self) -> &PaginatedView<Story> {
        &self.stories
    }

    pub fn current_stories(&self) -> &[Story] {
        self.stories.current_items()
    }

    /// The server returns newest first.
    pub fn latest(&self) -> Option<&Story> {
        self.stories.items().first()
    }

    pub fn summary(&self) -> String {
        match self.stories.len() {
            1 => "1 story created".to_string(),
            n => format!("{} stories created", n),
        }
    }

    pub fn control(&self) -> Option<PaginationControl> {
        self.stories.control()
    }

    pub fn on_page_change(&mut self, page: usize) {
        self.stories.go_to(page);
    }

    pub fn apply(&mut self, action: PageAction) -> bool {
        self.stories.apply(action)
    }
}

impl Default for LibraryView {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonFilter {
    pub category: Option<String>,
    pub status: Option<LessonStatus>,
}

/// Learned lessons, 8 per page, filtered by category and status.
#[derive(Debug, Clone)]
pub struct LessonsView {
    lessons: PaginatedView<Lesson>,
    filter: LessonFilter,
    total_all: Option<usize>,
}

impl LessonsView {
    pub fn new() -> Self {
        Self {
            lessons: PaginatedView::empty(LESSONS_PAGE_SIZE),
            filter: LessonFilter::default(),
            total_all: None,
        }
    }

    pub fn filter(&self) -> &LessonFilter {
        &self.filter
    }

    /// Returns whether the filter changed, in which case the caller reloads.
    pub fn set_category(&mut self, category: Option<String>) -> bool {
        let category = category.filter(|c| !c.trim().is_empty());
        if self.filter.category == category {
            return false;
        }
        self.filter.category = category;
        self.lessons.reset_page();
        true
    }

    pub fn set_status(&mut self, status: Option<LessonStatus>) -> bool {
        if self.filter.status == status {
            return false;
        }
        self.filter.status = status;
        self.lessons.reset_page();
        true
    }

    pub async fn load(&mut self, client: &ApiClient) -> Result<(), ClientError> {
        let list = client
            .lessons(self.filter.category.as_deref(), self.filter.status)
            .await?;
        info!("Lessons loaded: {}", list.lessons.len());
        self.set_lessons(list);
        Ok(())
    }

    pub fn set_lessons(&mut self, list: LessonList) {
        self.total_all = list.total_all;
        self.lessons.set_items(list.lessons);
    }

    pub fn lessons(&self) -> &PaginatedView<Lesson> {
        &self.lessons
    }

    pub fn current_lessons(&self) -> &[Lesson] {
        self.lessons.current_items()
    }

    /// Lesson count before filtering, when the server reports it.
    pub fn total_all(&self) -> Option<usize> {
        self.total_all
    }

    pub fn control(&self) -> Option<PaginationControl> {
        self.lessons.control()
    }

    pub fn on_page_change(&mut self, page: usize) {
        self.lessons.go_to(page);
    }

    pub fn apply(&mut self, action: PageAction) -> bool {
        self.lessons.apply(action)
    }
}

impl Default for LessonsView {
    fn default() -> Self {
        Self::new()
    }
}
