pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod format;
pub mod pagination;
pub mod session;
pub mod validation;
pub mod views;

#[cfg(test)]
mod test_server;

pub use api::{
    ApiClient, AudioGeneration, AudioStatus, Character, LearningHistory, LearningStats, Lesson,
    LessonList, LessonStatus, Message, RagStats, Story, StoryCritiques, StoryGenerateRequest,
    StoryLength, StyleProfile, SynthesisResult, Token, User,
};
pub use auth::AuthManager;
pub use config::ClientConfig;
pub use error::ClientError;
pub use pagination::{
    DisplayRange, PageAction, PageMarker, PaginatedView, PaginationControl, PaginationState,
    VISIBLE_WINDOW, page_markers,
};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore, SharedSession};
pub use views::{LessonFilter, LessonsView, LibraryView};

use log::info;
use std::sync::Arc;

/// Main interface for the story client: one API client, one session, one auth manager.
pub struct Storyteller {
    auth: AuthManager,
}

impl Storyteller {
    pub fn new(config: ClientConfig, store: Arc<dyn SessionStore>) -> Result<Self, ClientError> {
        let client = ApiClient::new(config, Session::new().into_shared())?;
        Ok(Storyteller {
            auth: AuthManager::new(client, store),
        })
    }

    /// Configuration from the environment, session persisted on disk.
    pub fn from_env() -> Result<Self, ClientError> {
        let store = FileSessionStore::new()?;
        Self::new(ClientConfig::from_env()?, Arc::new(store))
    }

    pub fn api(&self) -> &ApiClient {
        self.auth.client()
    }

    pub fn auth(&self) -> &AuthManager {
        &self.auth
    }

    /// Validate the form, then ask the server for a story.
    pub async fn generate_story(&self, request: &StoryGenerateRequest) -> Result<Story, ClientError> {
        validation::validate_theme(&request.theme)?;
        if let Some(age) = request.target_age {
            validation::validate_target_age(age)?;
        }
        self.api().generate_story(request).await
    }

    /// Narrate a story and return the playable URL of the result.
    pub async fn narrate(&self, story: &Story) -> Result<(AudioGeneration, String), ClientError> {
        let generation = self.api().generate_audio(&story.id, &story.content).await?;
        let url = self.api().full_audio_url(&generation.audio_url);
        info!("Audio ready for {}: {}", story.id, url);
        Ok((generation, url))
    }

    /// Playable URL of an existing narration, if any.
    pub async fn existing_audio(&self, story_id: &str) -> Option<String> {
        let status = self.api().audio_status(story_id).await;
        if !status.exists {
            return None;
        }
        status
            .audio_url
            .map(|path| self.api().full_audio_url(&path))
            .filter(|url| !url.is_empty())
    }
}
