use super::{client::ApiClient, models::*};
use crate::error::ClientError;
use log::{debug, info};
use reqwest::Method;
use serde_json::json;

const TOKEN: &str = "/token";
const USERS: &str = "/users/";
const USERS_ME: &str = "/users/me";
const CHANGE_PASSWORD: &str = "/change-password";
const FORGOT_PASSWORD: &str = "/forgot-password";
const RESET_PASSWORD: &str = "/reset-password";
const STORIES: &str = "/api/stories";
const CHARACTERS: &str = "/api/characters";
const AUDIO_STORIES: &str = "/api/audio/cuentos";
const LEARNING: &str = "/api/learning";
const RAG_STATS: &str = "/api/rag/stats";

impl ApiClient {
    // Auth

    pub async fn login(&self, username: &str, password: &str) -> Result<Token, ClientError> {
        info!("Logging in as {}", username);
        let builder = self
            .request(Method::POST, TOKEN)
            .form(&[("username", username), ("password", password)]);
        self.send_public(builder, "login").await
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: Option<&str>,
    ) -> Result<User, ClientError> {
        info!("Registering user {}", username);
        let mut body = json!({ "username": username, "password": password });
        if let Some(email) = email.filter(|e| !e.is_empty()) {
            body["email"] = json!(email);
        }
        let builder = self.request(Method::POST, USERS).json(&body);
        self.send_public(builder, "register").await
    }

    pub async fn me(&self) -> Result<User, ClientError> {
        let builder = self.request(Method::GET, USERS_ME);
        let user: User = self.send_authenticated(builder, "me").await?;
        debug!("Profile loaded for {}", user.username);
        Ok(user)
    }

    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<Message, ClientError> {
        let body = json!({ "current_password": current_password, "new_password": new_password });
        let builder = self.request(Method::POST, CHANGE_PASSWORD).json(&body);
        self.send_authenticated(builder, "change_password").await
    }

    pub async fn forgot_password(&self, email: &str) -> Result<Message, ClientError> {
        let builder = self
            .request(Method::POST, FORGOT_PASSWORD)
            .json(&json!({ "email": email }));
        self.send_public(builder, "forgot_password").await
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<Message, ClientError> {
        let builder = self
            .request(Method::POST, RESET_PASSWORD)
            .json(&json!({ "token": token, "new_password": new_password }));
        self.send_public(builder, "reset_password").await
    }

    // Stories

    pub async fn generate_story(&self, request: &StoryGenerateRequest) -> Result<Story, ClientError> {
        info!("Generating story with theme: {}", request.theme);
        let path = format!("{}/generate", STORIES);
        let builder = self.request(Method::POST, &path).json(request);
        let story: Story = self.send_authenticated(builder, "generate_story").await?;
        info!("Story generated: {}", story.title);
        Ok(story)
    }

    pub async fn stories(&self, limit: usize) -> Result<Vec<Story>, ClientError> {
        let builder = self
            .request(Method::GET, STORIES)
            .query(&[("limit", limit)]);
        let stories: Vec<Story> = self.send_authenticated(builder, "stories").await?;
        debug!("Received {} stories", stories.len());
        Ok(stories)
    }

    pub async fn story(&self, id: &str) -> Result<Story, ClientError> {
        let path = format!("{}/{}", STORIES, id);
        self.send_authenticated(self.request(Method::GET, &path), "story")
            .await
    }

    pub async fn story_critiques(&self, id: &str) -> Result<StoryCritiques, ClientError> {
        let path = format!("{}/{}/critiques", STORIES, id);
        self.send_authenticated(self.request(Method::GET, &path), "story_critiques")
            .await
    }

    pub async fn characters(&self) -> Result<Vec<Character>, ClientError> {
        let characters: Vec<Character> = self
            .send_authenticated(self.request(Method::GET, CHARACTERS), "characters")
            .await?;
        debug!("Received {} characters", characters.len());
        Ok(characters)
    }

    // Audio

    pub async fn generate_audio(&self, story_id: &str, text: &str) -> Result<AudioGeneration, ClientError> {
        info!("Generating audio for story {}", story_id);
        let path = format!("{}/{}/generar", AUDIO_STORIES, story_id);
        let body = AudioGenerationRequest {
            texto: text,
            cuento_id: story_id,
        };
        let builder = self.request(Method::POST, &path).json(&body);
        self.send_authenticated(builder, "generate_audio").await
    }

    /// Never fails: any error reads as "no audio yet".
    pub async fn audio_status(&self, story_id: &str) -> AudioStatus {
        let path = format!("{}/{}/estado", AUDIO_STORIES, story_id);
        match self
            .send_authenticated(self.request(Method::GET, &path), "audio_status")
            .await
        {
            Ok(status) => status,
            Err(e) => {
                debug!("Audio status unavailable for {}: {}", story_id, e);
                AudioStatus::missing()
            }
        }
    }

    pub async fn delete_audio(&self, story_id: &str) -> Result<Message, ClientError> {
        let path = format!("{}/{}", AUDIO_STORIES, story_id);
        self.send_authenticated(self.request(Method::DELETE, &path), "delete_audio")
            .await
    }

    // Learning

    pub async fn learning_stats(&self) -> Result<LearningStats, ClientError> {
        let path = format!("{}/statistics", LEARNING);
        self.send_authenticated(self.request(Method::GET, &path), "learning_stats")
            .await
    }

    pub async fn lessons(
        &self,
        category: Option<&str>,
        status: Option<LessonStatus>,
    ) -> Result<LessonList, ClientError> {
        let path = format!("{}/lessons", LEARNING);
        let mut params: Vec<(&str, &str)> = Vec::new();
        if let Some(category) = category.filter(|c| !c.is_empty()) {
            params.push(("category", category));
        }
        if let Some(status) = status {
            params.push(("status_filter", status.as_str()));
        }

        let builder = self.request(Method::GET, &path).query(&params);
        self.send_authenticated(builder, "lessons").await
    }

    pub async fn synthesize_lessons(&self, last_n: u32) -> Result<SynthesisResult, ClientError> {
        info!("Synthesizing lessons from the last {} critiques", last_n);
        let path = format!("{}/synthesize", LEARNING);
        let builder = self
            .request(Method::POST, &path)
            .query(&[("last_n_critiques", last_n)]);
        self.send_authenticated(builder, "synthesize_lessons").await
    }

    pub async fn learning_history(&self) -> Result<LearningHistory, ClientError> {
        let path = format!("{}/history", LEARNING);
        self.send_authenticated(self.request(Method::GET, &path), "learning_history")
            .await
    }

    pub async fn style_profile(&self) -> Result<StyleProfile, ClientError> {
        let path = format!("{}/style-profile", LEARNING);
        self.send_authenticated(self.request(Method::GET, &path), "style_profile")
            .await
    }

    pub async fn rag_stats(&self) -> Result<RagStats, ClientError> {
        self.send_authenticated(self.request(Method::GET, RAG_STATS), "rag_stats")
            .await
    }
}

#[cfg(test)]
mod tests {
    use crate::api::client::ApiClient;
    use crate::config::ClientConfig;
    use crate::error::ClientError;
    use crate::session::Session;
    use crate::test_server;

    fn offline_client() -> ApiClient {
        ApiClient::new(
            ClientConfig::new("http://127.0.0.1:9"),
            Session::with_token("tok").into_shared(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_audio_status_swallows_errors() {
        let client = offline_client();
        let status = client.audio_status("missing-story").await;
        assert!(!status.exists);
        assert!(status.audio_url.is_none());
    }

    #[tokio::test]
    async fn test_offline_calls_surface_errors() {
        let client = offline_client();
        assert!(client.stories(50).await.is_err());
        assert!(client.lessons(Some("pacing"), None).await.is_err());
    }

    #[tokio::test]
    async fn test_failed_login_is_not_a_session_rejection() {
        let (base_url, requests) =
            test_server::serve(401, r#"{"detail":"Incorrect username or password"}"#).await;
        // A leftover token must not be sent to /token nor cleared by its 401
        let session = Session::with_token("previous").into_shared();
        let client = ApiClient::new(ClientConfig::new(base_url), session.clone()).unwrap();

        match client.login("ana", "wrong").await {
            Err(ClientError::Api { status, detail }) => {
                assert_eq!(status, 401);
                assert_eq!(detail, "Incorrect username or password");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
        assert!(session.read().unwrap().is_authenticated());

        let requests = requests.lock().unwrap();
        assert!(requests[0].starts_with("POST /token "));
        assert!(!requests[0].to_lowercase().contains("authorization:"));
    }

    #[tokio::test]
    async fn test_lessons_query_parameters() {
        let (base_url, requests) = test_server::serve(200, r#"{"lessons":[],"total_all":3}"#).await;
        let client = ApiClient::new(ClientConfig::new(base_url), Session::new().into_shared()).unwrap();

        let list = client
            .lessons(Some("pacing"), Some(crate::api::LessonStatus::Archived))
            .await
            .unwrap();
        assert!(list.lessons.is_empty());
        assert_eq!(list.total_all, Some(3));

        let requests = requests.lock().unwrap();
        assert!(requests[0].starts_with(
            "GET /api/learning/lessons?category=pacing&status_filter=archived "
        ));
    }
}
