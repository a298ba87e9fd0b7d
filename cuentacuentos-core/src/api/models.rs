use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use time::format_description::well_known::{Iso8601, Rfc3339};
use time::{OffsetDateTime, PrimitiveDateTime};

/// Parse a server timestamp. The backend emits naive UTC datetimes
/// (`2024-05-01T10:00:00.123456`) as well as RFC 3339 ones.
pub fn parse_timestamp(raw: &str) -> Result<OffsetDateTime, time::error::Parse> {
    OffsetDateTime::parse(raw, &Rfc3339).or_else(|_| {
        PrimitiveDateTime::parse(raw, &Iso8601::DEFAULT).map(PrimitiveDateTime::assume_utc)
    })
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

fn deserialize_optional_timestamp<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_timestamp(&raw).map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    #[serde(default)]
    pub id: Option<i64>,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Token {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Generic acknowledgement body (`{"message": "..."}`), tolerant of extra fields.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Message {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoryLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl StoryLength {
    pub const ALL: [StoryLength; 3] = [StoryLength::Short, StoryLength::Medium, StoryLength::Long];
}

impl fmt::Display for StoryLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoryLength::Short => write!(f, "short"),
            StoryLength::Medium => write!(f, "medium"),
            StoryLength::Long => write!(f, "long"),
        }
    }
}

impl FromStr for StoryLength {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "short" => Ok(StoryLength::Short),
            "medium" => Ok(StoryLength::Medium),
            "long" => Ok(StoryLength::Long),
            other => Err(format!("Unknown story length '{}' (short, medium, long)", other)),
        }
    }
}

pub const DEFAULT_TARGET_AGE: u8 = 6;

/// Body of `POST /api/stories/generate`. Unset optionals are sent as `null`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StoryGenerateRequest {
    pub theme: String,
    pub character_names: Option<Vec<String>>,
    pub moral_lesson: Option<String>,
    pub target_age: Option<u8>,
    pub length: StoryLength,
    pub special_elements: Option<String>,
}

impl StoryGenerateRequest {
    pub fn new(theme: impl Into<String>) -> Self {
        Self {
            theme: theme.into(),
            character_names: None,
            moral_lesson: None,
            target_age: Some(DEFAULT_TARGET_AGE),
            length: StoryLength::default(),
            special_elements: None,
        }
    }

    /// An empty selection is sent as `null`, not `[]`.
    pub fn with_characters(mut self, names: Vec<String>) -> Self {
        self.character_names = if names.is_empty() { None } else { Some(names) };
        self
    }

    pub fn with_moral_lesson(mut self, lesson: Option<String>) -> Self {
        self.moral_lesson = lesson.filter(|l| !l.trim().is_empty());
        self
    }

    pub fn with_target_age(mut self, age: u8) -> Self {
        self.target_age = Some(age);
        self
    }

    pub fn with_length(mut self, length: StoryLength) -> Self {
        self.length = length;
        self
    }

    pub fn with_special_elements(mut self, elements: Option<String>) -> Self {
        self.special_elements = elements.filter(|e| !e.trim().is_empty());
        self
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Story {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub content: String,
    #[serde(default = "default_version")]
    pub version: i32,
    #[serde(default)]
    pub is_seed: bool,
    #[serde(default)]
    pub illustration_template: Option<serde_json::Value>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub prompt_used: Option<String>,
}

fn default_version() -> i32 {
    1
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CritiqueEntry {
    pub id: String,
    #[serde(default)]
    pub score: Option<i32>,
    #[serde(default)]
    pub critique_text: String,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub timestamp: Option<OffsetDateTime>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StoryCritiques {
    pub story_id: String,
    #[serde(default)]
    pub story_title: String,
    #[serde(default)]
    pub critique_count: usize,
    #[serde(default)]
    pub critiques: Vec<CritiqueEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Character {
    pub id: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "estado", default)]
    pub status: String,
    #[serde(rename = "edad_aparente", default)]
    pub apparent_age: Option<String>,
    #[serde(rename = "prompt_base_ia", default)]
    pub base_prompt: Option<String>,
    #[serde(rename = "total_apariciones", default)]
    pub total_appearances: Option<u32>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AudioGenerationRequest<'a> {
    pub texto: &'a str,
    pub cuento_id: &'a str,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AudioGeneration {
    pub audio_url: String,
    pub characters_used: Option<u64>,
    pub duration: Option<f64>,
    pub message: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AudioStatus {
    #[serde(rename = "existe")]
    pub exists: bool,
    pub audio_url: Option<String>,
    pub message: Option<String>,
}

impl AudioStatus {
    pub fn missing() -> Self {
        Self::default()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct DatabaseStats {
    pub total_stories: u64,
    pub total_critiques: u64,
    pub avg_score_last_10: Option<f64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct LearningStats {
    pub total_lessons: u64,
    pub active_lessons: u64,
    pub lessons_by_category: BTreeMap<String, u64>,
    pub last_synthesis: Option<String>,
    pub current_focus_areas: Vec<serde_json::Value>,
    pub total_syntheses: u64,
    pub total_critiques_analyzed: u64,
    pub critiques_until_next_synthesis: u64,
    pub average_score: Option<f64>,
    pub database_stats: Option<DatabaseStats>,
}

pub const LESSON_CATEGORIES: [&str; 6] = [
    "pacing",
    "language_choice",
    "narrative_structure",
    "character_development",
    "emotional_depth",
    "sensory_details",
];

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LessonStatus {
    Active,
    Archived,
    All,
}

impl LessonStatus {
    pub const ALL: [LessonStatus; 3] = [LessonStatus::Active, LessonStatus::Archived, LessonStatus::All];

    pub fn as_str(&self) -> &'static str {
        match self {
            LessonStatus::Active => "active",
            LessonStatus::Archived => "archived",
            LessonStatus::All => "all",
        }
    }
}

impl fmt::Display for LessonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LessonStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(LessonStatus::Active),
            "archived" => Ok(LessonStatus::Archived),
            "all" => Ok(LessonStatus::All),
            other => Err(format!("Unknown lesson status '{}' (active, archived, all)", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Lesson {
    pub lesson_id: Option<i64>,
    pub insight: String,
    pub category: String,
    pub priority: String,
    pub actionable_guidance: String,
    pub supporting_evidence: String,
    pub applied_count: u32,
    pub effectiveness_score: Option<f64>,
    pub status: String,
    pub synthesized_at: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LessonsPayload {
    Bare(Vec<Lesson>),
    Wrapped {
        #[serde(default)]
        lessons: Vec<Lesson>,
        #[serde(default)]
        total_all: Option<usize>,
    },
}

/// Lessons as returned by `/api/learning/lessons`, which may be a bare array
/// or wrapped in `{"lessons": [...]}`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(from = "LessonsPayload")]
pub struct LessonList {
    pub lessons: Vec<Lesson>,
    pub total_all: Option<usize>,
}

impl From<LessonsPayload> for LessonList {
    fn from(payload: LessonsPayload) -> Self {
        match payload {
            LessonsPayload::Bare(lessons) => LessonList {
                lessons,
                total_all: None,
            },
            LessonsPayload::Wrapped { lessons, total_all } => LessonList { lessons, total_all },
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SynthesisResult {
    pub status: String,
    pub critiques_analyzed: u64,
    pub lessons_extracted: u64,
    pub synthesis_summary: String,
    pub lessons: Vec<serde_json::Value>,
    pub message: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct LearningHistory {
    pub history: Vec<Lesson>,
}

/// Free-form JSON documents the client only displays.
pub type StyleProfile = serde_json::Map<String, serde_json::Value>;
pub type RagStats = serde_json::Map<String, serde_json::Value>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_with_naive_timestamp() {
        let json = r#"{
            "id": "3f1c9a52-7a0e-4b8f-9d2c-1e5b6a7c8d90",
            "title": "El dragón que tenía miedo",
            "content": "Había una vez...",
            "version": 2,
            "is_seed": false,
            "illustration_template": null,
            "created_at": "2024-05-01T10:15:30.123456"
        }"#;
        let story: Story = serde_json::from_str(json).unwrap();
        assert_eq!(story.version, 2);
        assert_eq!(story.created_at.year(), 2024);
        assert_eq!(story.created_at.hour(), 10);
        assert!(story.prompt_used.is_none());
    }

    #[test]
    fn test_story_with_offset_timestamp() {
        let json = r#"{"id":"a","title":"t","content":"c","created_at":"2024-05-01T10:15:30Z"}"#;
        let story: Story = serde_json::from_str(json).unwrap();
        assert_eq!(story.version, 1);
        assert_eq!(story.created_at.minute(), 15);
    }

    #[test]
    fn test_bad_timestamp_is_an_error() {
        let json = r#"{"id":"a","title":"t","content":"c","created_at":"yesterday"}"#;
        assert!(serde_json::from_str::<Story>(json).is_err());
    }

    #[test]
    fn test_generate_request_sends_nulls() {
        let request = StoryGenerateRequest::new("un bosque mágico")
            .with_characters(vec![])
            .with_moral_lesson(Some("  ".to_string()));
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["theme"], "un bosque mágico");
        assert!(value["character_names"].is_null());
        assert!(value["moral_lesson"].is_null());
        assert_eq!(value["target_age"], 6);
        assert_eq!(value["length"], "medium");
    }

    #[test]
    fn test_story_length_parsing() {
        assert_eq!("LONG".parse::<StoryLength>(), Ok(StoryLength::Long));
        assert!("epic".parse::<StoryLength>().is_err());
        assert_eq!(StoryLength::Short.to_string(), "short");
    }

    #[test]
    fn test_character_spanish_fields() {
        let json = r#"[{"id":"c1","nombre":"Luna","estado":"activo","edad_aparente":"8 años","total_apariciones":3}]"#;
        let characters: Vec<Character> = serde_json::from_str(json).unwrap();
        assert_eq!(characters[0].name, "Luna");
        assert_eq!(characters[0].apparent_age.as_deref(), Some("8 años"));
        assert_eq!(characters[0].total_appearances, Some(3));
        assert!(characters[0].base_prompt.is_none());
    }

    #[test]
    fn test_lessons_wrapped_and_bare() {
        let wrapped = r#"{"lessons":[{"lesson_id":1,"insight":"Ritmo","category":"pacing","status":"active"}],"total":1,"total_all":4}"#;
        let list: LessonList = serde_json::from_str(wrapped).unwrap();
        assert_eq!(list.lessons.len(), 1);
        assert_eq!(list.total_all, Some(4));
        assert_eq!(list.lessons[0].category, "pacing");

        let bare = r#"[{"insight":"a"},{"insight":"b"}]"#;
        let list: LessonList = serde_json::from_str(bare).unwrap();
        assert_eq!(list.lessons.len(), 2);
        assert_eq!(list.total_all, None);
    }

    #[test]
    fn test_audio_status_spanish_flag() {
        let status: AudioStatus =
            serde_json::from_str(r#"{"existe":true,"audio_url":"/data/audio/x.mp3"}"#).unwrap();
        assert!(status.exists);
        assert_eq!(status.audio_url.as_deref(), Some("/data/audio/x.mp3"));
        assert!(!AudioStatus::missing().exists);
    }

    #[test]
    fn test_critiques_payload() {
        let json = r#"{"story_id":"s1","story_title":"T","critique_count":1,
            "critiques":[{"id":"k1","score":8,"critique_text":"Bien","timestamp":"2024-05-02T08:00:00"}]}"#;
        let critiques: StoryCritiques = serde_json::from_str(json).unwrap();
        assert_eq!(critiques.critique_count, 1);
        assert_eq!(critiques.critiques[0].score, Some(8));
        assert!(critiques.critiques[0].timestamp.is_some());
    }

    #[test]
    fn test_learning_stats_partial() {
        let json = r#"{"total_lessons":5,"active_lessons":3,"lessons_by_category":{"pacing":2},
            "database_stats":{"total_stories":10,"total_critiques":7,"avg_score_last_10":7.5}}"#;
        let stats: LearningStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.lessons_by_category.get("pacing"), Some(&2));
        assert_eq!(stats.database_stats.unwrap().avg_score_last_10, Some(7.5));
        assert_eq!(stats.average_score, None);
    }
}
