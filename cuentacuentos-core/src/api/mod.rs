pub mod client;
pub mod endpoints;
pub mod models;

pub use client::{ApiClient, error_detail, resolve_audio_url};
pub use models::{
    AudioGeneration, AudioStatus, Character, LearningHistory, LearningStats, Lesson, LessonList,
    LessonStatus, Message, RagStats, Story, StoryCritiques, StoryGenerateRequest, StoryLength,
    StyleProfile, SynthesisResult, Token, User,
};
