use clap::{Parser, Subcommand};
use cuentacuentos_core::{
    ClientConfig, ClientError, FileSessionStore, LessonStatus, LessonsView, LibraryView, PaginationControl,
    StoryGenerateRequest, StoryLength, Storyteller,
    api::models::LESSON_CATEGORIES,
    format::{character_line, format_date, lesson_line, render_control, story_card},
    validation,
};
use log::debug;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "cuentacuentos")]
#[command(about = "A CLI for generating and browsing children's stories")]
struct Cli {
    /// Base URL of the story API (overrides CUENTACUENTOS_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login { username: String, password: String },
    /// Create an account and log in
    Register {
        username: String,
        password: String,
        /// Repeat the password
        confirm: String,
        #[arg(long)]
        email: Option<String>,
    },
    /// Forget the saved session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Password management
    Password {
        #[command(subcommand)]
        action: PasswordCommand,
    },
    /// Generate a new story
    Generate {
        /// Theme or scene of the story (required)
        theme: String,
        /// Characters to include (repeatable)
        #[arg(short, long = "character")]
        characters: Vec<String>,
        #[arg(long)]
        moral: Option<String>,
        /// Age of the reader, 3 to 12
        #[arg(long)]
        age: Option<String>,
        /// short, medium or long
        #[arg(long, default_value = "medium")]
        length: String,
        #[arg(long)]
        special: Option<String>,
    },
    /// List saved stories, 12 per page
    Library {
        #[arg(short, long, default_value = "1")]
        page: usize,
    },
    /// Show one story
    Story { id: String },
    /// Show the critiques of a story
    Critiques { id: String },
    /// List available characters
    Characters,
    /// Narration
    Audio {
        #[command(subcommand)]
        action: AudioCommand,
    },
    /// Learning system
    Learning {
        #[command(subcommand)]
        action: LearningCommand,
    },
    /// Retrieval index statistics
    RagStats,
}

#[derive(Subcommand)]
enum PasswordCommand {
    Change {
        current: String,
        new: String,
        confirm: String,
    },
    Forgot { email: String },
    Reset {
        token: String,
        new: String,
        confirm: String,
    },
}

#[derive(Subcommand)]
enum AudioCommand {
    Generate { story_id: String },
    Status { story_id: String },
    Delete { story_id: String },
}

#[derive(Subcommand)]
enum LearningCommand {
    Stats,
    /// List lessons, 8 per page
    Lessons {
        #[arg(long)]
        category: Option<String>,
        /// active, archived or all
        #[arg(long)]
        status: Option<String>,
        #[arg(short, long, default_value = "1")]
        page: usize,
    },
    Synthesize {
        #[arg(long, default_value = "5")]
        last: u32,
    },
    History,
    Profile,
}

fn print_control(control: Option<PaginationControl>) {
    if let Some(control) = control {
        println!();
        println!("{}", render_control(&control));
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let cli = Cli::parse();

    let result = match setup(cli.api_url.as_deref()) {
        Ok(teller) => run(&teller, cli.command).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn setup(api_url: Option<&str>) -> Result<Storyteller, ClientError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = api_url {
        config = config.with_base_url(url);
    }
    debug!("Using API at {}", config.base_url);

    Storyteller::new(config, Arc::new(FileSessionStore::new()?))
}

async fn run(teller: &Storyteller, command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    // Commands that manage the session themselves skip the restore round trip
    if !matches!(
        command,
        Commands::Login { .. } | Commands::Register { .. } | Commands::Logout
    ) {
        teller.auth().restore().await?;
    }

    let api = teller.api();

    match command {
        Commands::Login { username, password } => {
            let user = teller.auth().login(&username, &password).await?;
            println!("Logged in as {}", user.username);
        }
        Commands::Register {
            username,
            password,
            confirm,
            email,
        } => {
            validation::validate_registration(&username, &password, &confirm)?;
            let user = teller
                .auth()
                .register(&username, &password, email.as_deref())
                .await?;
            println!("Welcome, {}!", user.username);
        }
        Commands::Logout => {
            teller.auth().logout()?;
            println!("Session closed");
        }
        Commands::Whoami => match teller.auth().current_user() {
            Some(user) => {
                println!("{}", user.username);
                if let Some(email) = user.email {
                    println!("{}", email);
                }
            }
            None => println!("Not logged in"),
        },
        Commands::Password { action } => match action {
            PasswordCommand::Change {
                current,
                new,
                confirm,
            } => {
                validation::validate_password_change(&current, &new, &confirm)?;
                println!("Strength: {}", validation::PasswordStrength::of(&new));
                let reply = api.change_password(&current, &new).await?;
                println!("{}", reply.message.unwrap_or_else(|| "Password changed".to_string()));
            }
            PasswordCommand::Forgot { email } => {
                let reply = api.forgot_password(&email).await?;
                println!("{}", reply.message.unwrap_or_else(|| "Request sent".to_string()));
            }
            PasswordCommand::Reset {
                token,
                new,
                confirm,
            } => {
                validation::validate_password_reset(&new, &confirm)?;
                let reply = api.reset_password(&token, &new).await?;
                println!("{}", reply.message.unwrap_or_else(|| "Password reset".to_string()));
            }
        },
        Commands::Generate {
            theme,
            characters,
            moral,
            age,
            length,
            special,
        } => {
            validation::validate_theme(&theme)?;
            let length: StoryLength = length.parse()?;
            let age = validation::parse_target_age(age.as_deref())?;

            let request = StoryGenerateRequest::new(theme)
                .with_characters(characters)
                .with_moral_lesson(moral)
                .with_target_age(age)
                .with_length(length)
                .with_special_elements(special);

            println!("Generating story...");
            let story = teller.generate_story(&request).await?;
            println!("\n{}\n", story.title);
            println!("{}", story.content);
            println!("\nid: {}", story.id);
        }
        Commands::Library { page } => {
            let mut library = LibraryView::new();
            library.load(api).await?;

            if library.stories().is_empty() {
                println!("No stories saved yet. Try `cuentacuentos generate <theme>`.");
                return Ok(());
            }

            library.on_page_change(page);
            println!("{}", library.summary());
            if let Some(latest) = library.latest() {
                println!("Latest: {}", latest.title);
            }
            println!();
            for story in library.current_stories() {
                println!("{}", story_card(story));
                println!("    id: {}", story.id);
            }
            print_control(library.control());
        }
        Commands::Story { id } => {
            let story = api.story(&id).await?;
            println!("{}  (v{}, {})", story.title, story.version, format_date(&story.created_at));
            println!();
            println!("{}", story.content);
            if let Some(url) = teller.existing_audio(&story.id).await {
                println!("\nAudio: {}", url);
            }
        }
        Commands::Critiques { id } => {
            let critiques = api.story_critiques(&id).await?;
            println!("{} ({} critiques)", critiques.story_title, critiques.critique_count);
            for critique in critiques.critiques {
                let score = critique
                    .score
                    .map(|s| format!("{}/10", s))
                    .unwrap_or_else(|| "-".to_string());
                let when = critique
                    .timestamp
                    .as_ref()
                    .map(format_date)
                    .unwrap_or_default();
                println!("\n[{}] {}", score, when);
                println!("{}", critique.critique_text);
            }
        }
        Commands::Characters => {
            let characters = api.characters().await?;
            if characters.is_empty() {
                println!("No characters available");
            }
            for character in &characters {
                println!("{}", character_line(character));
            }
        }
        Commands::Audio { action } => match action {
            AudioCommand::Generate { story_id } => {
                let story = api.story(&story_id).await?;
                println!("Generating narration...");
                let (generation, url) = teller.narrate(&story).await?;
                let chars = generation
                    .characters_used
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "?".to_string());
                let secs = generation
                    .duration
                    .map(|d| format!("{:.0}", d))
                    .unwrap_or_else(|| "?".to_string());
                println!("Audio generated ({} chars, ~{}s)", chars, secs);
                println!("{}", url);
            }
            AudioCommand::Status { story_id } => match teller.existing_audio(&story_id).await {
                Some(url) => println!("Audio available: {}", url),
                None => println!("No audio generated for this story"),
            },
            AudioCommand::Delete { story_id } => {
                let reply = api.delete_audio(&story_id).await?;
                println!("{}", reply.message.unwrap_or_else(|| "Audio deleted".to_string()));
            }
        },
        Commands::Learning { action } => run_learning(teller, action).await?,
        Commands::RagStats => {
            let stats = api.rag_stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

async fn run_learning(teller: &Storyteller, action: LearningCommand) -> Result<(), Box<dyn std::error::Error>> {
    let api = teller.api();

    match action {
        LearningCommand::Stats => {
            let stats = api.learning_stats().await?;
            let average = stats
                .average_score
                .or_else(|| stats.database_stats.as_ref().and_then(|d| d.avg_score_last_10))
                .map(|s| format!("{:.1}", s))
                .unwrap_or_else(|| "-".to_string());
            println!("Average score:        {}", average);
            println!("Lessons (active/all): {}/{}", stats.active_lessons, stats.total_lessons);
            println!("Syntheses:            {}", stats.total_syntheses);
            println!("Critiques analyzed:   {}", stats.total_critiques_analyzed);
            println!("Until next synthesis: {}", stats.critiques_until_next_synthesis);
            if let Some(last) = &stats.last_synthesis {
                println!("Last synthesis:       {}", last);
            }
            for (category, count) in &stats.lessons_by_category {
                println!("  {:<24} {}", category, count);
            }
        }
        LearningCommand::Lessons {
            category,
            status,
            page,
        } => {
            if let Some(category) = category.as_deref() {
                if !LESSON_CATEGORIES.contains(&category) {
                    log::warn!("Unknown category '{}', known: {}", category, LESSON_CATEGORIES.join(", "));
                }
            }
            let status = status.map(|s| s.parse::<LessonStatus>()).transpose()?;

            let mut view = LessonsView::new();
            view.set_category(category);
            view.set_status(status);
            view.load(api).await?;

            if view.lessons().is_empty() {
                println!("No lessons match these filters");
                return Ok(());
            }

            view.on_page_change(page);
            for lesson in view.current_lessons() {
                println!("{}", lesson_line(lesson));
                if !lesson.actionable_guidance.is_empty() {
                    println!("    → {}", lesson.actionable_guidance);
                }
            }
            print_control(view.control());
        }
        LearningCommand::Synthesize { last } => {
            println!("Synthesizing lessons...");
            let result = api.synthesize_lessons(last).await?;
            println!(
                "{}",
                result.message.unwrap_or_else(|| format!(
                    "{} lessons from {} critiques",
                    result.lessons_extracted, result.critiques_analyzed
                ))
            );
            if !result.synthesis_summary.is_empty() {
                println!("\n{}", result.synthesis_summary);
            }
        }
        LearningCommand::History => {
            let history = api.learning_history().await?;
            for lesson in &history.history {
                println!("{}", lesson_line(lesson));
            }
        }
        LearningCommand::Profile => {
            let profile = api.style_profile().await?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
    }

    Ok(())
}
