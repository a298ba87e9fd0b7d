use crate::widgets::pagination;
use cuentacuentos_core::{
    LessonList, LessonStatus, LessonsView, LibraryView, PageAction, Story, StoryGenerateRequest,
    StoryLength, Storyteller, User,
    api::models::{DEFAULT_TARGET_AGE, LESSON_CATEGORIES},
    format::{format_date, story_preview},
    validation,
};
use iced::widget::{button, column, container, pick_list, row, scrollable, text, text_input};
use iced::{Element, Length, Task};
use std::sync::Arc;

const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Library,
    Story,
    Generator,
    Lessons,
}

#[derive(Debug, Clone)]
pub enum Message {
    // Login / registration form
    UsernameChanged(String),
    PasswordChanged(String),
    ConfirmChanged(String),
    EmailChanged(String),
    ToggleRegister,
    SubmitAuth,
    Authenticated(Result<User, String>),
    SessionRestored(Result<Option<User>, String>),
    Logout,

    Navigate(Screen),

    // Library
    LibraryLoaded(Result<Vec<Story>, String>),
    LibraryPage(PageAction),
    OpenStory(String),
    StoryLoaded(Result<(Story, Option<String>), String>),
    Narrate,
    Narrated(Result<String, String>),

    // Generator form
    ThemeChanged(String),
    CharactersChanged(String),
    MoralChanged(String),
    AgeChanged(String),
    LengthSelected(StoryLength),
    SpecialChanged(String),
    Generate,
    Generated(Result<Story, String>),

    // Lessons
    CategorySelected(String),
    StatusSelected(LessonStatus),
    LessonsLoaded(Result<LessonList, String>),
    LessonsPage(PageAction),
}

#[derive(Debug, Default)]
struct AuthForm {
    username: String,
    password: String,
    confirm: String,
    email: String,
    registering: bool,
}

#[derive(Debug)]
struct GeneratorForm {
    theme: String,
    characters: String,
    moral: String,
    age: String,
    length: StoryLength,
    special: String,
}

impl Default for GeneratorForm {
    fn default() -> Self {
        Self {
            theme: String::new(),
            characters: String::new(),
            moral: String::new(),
            age: DEFAULT_TARGET_AGE.to_string(),
            length: StoryLength::default(),
            special: String::new(),
        }
    }
}

impl GeneratorForm {
    fn request(&self) -> Result<StoryGenerateRequest, String> {
        validation::validate_theme(&self.theme).map_err(|e| e.to_string())?;
        let age = validation::parse_target_age(Some(self.age.as_str())).map_err(|e| e.to_string())?;
        let characters = self
            .characters
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect();

        Ok(StoryGenerateRequest::new(self.theme.trim())
            .with_characters(characters)
            .with_moral_lesson(Some(self.moral.clone()))
            .with_target_age(age)
            .with_length(self.length)
            .with_special_elements(Some(self.special.clone())))
    }
}

pub struct AppState {
    teller: Arc<Storyteller>,
    screen: Screen,
    user: Option<User>,
    auth_form: AuthForm,
    generator: GeneratorForm,
    library: LibraryView,
    lessons: LessonsView,
    story: Option<Story>,
    audio_url: Option<String>,
    busy: bool,
    status: String,
    error_message: Option<String>,
}

impl AppState {
    pub fn new(teller: Arc<Storyteller>) -> Self {
        Self {
            teller,
            screen: Screen::Login,
            user: None,
            auth_form: AuthForm::default(),
            generator: GeneratorForm::default(),
            library: LibraryView::new(),
            lessons: LessonsView::new(),
            story: None,
            audio_url: None,
            busy: false,
            status: "Checking saved session...".to_string(),
            error_message: None,
        }
    }

    fn fail(&mut self, error: String) {
        log::warn!("{}", error);
        self.busy = false;
        self.error_message = Some(error);
        // A rejected token clears the session inside the client
        if self.screen != Screen::Login && !self.teller.auth().is_authenticated() {
            self.user = None;
            self.screen = Screen::Login;
            self.status = "Session expired, please log in again".to_string();
        }
    }

    fn load_library(&mut self) -> Task<Message> {
        self.busy = true;
        let teller = self.teller.clone();
        Task::perform(
            async move {
                teller
                    .api()
                    .stories(cuentacuentos_core::views::LIBRARY_FETCH_LIMIT)
                    .await
                    .map_err(|e| e.to_string())
            },
            Message::LibraryLoaded,
        )
    }

    fn load_lessons(&mut self) -> Task<Message> {
        self.busy = true;
        let teller = self.teller.clone();
        let filter = self.lessons.filter().clone();
        Task::perform(
            async move {
                teller
                    .api()
                    .lessons(filter.category.as_deref(), filter.status)
                    .await
                    .map_err(|e| e.to_string())
            },
            Message::LessonsLoaded,
        )
    }
}

pub fn initialize(teller: Arc<Storyteller>) -> (AppState, Task<Message>) {
    let state = AppState::new(teller.clone());
    let task = Task::perform(
        async move { teller.auth().restore().await.map_err(|e| e.to_string()) },
        Message::SessionRestored,
    );
    (state, task)
}

pub fn update(state: &mut AppState, message: Message) -> Task<Message> {
    match message {
        Message::UsernameChanged(value) => state.auth_form.username = value,
        Message::PasswordChanged(value) => state.auth_form.password = value,
        Message::ConfirmChanged(value) => state.auth_form.confirm = value,
        Message::EmailChanged(value) => state.auth_form.email = value,
        Message::ToggleRegister => {
            state.auth_form.registering = !state.auth_form.registering;
            state.error_message = None;
        }
        Message::SubmitAuth => {
            let form = &state.auth_form;
            if form.registering {
                if let Err(e) =
                    validation::validate_registration(&form.username, &form.password, &form.confirm)
                {
                    state.error_message = Some(e.to_string());
                    return Task::none();
                }
            } else if form.username.trim().is_empty() || form.password.is_empty() {
                state.error_message = Some("Enter username and password".to_string());
                return Task::none();
            }

            state.busy = true;
            state.error_message = None;

            let teller = state.teller.clone();
            let username = form.username.trim().to_string();
            let password = form.password.clone();
            let email = Some(form.email.trim().to_string()).filter(|e| !e.is_empty());
            let registering = form.registering;
            return Task::perform(
                async move {
                    let auth = teller.auth();
                    let result = if registering {
                        auth.register(&username, &password, email.as_deref()).await
                    } else {
                        auth.login(&username, &password).await
                    };
                    result.map_err(|e| e.to_string())
                },
                Message::Authenticated,
            );
        }
        Message::Authenticated(result) => {
            state.busy = false;
            match result {
                Ok(user) => {
                    state.status = format!("Welcome, {}!", user.username);
                    state.user = Some(user);
                    state.auth_form = AuthForm::default();
                    state.screen = Screen::Library;
                    return state.load_library();
                }
                Err(e) => state.fail(e),
            }
        }
        Message::SessionRestored(result) => match result {
            Ok(Some(user)) => {
                state.status = format!("Welcome back, {}!", user.username);
                state.user = Some(user);
                state.screen = Screen::Library;
                return state.load_library();
            }
            Ok(None) => state.status = "Log in to start telling stories".to_string(),
            Err(e) => state.fail(e),
        },
        Message::Logout => {
            if let Err(e) = state.teller.auth().logout() {
                state.error_message = Some(e.to_string());
            }
            state.user = None;
            state.story = None;
            state.library = LibraryView::new();
            state.lessons = LessonsView::new();
            state.screen = Screen::Login;
            state.status = "Logged out".to_string();
        }
        Message::Navigate(screen) => {
            state.screen = screen;
            state.error_message = None;
            match screen {
                Screen::Library => return state.load_library(),
                Screen::Lessons => return state.load_lessons(),
                _ => {}
            }
        }
        Message::LibraryLoaded(result) => {
            state.busy = false;
            match result {
                Ok(stories) => {
                    log::info!("Library has {} stories", stories.len());
                    state.library.set_stories(stories);
                    state.status = state.library.summary();
                }
                Err(e) => state.fail(e),
            }
        }
        Message::LibraryPage(action) => {
            state.library.apply(action);
        }
        Message::OpenStory(id) => {
            state.busy = true;
            state.audio_url = None;
            let teller = state.teller.clone();
            return Task::perform(
                async move {
                    let story = teller.api().story(&id).await.map_err(|e| e.to_string())?;
                    let audio = teller.existing_audio(&story.id).await;
                    Ok::<_, String>((story, audio))
                },
                Message::StoryLoaded,
            );
        }
        Message::StoryLoaded(result) => {
            state.busy = false;
            match result {
                Ok((story, audio)) => {
                    state.story = Some(story);
                    state.audio_url = audio;
                    state.screen = Screen::Story;
                }
                Err(e) => state.fail(e),
            }
        }
        Message::Narrate => {
            let Some(story) = state.story.clone() else {
                return Task::none();
            };
            state.busy = true;
            state.status = "Generating narration...".to_string();
            let teller = state.teller.clone();
            return Task::perform(
                async move {
                    teller
                        .narrate(&story)
                        .await
                        .map(|(_, url)| url)
                        .map_err(|e| e.to_string())
                },
                Message::Narrated,
            );
        }
        Message::Narrated(result) => {
            state.busy = false;
            match result {
                Ok(url) => {
                    state.status = "Narration ready".to_string();
                    state.audio_url = Some(url);
                }
                Err(e) => state.fail(e),
            }
        }
        Message::ThemeChanged(value) => state.generator.theme = value,
        Message::CharactersChanged(value) => state.generator.characters = value,
        Message::MoralChanged(value) => state.generator.moral = value,
        Message::AgeChanged(value) => state.generator.age = value,
        Message::LengthSelected(length) => state.generator.length = length,
        Message::SpecialChanged(value) => state.generator.special = value,
        Message::Generate => {
            let request = match state.generator.request() {
                Ok(request) => request,
                Err(e) => {
                    state.error_message = Some(e);
                    return Task::none();
                }
            };
            state.busy = true;
            state.error_message = None;
            state.status = "Writing your story...".to_string();
            let teller = state.teller.clone();
            return Task::perform(
                async move {
                    teller
                        .generate_story(&request)
                        .await
                        .map_err(|e| e.to_string())
                },
                Message::Generated,
            );
        }
        Message::Generated(result) => {
            state.busy = false;
            match result {
                Ok(story) => {
                    state.status = format!("\"{}\" is ready", story.title);
                    state.generator = GeneratorForm::default();
                    state.story = Some(story);
                    state.audio_url = None;
                    state.screen = Screen::Story;
                }
                Err(e) => state.fail(e),
            }
        }
        Message::CategorySelected(category) => {
            let category = Some(category).filter(|c| c != ALL_CATEGORIES);
            if state.lessons.set_category(category) {
                return state.load_lessons();
            }
        }
        Message::StatusSelected(status) => {
            if state.lessons.set_status(Some(status)) {
                return state.load_lessons();
            }
        }
        Message::LessonsLoaded(result) => {
            state.busy = false;
            match result {
                Ok(list) => state.lessons.set_lessons(list),
                Err(e) => state.fail(e),
            }
        }
        Message::LessonsPage(action) => {
            state.lessons.apply(action);
        }
    }

    Task::none()
}

pub fn view(state: &AppState) -> Element<Message> {
    let body = match state.screen {
        Screen::Login => view_login(state),
        Screen::Library => view_library(state),
        Screen::Story => view_story(state),
        Screen::Generator => view_generator(state),
        Screen::Lessons => view_lessons(state),
    };

    let error_section = if let Some(error) = &state.error_message {
        column![text(error).size(14).color(iced::Color::from_rgb(0.8, 0.1, 0.1))]
    } else {
        column![]
    };

    let status = if state.busy {
        format!("{} (working...)", state.status)
    } else {
        state.status.clone()
    };

    let mut content = column![].spacing(15).padding(20);
    if state.screen != Screen::Login {
        content = content.push(view_nav(state));
    }
    content = content
        .push(text(status).size(14))
        .push(error_section)
        .push(body);

    container(scrollable(content))
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

fn view_nav(state: &AppState) -> Element<Message> {
    let tab = |label: &'static str, screen: Screen| {
        button(label)
            .on_press_maybe((state.screen != screen).then_some(Message::Navigate(screen)))
            .padding(8)
    };

    let who = state
        .user
        .as_ref()
        .map(|u| u.username.clone())
        .unwrap_or_default();

    row![
        tab("Library", Screen::Library),
        tab("New story", Screen::Generator),
        tab("Lessons", Screen::Lessons),
        text(who).size(14),
        button("Log out").on_press(Message::Logout).padding(8),
    ]
    .spacing(10)
    .align_y(iced::Alignment::Center)
    .into()
}

fn view_login(state: &AppState) -> Element<Message> {
    let form = &state.auth_form;
    let mut fields = column![
        text(if form.registering { "Create account" } else { "Log in" }).size(24),
        text_input("Username", &form.username).on_input(Message::UsernameChanged),
        text_input("Password", &form.password)
            .secure(true)
            .on_input(Message::PasswordChanged)
            .on_submit(Message::SubmitAuth),
    ]
    .spacing(10)
    .width(Length::Fixed(360.0));

    if form.registering {
        fields = fields
            .push(
                text_input("Confirm password", &form.confirm)
                    .secure(true)
                    .on_input(Message::ConfirmChanged),
            )
            .push(text_input("Email (optional)", &form.email).on_input(Message::EmailChanged));
        if !form.password.is_empty() {
            fields = fields.push(
                text(format!(
                    "Strength: {}",
                    validation::PasswordStrength::of(&form.password)
                ))
                .size(12),
            );
        }
    }

    fields
        .push(
            row![
                button(if form.registering { "Register" } else { "Log in" })
                    .on_press_maybe((!state.busy).then_some(Message::SubmitAuth))
                    .padding(10),
                button(if form.registering {
                    "I have an account"
                } else {
                    "Create account"
                })
                .on_press(Message::ToggleRegister)
                .style(button::text),
            ]
            .spacing(10),
        )
        .into()
}

fn view_library(state: &AppState) -> Element<Message> {
    if state.library.stories().is_empty() {
        return column![
            text("No stories yet").size(20),
            button("Write the first one").on_press(Message::Navigate(Screen::Generator)),
        ]
        .spacing(10)
        .into();
    }

    let mut list = column![text(state.library.summary()).size(20)].spacing(12);
    for story in state.library.current_stories() {
        list = list.push(
            button(
                column![
                    text(&story.title).size(18),
                    text(format!(
                        "{} · v{}",
                        format_date(&story.created_at),
                        story.version
                    ))
                    .size(12),
                    text(story_preview(&story.content)).size(14),
                ]
                .spacing(4),
            )
            .on_press(Message::OpenStory(story.id.clone()))
            .style(button::secondary)
            .width(Length::Fill)
            .padding(10),
        );
    }

    list.push(pagination(state.library.control(), Message::LibraryPage))
        .into()
}

fn view_story(state: &AppState) -> Element<Message> {
    let Some(story) = &state.story else {
        return text("No story selected").into();
    };

    let audio: Element<Message> = match &state.audio_url {
        Some(url) => text(format!("Audio: {}", url)).size(14).into(),
        None => button(if state.busy { "Narrating..." } else { "Narrate" })
            .on_press_maybe((!state.busy).then_some(Message::Narrate))
            .padding(8)
            .into(),
    };

    column![
        button("‹ Back to library")
            .on_press(Message::Navigate(Screen::Library))
            .style(button::text),
        text(&story.title).size(26),
        text(format!(
            "{} · v{}",
            format_date(&story.created_at),
            story.version
        ))
        .size(12),
        audio,
        text(&story.content).size(16),
    ]
    .spacing(12)
    .into()
}

fn view_generator(state: &AppState) -> Element<Message> {
    let form = &state.generator;
    column![
        text("New story").size(24),
        text("Theme *").size(14),
        text_input("A dragon who is afraid of the dark", &form.theme)
            .on_input(Message::ThemeChanged),
        text("Characters (comma separated)").size(14),
        text_input("Luna, Pip", &form.characters).on_input(Message::CharactersChanged),
        text("Moral lesson").size(14),
        text_input("Sharing makes us happy", &form.moral).on_input(Message::MoralChanged),
        row![
            column![
                text("Age (3-12)").size(14),
                text_input("6", &form.age)
                    .on_input(Message::AgeChanged)
                    .width(Length::Fixed(80.0)),
            ]
            .spacing(5),
            column![
                text("Length").size(14),
                pick_list(
                    StoryLength::ALL,
                    Some(form.length),
                    Message::LengthSelected
                ),
            ]
            .spacing(5),
        ]
        .spacing(20),
        text("Special elements").size(14),
        text_input("Rhymes, a song at the end...", &form.special)
            .on_input(Message::SpecialChanged),
        button(if state.busy { "Writing..." } else { "Generate story" })
            .on_press_maybe((!state.busy).then_some(Message::Generate))
            .padding(10),
    ]
    .spacing(8)
    .width(Length::Fixed(520.0))
    .into()
}

fn view_lessons(state: &AppState) -> Element<Message> {
    let filter = state.lessons.filter();
    let categories: Vec<String> = std::iter::once(ALL_CATEGORIES)
        .chain(LESSON_CATEGORIES)
        .map(String::from)
        .collect();
    let selected_category = filter
        .category
        .clone()
        .unwrap_or_else(|| ALL_CATEGORIES.to_string());

    let total = match state.lessons.total_all() {
        Some(all) => format!("{} of {} lessons", state.lessons.lessons().len(), all),
        None => format!("{} lessons", state.lessons.lessons().len()),
    };

    let mut list = column![
        text("Learned lessons").size(24),
        row![
            pick_list(categories, Some(selected_category), Message::CategorySelected),
            pick_list(LessonStatus::ALL, filter.status, Message::StatusSelected)
                .placeholder("status"),
            text(total).size(14),
        ]
        .spacing(10)
        .align_y(iced::Alignment::Center),
    ]
    .spacing(12);

    for lesson in state.lessons.current_lessons() {
        list = list.push(
            column![
                text(format!(
                    "[{} · {}] {}",
                    lesson.category, lesson.priority, lesson.insight
                ))
                .size(15),
                text(&lesson.actionable_guidance).size(13),
            ]
            .spacing(2),
        );
    }

    list.push(pagination(state.lessons.control(), Message::LessonsPage))
        .into()
}
