//! TUI application - key handling and UI-only state
//!
//! `App` holds what the controller does not care about: text being typed,
//! which login field has focus, the loading-message rotation. Keys are
//! mapped to `UiAction`s which the runner applies to the controller. No
//! rendering happens here.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, trace};

use crate::config::UiConfig;
use crate::controller::Screen;

/// Messages cycled on the processing screen
pub const LOADING_MESSAGES: [&str; 6] = [
    "Analyzing your vibe... ✨",
    "Finding patterns in your pins... 📌",
    "Turning aesthetic ideas into real steps... 🌸",
    "Organizing your future habits... 🍵",
    "Consulting the inspiration spirits... 🌙",
    "Almost ready for your real-life upgrade... 🚀",
];

/// Focused input on the login screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    Email,
    Password,
}

impl LoginField {
    fn next(self) -> Self {
        match self {
            LoginField::Email => LoginField::Password,
            LoginField::Password => LoginField::Email,
        }
    }
}

/// What the user asked for, to be applied by the runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    Quit,
    GoToLogin,
    GoToPricing,
    Back,
    SignIn { email: String, password: String },
    SignUp { email: String, password: String },
    OAuth,
    SubmitUrl(String),
    NewPlan,
    Logout,
    DismissError,
}

/// TUI application state
#[derive(Debug)]
pub struct App {
    pub url_input: String,
    pub email_input: String,
    pub password_input: String,
    pub focus: LoginField,
    /// Login form creates an account instead of signing in
    pub sign_up_mode: bool,
    /// Index into LOADING_MESSAGES
    pub loading_index: usize,
    /// Scroll offset of the result screen
    pub result_scroll: u16,
    pub should_quit: bool,
    ticks_per_message: u32,
    ticks: u32,
}

impl Default for App {
    fn default() -> Self {
        Self::new(&UiConfig::default())
    }
}

impl App {
    pub fn new(config: &UiConfig) -> Self {
        let tick_ms = config.tick_ms.max(1);
        let ticks_per_message = (config.loading_message_ms / tick_ms).max(1) as u32;
        debug!(ticks_per_message, "App::new: called");
        Self {
            url_input: String::new(),
            email_input: String::new(),
            password_input: String::new(),
            focus: LoginField::Email,
            sign_up_mode: false,
            loading_index: 0,
            result_scroll: 0,
            should_quit: false,
            ticks_per_message,
            ticks: 0,
        }
    }

    /// Loading message currently shown
    pub fn loading_message(&self) -> &'static str {
        LOADING_MESSAGES[self.loading_index % LOADING_MESSAGES.len()]
    }

    /// Restart the loading rotation
    pub fn start_loading(&mut self) {
        self.loading_index = 0;
        self.ticks = 0;
        self.result_scroll = 0;
    }

    /// Advance timers
    pub fn on_tick(&mut self) {
        trace!("App::on_tick: called");
        self.ticks += 1;
        if self.ticks >= self.ticks_per_message {
            self.ticks = 0;
            self.loading_index = (self.loading_index + 1) % LOADING_MESSAGES.len();
        }
    }

    /// Forget typed credentials
    pub fn clear_credentials(&mut self) {
        self.password_input.clear();
        self.focus = LoginField::Email;
    }

    /// Fresh login form
    pub fn reset_login(&mut self) {
        self.email_input.clear();
        self.clear_credentials();
        self.sign_up_mode = false;
    }

    /// Map a key to an action for the given screen
    pub fn handle_key(&mut self, screen: Screen, key: KeyEvent) -> Option<UiAction> {
        debug!(?key, %screen, "App::handle_key: called");
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(UiAction::Quit);
        }

        match screen {
            Screen::Landing => self.handle_landing_key(key),
            Screen::Pricing => self.handle_pricing_key(key),
            Screen::Login => self.handle_login_key(key),
            Screen::Dashboard => self.handle_dashboard_key(key),
            Screen::Processing => self.handle_processing_key(key),
            Screen::Result => self.handle_result_key(key),
        }
    }

    fn handle_landing_key(&mut self, key: KeyEvent) -> Option<UiAction> {
        match key.code {
            KeyCode::Enter | KeyCode::Char('s') => Some(UiAction::GoToLogin),
            KeyCode::Char('p') => Some(UiAction::GoToPricing),
            KeyCode::Char('q') | KeyCode::Esc => Some(UiAction::Quit),
            _ => None,
        }
    }

    fn handle_pricing_key(&mut self, key: KeyEvent) -> Option<UiAction> {
        match key.code {
            KeyCode::Enter | KeyCode::Char('s') => Some(UiAction::GoToLogin),
            KeyCode::Esc | KeyCode::Char('b') => Some(UiAction::Back),
            KeyCode::Char('q') => Some(UiAction::Quit),
            _ => None,
        }
    }

    fn handle_login_key(&mut self, key: KeyEvent) -> Option<UiAction> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => Some(UiAction::Back),
            KeyCode::Char('t') if ctrl => {
                self.sign_up_mode = !self.sign_up_mode;
                debug!(sign_up_mode = self.sign_up_mode, "App::handle_login_key: toggled form");
                None
            }
            KeyCode::Char('o') if ctrl => Some(UiAction::OAuth),
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.focus = self.focus.next();
                None
            }
            KeyCode::Enter => match self.focus {
                LoginField::Email => {
                    self.focus = LoginField::Password;
                    None
                }
                LoginField::Password => {
                    let email = self.email_input.trim().to_string();
                    let password = self.password_input.clone();
                    if self.sign_up_mode {
                        Some(UiAction::SignUp { email, password })
                    } else {
                        Some(UiAction::SignIn { email, password })
                    }
                }
            },
            KeyCode::Backspace => {
                self.focused_input().pop();
                None
            }
            KeyCode::Char(c) if !ctrl => {
                self.focused_input().push(c);
                None
            }
            _ => None,
        }
    }

    fn focused_input(&mut self) -> &mut String {
        match self.focus {
            LoginField::Email => &mut self.email_input,
            LoginField::Password => &mut self.password_input,
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyEvent) -> Option<UiAction> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter => Some(UiAction::SubmitUrl(self.url_input.clone())),
            KeyCode::Esc => Some(UiAction::DismissError),
            KeyCode::Char('l') if ctrl => Some(UiAction::Logout),
            KeyCode::Char('u') if ctrl => {
                self.url_input.clear();
                None
            }
            KeyCode::Backspace => {
                self.url_input.pop();
                None
            }
            KeyCode::Char(c) if !ctrl => {
                self.url_input.push(c);
                None
            }
            _ => None,
        }
    }

    fn handle_processing_key(&mut self, key: KeyEvent) -> Option<UiAction> {
        match key.code {
            KeyCode::Char('l') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(UiAction::Logout),
            _ => None,
        }
    }

    fn handle_result_key(&mut self, key: KeyEvent) -> Option<UiAction> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('n') | KeyCode::Enter => Some(UiAction::NewPlan),
            KeyCode::Char('l') if ctrl => Some(UiAction::Logout),
            KeyCode::Char('q') => Some(UiAction::Quit),
            KeyCode::Down | KeyCode::Char('j') => {
                self.result_scroll = self.result_scroll.saturating_add(1);
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.result_scroll = self.result_scroll.saturating_sub(1);
                None
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::from(code)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_text(app: &mut App, screen: Screen, text: &str) {
        for c in text.chars() {
            assert_eq!(app.handle_key(screen, key(KeyCode::Char(c))), None);
        }
    }

    #[test]
    fn test_ctrl_c_quits_everywhere() {
        let mut app = App::default();
        for screen in [
            Screen::Landing,
            Screen::Login,
            Screen::Pricing,
            Screen::Dashboard,
            Screen::Processing,
            Screen::Result,
        ] {
            assert_eq!(app.handle_key(screen, ctrl('c')), Some(UiAction::Quit));
        }
    }

    #[test]
    fn test_landing_keys() {
        let mut app = App::default();
        assert_eq!(app.handle_key(Screen::Landing, key(KeyCode::Enter)), Some(UiAction::GoToLogin));
        assert_eq!(app.handle_key(Screen::Landing, key(KeyCode::Char('p'))), Some(UiAction::GoToPricing));
        assert_eq!(app.handle_key(Screen::Landing, key(KeyCode::Char('q'))), Some(UiAction::Quit));
    }

    #[test]
    fn test_login_form_sign_in() {
        let mut app = App::default();
        type_text(&mut app, Screen::Login, "me@example.com");
        assert_eq!(app.handle_key(Screen::Login, key(KeyCode::Enter)), None);
        assert_eq!(app.focus, LoginField::Password);
        type_text(&mut app, Screen::Login, "hunter2");

        assert_eq!(
            app.handle_key(Screen::Login, key(KeyCode::Enter)),
            Some(UiAction::SignIn {
                email: "me@example.com".to_string(),
                password: "hunter2".to_string(),
            })
        );
    }

    #[test]
    fn test_login_form_sign_up_toggle() {
        let mut app = App::default();
        app.handle_key(Screen::Login, ctrl('t'));
        assert!(app.sign_up_mode);

        type_text(&mut app, Screen::Login, "new@example.com");
        app.handle_key(Screen::Login, key(KeyCode::Tab));
        type_text(&mut app, Screen::Login, "pw");

        assert!(matches!(
            app.handle_key(Screen::Login, key(KeyCode::Enter)),
            Some(UiAction::SignUp { .. })
        ));
    }

    #[test]
    fn test_login_backspace_edits_focused_field() {
        let mut app = App::default();
        type_text(&mut app, Screen::Login, "abc");
        app.handle_key(Screen::Login, key(KeyCode::Backspace));
        assert_eq!(app.email_input, "ab");
        assert!(app.password_input.is_empty());
    }

    #[test]
    fn test_login_oauth_and_back() {
        let mut app = App::default();
        assert_eq!(app.handle_key(Screen::Login, ctrl('o')), Some(UiAction::OAuth));
        assert_eq!(app.handle_key(Screen::Login, key(KeyCode::Esc)), Some(UiAction::Back));
    }

    #[test]
    fn test_dashboard_submit() {
        let mut app = App::default();
        type_text(&mut app, Screen::Dashboard, "https://pinterest.com/u/b");
        assert_eq!(
            app.handle_key(Screen::Dashboard, key(KeyCode::Enter)),
            Some(UiAction::SubmitUrl("https://pinterest.com/u/b".to_string()))
        );
        // 'q' is text here, not quit
        assert_eq!(app.handle_key(Screen::Dashboard, key(KeyCode::Char('q'))), None);
        assert!(app.url_input.ends_with('q'));
    }

    #[test]
    fn test_dashboard_logout_and_clear() {
        let mut app = App::default();
        type_text(&mut app, Screen::Dashboard, "abc");
        app.handle_key(Screen::Dashboard, ctrl('u'));
        assert!(app.url_input.is_empty());
        assert_eq!(app.handle_key(Screen::Dashboard, ctrl('l')), Some(UiAction::Logout));
    }

    #[test]
    fn test_processing_ignores_input() {
        let mut app = App::default();
        assert_eq!(app.handle_key(Screen::Processing, key(KeyCode::Enter)), None);
        assert_eq!(app.handle_key(Screen::Processing, key(KeyCode::Char('q'))), None);
    }

    #[test]
    fn test_result_keys() {
        let mut app = App::default();
        app.handle_key(Screen::Result, key(KeyCode::Down));
        app.handle_key(Screen::Result, key(KeyCode::Down));
        app.handle_key(Screen::Result, key(KeyCode::Up));
        assert_eq!(app.result_scroll, 1);
        assert_eq!(app.handle_key(Screen::Result, key(KeyCode::Char('n'))), Some(UiAction::NewPlan));
    }

    #[test]
    fn test_loading_rotation() {
        let config = UiConfig {
            tick_ms: 100,
            loading_message_ms: 300,
        };
        let mut app = App::new(&config);
        assert_eq!(app.loading_message(), LOADING_MESSAGES[0]);

        for _ in 0..3 {
            app.on_tick();
        }
        assert_eq!(app.loading_message(), LOADING_MESSAGES[1]);

        for _ in 0..3 * (LOADING_MESSAGES.len() - 1) {
            app.on_tick();
        }
        assert_eq!(app.loading_message(), LOADING_MESSAGES[0]);

        app.on_tick();
        app.start_loading();
        assert_eq!(app.loading_index, 0);
    }

    #[test]
    fn test_reset_login() {
        let mut app = App::default();
        app.sign_up_mode = true;
        type_text(&mut app, Screen::Login, "me@example.com");
        app.handle_key(Screen::Login, key(KeyCode::Tab));
        type_text(&mut app, Screen::Login, "pw");

        app.reset_login();
        assert!(app.email_input.is_empty());
        assert!(app.password_input.is_empty());
        assert_eq!(app.focus, LoginField::Email);
        assert!(!app.sign_up_mode);
    }
}
