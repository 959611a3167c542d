//! Interactive shell — stdin/stdout REPL around the oracle.
//!
//! Lines starting with one of the shell commands below are handled here;
//! everything else (including the mock's own `/draw`-style commands) goes to
//! the active responder.

use std::io::Write;

use anyhow::{Context, bail};
use secrecy::SecretString;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::{OracleConfig, ResponderMode};
use crate::llm::{Provider, fetch_available_models};
use crate::locale::Locale;
use crate::recovery::{ErrorHandler, HandlingOptions};
use crate::render;
use crate::responder::llm::LlmConfigUpdate;
use crate::responder::{FailureNotice, LlmResponder, MockResponder, Responder, ResponseEvent};
use crate::store::{ChatSession, SessionMessage};
use crate::turn::{TurnDriver, TurnOutcome};

/// Attempts for model listing before giving up.
const MODEL_FETCH_ATTEMPTS: u32 = 2;

/// Commands the shell handles itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Quit,
    Clear,
    Mode(Option<String>),
    Lang(Option<String>),
    Models,
    Errors,
    Dismiss,
    Retry,
    Config(Vec<String>),
}

impl ShellCommand {
    /// `None` when the line is not a shell command.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let head = parts.next()?.to_ascii_lowercase();
        let arg = parts.clone().next().map(str::to_string);

        let command = match head.as_str() {
            "/quit" | "/exit" => Self::Quit,
            "/clear" => Self::Clear,
            "/mode" => Self::Mode(arg),
            "/lang" => Self::Lang(arg),
            "/models" => Self::Models,
            "/errors" => Self::Errors,
            "/dismiss" => Self::Dismiss,
            "/retry" => Self::Retry,
            "/config" => Self::Config(parts.map(str::to_string).collect()),
            _ => return None,
        };
        Some(command)
    }
}

/// What the loop does after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// REPL state: configuration, both responders, and the UI stores.
pub struct Shell {
    config: OracleConfig,
    chat: ChatSession,
    errors: ErrorHandler,
    mock: MockResponder,
    llm: LlmResponder,
    failures: mpsc::UnboundedReceiver<FailureNotice>,
    last_input: Option<String>,
}

impl Shell {
    pub fn new(config: OracleConfig) -> Self {
        let (tx, failures) = mpsc::unbounded_channel();
        let mock = MockResponder::new(config.mock_config(), config.locale);
        let llm = LlmResponder::new(config.responder_config()).with_failure_channel(tx);
        let mut errors = ErrorHandler::default();
        errors.set_provider(config.provider);

        Self {
            config,
            chat: ChatSession::new(),
            errors,
            mock,
            llm,
            failures,
            last_input: None,
        }
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    pub fn errors(&self) -> &ErrorHandler {
        &self.errors
    }

    /// Read lines from stdin until EOF or `/quit`.
    pub async fn run(mut self) -> anyhow::Result<()> {
        self.greet();

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            eprint!("> ");
            let Some(line) = lines.next_line().await.context("reading stdin")? else {
                break;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match self.handle_line(line).await {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => eprintln!("❌ {:#}", e),
            }
        }

        info!("Shell exiting");
        Ok(())
    }

    fn greet(&mut self) {
        let strings = self.config.locale.strings();
        println!("🔮 {} v{}", strings.title, env!("CARGO_PKG_VERSION"));
        println!("   {}", strings.subtitle);
        println!(
            "   Mode: {} | Provider: {} | Locale: {}",
            self.config.mode, self.config.provider, self.config.locale
        );

        let welcome = match self.config.mode {
            ResponderMode::Mock => {
                println!("   {}", strings.debug_mode);
                strings.welcome_debug
            }
            ResponderMode::Real => strings.welcome,
        };
        println!("\n{}\n", welcome);
        self.chat.append(SessionMessage::assistant(welcome));

        if self.config.mode == ResponderMode::Real && !self.config.has_api_key() {
            self.errors.handle_api_key_missing();
            self.show_current_error();
        }
    }

    /// Handle one non-empty input line.
    pub async fn handle_line(&mut self, line: &str) -> anyhow::Result<Flow> {
        let Some(command) = ShellCommand::parse(line) else {
            self.send_turn(line).await;
            return Ok(Flow::Continue);
        };

        match command {
            ShellCommand::Quit => return Ok(Flow::Quit),
            ShellCommand::Clear => {
                self.chat.clear();
                self.llm.clear_history().await;
                self.errors.store_mut().dismiss_error();
                self.last_input = None;
                println!("Conversation cleared.");
            }
            ShellCommand::Mode(arg) => self.set_mode(arg.as_deref())?,
            ShellCommand::Lang(arg) => self.set_lang(arg.as_deref())?,
            ShellCommand::Models => self.list_models().await,
            ShellCommand::Errors => {
                println!("{}", render::error_history(self.errors.store().recent_errors()));
            }
            ShellCommand::Dismiss => self.errors.store_mut().dismiss_error(),
            ShellCommand::Retry => self.retry().await,
            ShellCommand::Config(args) => self.configure(&args)?,
        }
        Ok(Flow::Continue)
    }

    /// Run one turn through the active responder and print it as it streams.
    async fn send_turn(&mut self, input: &str) -> TurnOutcome {
        while self.failures.try_recv().is_ok() {}

        let strings = self.config.locale.strings();
        eprintln!("⏳ {}", strings.thinking);

        let mut observer = |event: &ResponseEvent| match event {
            ResponseEvent::Text { chunk, .. } => {
                print!("{}", chunk);
                let _ = std::io::stdout().flush();
            }
            ResponseEvent::Component(component) => {
                println!("{}", render::component(component, strings));
            }
            ResponseEvent::Done { .. } | ResponseEvent::Error { .. } => println!(),
        };

        let responder: &dyn Responder = match self.config.mode {
            ResponderMode::Mock => &self.mock,
            ResponderMode::Real => &self.llm,
        };
        let outcome = TurnDriver::new(&mut self.chat, &mut self.errors)
            .with_failures(&mut self.failures)
            .run(responder, input, &mut observer)
            .await;

        self.last_input = Some(input.to_string());
        match &outcome {
            TurnOutcome::Completed { .. } => self.errors.store_mut().dismiss_error(),
            TurnOutcome::Failed { .. } => self.show_current_error(),
        }
        outcome
    }

    async fn retry(&mut self) {
        let Some(input) = self.last_input.clone() else {
            println!("Nothing to retry.");
            return;
        };
        let store = self.errors.store();
        if store.has_active_error() && !store.can_retry() {
            println!(
                "Retry limit reached ({}). Use /dismiss and try again later.",
                store.max_auto_retries()
            );
            return;
        }

        self.errors.store_mut().increment_retry_count();
        self.send_turn(&input).await;
    }

    fn set_mode(&mut self, arg: Option<&str>) -> anyhow::Result<()> {
        let Some(arg) = arg else {
            println!("Mode: {}", self.config.mode);
            return Ok(());
        };
        self.config.mode = arg.parse()?;
        println!("Mode: {}", self.config.mode);

        if self.config.mode == ResponderMode::Real && !self.config.has_api_key() {
            self.errors.handle_api_key_missing();
            self.show_current_error();
        }
        self.persist();
        Ok(())
    }

    fn set_lang(&mut self, arg: Option<&str>) -> anyhow::Result<()> {
        let Some(arg) = arg else {
            println!("Locale: {}", self.config.locale);
            return Ok(());
        };
        let locale: Locale = arg.parse().map_err(anyhow::Error::msg)?;
        self.config.locale = locale;
        self.mock.set_locale(locale);
        self.llm.update_config(LlmConfigUpdate {
            locale: Some(locale),
            ..Default::default()
        });
        println!("Locale: {}", locale);
        self.persist();
        Ok(())
    }

    async fn list_models(&mut self) {
        let provider = self.config.provider;
        let key = self.config.api_key.clone();
        let options = HandlingOptions {
            retry: true,
            max_retries: MODEL_FETCH_ATTEMPTS,
            ..Default::default()
        };

        let result = self
            .errors
            .with_error_handling(|| fetch_available_models(provider, key.as_ref()), options)
            .await;

        match result {
            Ok(models) => {
                println!("{} models for {}:", models.len(), provider);
                for model in models {
                    let marker = if model.id == self.config.model { "*" } else { " " };
                    println!(" {} {} ({})", marker, model.name, model.id);
                }
            }
            Err(_) => self.show_current_error(),
        }
    }

    /// `/config` with no arguments shows settings; subcommands change them.
    fn configure(&mut self, args: &[String]) -> anyhow::Result<()> {
        let sub = args.first().map(String::as_str);
        let value = args.get(1).map(String::as_str);

        match (sub, value) {
            (None, _) => self.print_config(),
            (Some("provider"), Some(name)) => {
                let provider: Provider = name.parse()?;
                self.config.provider = provider;
                self.config.model.clear();
                self.errors.set_provider(provider);
                self.llm.update_config(LlmConfigUpdate {
                    provider: Some(provider),
                    model: Some(String::new()),
                    ..Default::default()
                });
                println!("Provider: {} (model {})", provider, provider.default_model());
                self.persist();
            }
            (Some("key"), Some(key)) => {
                let key = SecretString::from(key.to_string());
                self.config.api_key = Some(key.clone());
                self.llm.update_config(LlmConfigUpdate {
                    api_key: Some(key),
                    ..Default::default()
                });
                self.errors.store_mut().dismiss_error();
                println!("API key set.");
                self.persist();
            }
            (Some("model"), model) => {
                let model = model.unwrap_or_default().to_string();
                self.config.model = model.clone();
                self.llm.update_config(LlmConfigUpdate {
                    model: Some(model),
                    ..Default::default()
                });
                println!("Model: {}", self.model_label());
                self.persist();
            }
            (Some("persist"), Some(flag)) => {
                self.config.persist_keys = match flag {
                    "on" | "true" | "yes" => true,
                    "off" | "false" | "no" => false,
                    other => bail!("expected on or off, got '{}'", other),
                };
                println!("Persist API key: {}", self.config.persist_keys);
                self.persist();
            }
            (Some("save"), _) => {
                self.config.save()?;
                println!("Saved to {}", self.config.settings_path.display());
            }
            (Some("reset"), _) => {
                self.config.clear()?;
                println!("Removed {}", self.config.settings_path.display());
            }
            (Some(other), _) => bail!(
                "unknown /config option '{}' (provider, key, model, persist, save, reset)",
                other
            ),
        }
        Ok(())
    }

    fn print_config(&self) {
        let key = if self.config.has_api_key() {
            "set"
        } else {
            "not set"
        };
        println!("Mode:        {}", self.config.mode);
        println!("Provider:    {}", self.config.provider);
        println!("Model:       {}", self.model_label());
        println!("Locale:      {}", self.config.locale);
        println!("API key:     {}", key);
        println!("Persist key: {}", self.config.persist_keys);
        println!("Settings:    {}", self.config.settings_path.display());
    }

    fn model_label(&self) -> String {
        if self.config.model.is_empty() {
            format!("{} (default)", self.config.provider.default_model())
        } else {
            self.config.model.clone()
        }
    }

    /// Save settings after a change. Failures are logged, not fatal.
    fn persist(&self) {
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Could not save settings");
        }
    }

    fn show_current_error(&self) {
        if let Some(record) = self.errors.store().current() {
            eprintln!("\n{}\n", render::notice(record, self.config.locale.strings()));
        }
    }
}
