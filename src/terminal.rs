//! Line-oriented terminal front end
//!
//! Reads one line at a time from stdin and routes it to the controller
//! according to the current view. Remote completions are applied as they
//! arrive, racing against the next line of input.

use crate::api::{ServerMode, WineApi};
use crate::conversation::{Message, Origin};
use crate::credential::{ValidationError, DELIVERED_TOKEN_MAX_LEN};
use crate::locale::Locale;
use crate::runtime::SessionController;
use crate::state_machine::{AcquisitionState, Notice, TransitionError, View};
use crate::token_store::TokenStore;
use chrono::Local;
use crossterm::style::Stylize;
use crossterm::{cursor, queue, terminal};
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};

// ============================================================================
// Input Routing
// ============================================================================

/// What a line of input asks for
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Quit,
    Logout,
    Status,
    Text(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    match line.trim().to_lowercase().as_str() {
        "quit" | "exit" | "/quit" | "/exit" => Command::Quit,
        "/logout" => Command::Logout,
        "/status" => Command::Status,
        _ => Command::Text(line),
    }
}

fn is_confirmation(line: &str) -> bool {
    matches!(
        line.trim().to_ascii_lowercase().as_str(),
        "" | "y" | "yes" | "ok"
    )
}

fn mode_label(locale: Locale, mode: ServerMode) -> &'static str {
    match mode {
        ServerMode::Live => locale.mode_live(),
        ServerMode::DryRun => locale.mode_dry_run(),
        ServerMode::Unknown => locale.mode_unknown(),
    }
}

/// Route free text to the operation the current view expects
fn handle_text<S, A>(session: &mut SessionController<S, A>, line: &str) -> Option<String>
where
    S: TokenStore,
    A: WineApi + 'static,
{
    let locale = session.locale();
    let result = match session.view() {
        View::Conversation => {
            session.submit(line);
            Ok(())
        }
        View::Acquisition => match session.acquisition().cloned().unwrap_or_default() {
            AcquisitionState::AwaitingEmail { .. } | AcquisitionState::Failed { .. } => {
                session.submit_email(line)
            }
            AcquisitionState::AwaitingDeliveredToken { .. } if line.contains('@') => {
                session.submit_email(line)
            }
            AcquisitionState::AwaitingDeliveredToken { .. } => session.enter_delivered_token(line),
            AcquisitionState::TokenDisplayedForConfirmation { .. } if is_confirmation(line) => {
                session.confirm_displayed_token()
            }
            AcquisitionState::TokenDisplayedForConfirmation { .. } => Ok(()),
            AcquisitionState::RequestingToken { .. } => Err(TransitionError::TokenRequestInFlight),
        },
    };

    match result {
        Ok(()) => None,
        Err(TransitionError::Validation(e)) => {
            tracing::debug!(error = %e, "Input rejected");
            match e {
                ValidationError::EmptyEmail | ValidationError::MalformedEmail(_) => {
                    Some(locale.invalid_email().to_string())
                }
                ValidationError::EmptyToken | ValidationError::TokenTooLong { .. } => {
                    Some(locale.invalid_token(DELIVERED_TOKEN_MAX_LEN))
                }
                ValidationError::EmptyQuery => None,
            }
        }
        Err(e) => {
            tracing::debug!(error = %e, "Input ignored");
            None
        }
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Local wall-clock time a message was created, as HH:MM
fn timestamp(message: &Message) -> String {
    message
        .created_at
        .with_timezone(&Local)
        .format("%H:%M")
        .to_string()
}

/// Incremental renderer: prints each message once, in log order
struct Screen<W> {
    out: W,
    locale: Locale,
    printed: usize,
    shown_acquisition: Option<AcquisitionState>,
    indicator_shown: bool,
    welcomed: bool,
}

impl<W: Write> Screen<W> {
    fn new(out: W, locale: Locale) -> Self {
        Self {
            out,
            locale,
            printed: 0,
            shown_acquisition: None,
            indicator_shown: false,
            welcomed: false,
        }
    }

    fn line(&mut self, text: impl std::fmt::Display) -> io::Result<()> {
        writeln!(self.out, "{text}")
    }

    fn clear_indicator(&mut self) -> io::Result<()> {
        if self.indicator_shown {
            queue!(
                self.out,
                cursor::MoveToColumn(0),
                terminal::Clear(terminal::ClearType::CurrentLine)
            )?;
            self.indicator_shown = false;
        }
        Ok(())
    }

    fn banner(&mut self, server_url: &str, mode: ServerMode) -> io::Result<()> {
        let locale = self.locale;
        self.line(locale.banner().bold())?;
        self.line(
            locale
                .connected(server_url, mode_label(locale, mode))
                .dark_grey(),
        )?;
        self.line(locale.usage_hint().dark_grey())
    }

    fn welcome(&mut self) -> io::Result<()> {
        let locale = self.locale;
        self.line("")?;
        self.line(locale.welcome().bold())?;
        self.line(locale.welcome_examples_heading().dark_grey())?;
        for example in locale.welcome_examples() {
            self.line(format!("  - {example}").dark_grey())?;
        }
        self.line("")?;
        self.welcomed = true;
        Ok(())
    }

    fn render<S, A>(&mut self, session: &mut SessionController<S, A>) -> io::Result<()>
    where
        S: TokenStore,
        A: WineApi + 'static,
    {
        let locale = self.locale;
        let view = session.view();
        self.clear_indicator()?;

        if view == View::Conversation && session.log().is_empty() && !self.welcomed {
            self.welcome()?;
        }

        for message in session.log().since(self.printed) {
            let stamp = format!("[{}]", timestamp(message)).dark_grey();
            match message.origin {
                // The text is already on screen as typed
                Origin::User => writeln!(self.out, "{stamp}")?,
                Origin::Assistant => {
                    writeln!(
                        self.out,
                        "{} {} {}",
                        stamp,
                        format!("{}:", locale.assistant_label()).magenta().bold(),
                        message.text
                    )?;
                }
            }
        }
        self.printed = session.messages().len();

        for notice in session.drain_notices() {
            match notice {
                Notice::CredentialConfirmed => self.line(locale.signed_in().green())?,
                Notice::SignedOut => self.line(locale.signed_out().yellow())?,
                // The expiry notice is already in the log
                Notice::CredentialInvalidated => {}
            }
        }

        let acquisition = match view {
            View::Conversation => None,
            View::Acquisition => Some(session.acquisition().cloned().unwrap_or_default()),
        };
        let changed = acquisition != self.shown_acquisition;
        match &acquisition {
            None if session.is_pending() => {
                write!(self.out, "{}", locale.thinking().dark_grey().italic())?;
                self.indicator_shown = true;
            }
            None => write!(self.out, "{}", locale.prompt_query().cyan().bold())?,
            Some(AcquisitionState::RequestingToken { .. }) => {
                write!(self.out, "{}", locale.requesting_token().dark_grey().italic())?;
                self.indicator_shown = true;
            }
            Some(AcquisitionState::AwaitingEmail { error }) => {
                if let (true, Some(error)) = (changed, error) {
                    self.line(error.as_str().red())?;
                }
                write!(self.out, "{}", locale.prompt_email().cyan())?;
            }
            Some(AcquisitionState::Failed { .. }) => {
                write!(self.out, "{}", locale.prompt_email().cyan())?;
            }
            Some(AcquisitionState::AwaitingDeliveredToken { notice, .. }) => {
                if changed {
                    self.line(notice.as_str().green())?;
                }
                write!(self.out, "{}", locale.prompt_delivered_token().cyan())?;
            }
            Some(AcquisitionState::TokenDisplayedForConfirmation { token, notice }) => {
                if changed {
                    self.line(notice.as_str().green())?;
                }
                write!(
                    self.out,
                    "{}",
                    locale.prompt_confirm_token(token.as_str()).cyan()
                )?;
            }
        }
        self.shown_acquisition = acquisition;
        self.out.flush()
    }
}

// ============================================================================
// Main Loop
// ============================================================================

/// Stdin closed: apply outstanding completions so their replies are shown
async fn finish_input<S, A, W>(
    session: &mut SessionController<S, A>,
    screen: &mut Screen<W>,
) -> io::Result<()>
where
    S: TokenStore,
    A: WineApi + 'static,
    W: Write,
{
    if session.has_outstanding_call() {
        session.settle().await;
        screen.render(session)?;
    }
    screen.clear_indicator()?;
    screen.line("")
}

/// Run the interactive session until the user quits or stdin closes
pub async fn run<S, A>(session: &mut SessionController<S, A>, server_url: &str) -> io::Result<()>
where
    S: TokenStore,
    A: WineApi + 'static,
{
    let locale = session.locale();
    let mut screen = Screen::new(io::stdout(), locale);
    let mode = session.server_mode().await;
    screen.banner(server_url, mode)?;
    screen.render(session)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    finish_input(session, &mut screen).await?;
                    break;
                };

                match parse_command(&line) {
                    Command::Quit => break,
                    Command::Logout => {
                        if let Err(e) = session.sign_out() {
                            tracing::debug!(error = %e, "Sign out ignored");
                        }
                    }
                    Command::Status => {
                        let mode = session.server_mode().await;
                        screen.line(locale.connected(server_url, mode_label(locale, mode)).dark_grey())?;
                    }
                    Command::Text(text) => {
                        if let Some(hint) = handle_text(session, text) {
                            screen.line(hint.red())?;
                        }
                    }
                }
            }
            Some(event) = session.next_completion() => {
                session.handle_completion(event);
            }
        }
        screen.render(session)?;
    }

    screen.line(locale.goodbye())?;
    tracing::info!(messages = session.log().len(), "Session ended");
    Ok(())
}
