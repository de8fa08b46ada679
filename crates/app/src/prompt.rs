//! Terminal input and output for the host.
//!
//! Codes are read in raw mode and echoed as `*`; everything goes to stderr so
//! stdout stays clean.

use std::io::{Stderr, Write};

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    style::{Print, PrintStyledContent, Stylize, style},
    terminal::{self, ClearType},
};
use engine::{Notice, NoticeLevel};

use crate::error::{AppError, Result};

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

pub struct Console {
    out: Stderr,
}

impl Console {
    pub fn stderr() -> Self {
        Self {
            out: std::io::stderr(),
        }
    }

    pub fn line(&mut self, text: &str) -> Result<()> {
        execute!(self.out, Print(text), Print("\r\n"))?;
        Ok(())
    }

    pub fn notice(&mut self, notice: &Notice) -> Result<()> {
        let content = style(notice.message.as_str());
        let styled = match notice.level {
            NoticeLevel::Info => content.cyan(),
            NoticeLevel::Success => content.green(),
            NoticeLevel::Error => content.red(),
        };
        execute!(self.out, PrintStyledContent(styled), Print("\r\n"))?;
        Ok(())
    }

    /// Reads a one-time code without echoing it. Any printable character is
    /// accepted; the backend judges the code.
    pub fn read_code(&mut self, prompt: &str) -> Result<String> {
        let _raw = RawModeGuard::enter()?;
        self.start_prompt(prompt)?;

        let mut buf = String::new();
        loop {
            let (code, modifiers) = next_key()?;
            match code {
                KeyCode::Enter => {
                    execute!(self.out, Print("\r\n"))?;
                    return Ok(buf);
                }
                KeyCode::Backspace => {
                    if buf.pop().is_some() {
                        execute!(self.out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    }
                }
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                    return Err(self.interrupted());
                }
                KeyCode::Char(ch) if is_code_char(ch, modifiers) => {
                    buf.push(ch);
                    execute!(self.out, Print("*"))?;
                }
                _ => {}
            }
            self.out.flush()?;
        }
    }

    /// Yes/no question; Enter picks `default`.
    pub fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        let _raw = RawModeGuard::enter()?;
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        self.start_prompt(&format!("{prompt} {hint} "))?;

        loop {
            let (code, modifiers) = next_key()?;
            let answer = match code {
                KeyCode::Enter => default,
                KeyCode::Char('y' | 'Y') => true,
                KeyCode::Char('n' | 'N') | KeyCode::Esc => false,
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                    return Err(self.interrupted());
                }
                _ => continue,
            };
            execute!(self.out, Print(if answer { "y" } else { "n" }), Print("\r\n"))?;
            return Ok(answer);
        }
    }

    fn start_prompt(&mut self, prompt: &str) -> Result<()> {
        execute!(
            self.out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print(prompt)
        )?;
        self.out.flush()?;
        Ok(())
    }

    fn interrupted(&mut self) -> AppError {
        let _ = execute!(self.out, Print("\r\n"));
        AppError::Terminal("interrupted".to_string())
    }
}

fn is_code_char(ch: char, modifiers: KeyModifiers) -> bool {
    !ch.is_control() && !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
}

fn next_key() -> Result<(KeyCode, KeyModifiers)> {
    loop {
        if let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = event::read()?
        {
            return Ok((code, modifiers));
        }
    }
}
