use std::io::{self, Write};

use anyhow::Result;
use bat::WrappingMode;
use cliclack::{input, spinner};
use console::style;
use loanbot::models::message::Message;
use loanbot::models::role::Role;

use super::prompt::{Input, InputType, Prompt, Theme};

pub struct CliclackPrompt {
    spinner: cliclack::ProgressBar,
    theme: Theme,
}

impl CliclackPrompt {
    pub fn new() -> Self {
        CliclackPrompt {
            spinner: spinner(),
            theme: Theme::Dark,
        }
    }

    fn theme_name(&self) -> &'static str {
        match self.theme {
            Theme::Light => "GitHub",
            Theme::Dark => "zenburn",
        }
    }
}

/// Render markdown to stdout, falling back to plain text if highlighting fails
pub fn print_markdown(content: &str, theme: &str) {
    let printed = bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()))
        .theme(theme)
        .language("Markdown")
        .wrapping_mode(WrappingMode::Character)
        .print();
    if printed.is_err() {
        println!("{}", content);
    }
}

impl Prompt for CliclackPrompt {
    fn render(&mut self, message: &Message) {
        match message.role {
            Role::User => println!("{} {}", style(">").cyan().bold(), style(message.text()).dim()),
            _ => print_markdown(message.text(), self.theme_name()),
        }
        println!();
        io::stdout().flush().ok();
    }

    fn render_info(&mut self, text: &str) {
        println!("{}", style(text).dim());
    }

    fn render_error(&mut self, text: &str) {
        eprintln!("{} {}", style("Error:").red().bold(), text);
    }

    fn show_busy(&mut self) {
        self.spinner = spinner();
        self.spinner.start("awaiting reply");
    }

    fn hide_busy(&mut self) {
        self.spinner.stop("");
    }

    fn get_input(&mut self) -> Result<Input> {
        let message_text: String = input("Loanbot Chat:  [Help: /?]")
            .placeholder("")
            .interact()?;
        let message_text = message_text.trim().to_string();

        if message_text.eq_ignore_ascii_case("/exit") || message_text.eq_ignore_ascii_case("/quit")
        {
            Ok(Input {
                input_type: InputType::Exit,
                content: None,
            })
        } else if message_text.eq_ignore_ascii_case("/history") {
            Ok(Input {
                input_type: InputType::History,
                content: None,
            })
        } else if message_text.eq_ignore_ascii_case("/t") {
            self.theme = match self.theme {
                Theme::Light => {
                    println!("Switching to Dark theme");
                    Theme::Dark
                }
                Theme::Dark => {
                    println!("Switching to Light theme");
                    Theme::Light
                }
            };
            Ok(Input {
                input_type: InputType::AskAgain,
                content: None,
            })
        } else if message_text.eq_ignore_ascii_case("/?") {
            println!("Commands:");
            println!("/exit - Exit the session");
            println!("/history - Show the conversation so far");
            println!("/t - Toggle Light/Dark theme");
            println!("/? - Display this help message");
            println!("Ctrl+C - Cancel the question being answered");
            Ok(Input {
                input_type: InputType::AskAgain,
                content: None,
            })
        } else if message_text.is_empty() {
            Ok(Input {
                input_type: InputType::AskAgain,
                content: None,
            })
        } else {
            Ok(Input {
                input_type: InputType::Message,
                content: Some(message_text),
            })
        }
    }

    fn close(&self) {
        // No cleanup required
    }
}
