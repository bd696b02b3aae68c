use anyhow::Result;
use loanbot::models::message::Message;

pub trait Prompt {
    fn render(&mut self, message: &Message);
    fn render_info(&mut self, text: &str);
    fn render_error(&mut self, text: &str);
    fn get_input(&mut self) -> Result<Input>;
    fn show_busy(&mut self);
    fn hide_busy(&mut self);
    fn close(&self);
    fn ready(&self) {
        println!();
        println!("Loanbot is ready! Ask anything about your loan.");
        println!();
    }
}

pub struct Input {
    pub input_type: InputType,
    pub content: Option<String>, // Optional content as sometimes the user may be issuing a command eg. (Exit)
}

pub enum InputType {
    AskAgain, // Ask the user for input again. Control flow command.
    Message,  // User sent a message
    History,  // Show the transcript so far
    Exit,     // User wants to exit the session
}

pub enum Theme {
    Light,
    Dark,
}
