//! `offmap ask`

use console::style;
use dialoguer::Input;
use offmap::app::AppError;
use offmap::assistant::{greeting, Assistant, ChatMessage, HttpGenerator};
use offmap::config::ConfigFile;

use super::open_maps;
use crate::error::CliError;

pub async fn run(config: &ConfigFile, area_id: &str, question: Option<&str>) -> Result<(), CliError> {
    let maps = open_maps(config)?;
    let area = maps.area(area_id)?;

    let generator = HttpGenerator::new(config.assistant.endpoint.clone()).map_err(AppError::from)?;
    let assistant = Assistant::new(generator, config.assistant.clone());

    if let Some(question) = question {
        let reply = maps.ask(&assistant, area_id, &[], question).await?;
        println!("{}", reply);
        return Ok(());
    }

    let mut history = vec![greeting(area)];
    println!("{}", style(&history[0].content).cyan());
    println!("{}", style("Empty line or 'exit' to quit.").dim());

    loop {
        let question: String = Input::new()
            .with_prompt("You")
            .allow_empty(true)
            .interact_text()?;
        let question = question.trim();
        if question.is_empty() || question.eq_ignore_ascii_case("exit") {
            break;
        }

        match maps.ask(&assistant, area_id, &history, question).await {
            Ok(reply) => {
                println!("{}", style(&reply).cyan());
                history.push(ChatMessage::user(question));
                history.push(ChatMessage::assistant(reply));
            }
            // Keep the session open; the service may come back.
            Err(e @ AppError::Assistant(_)) => {
                eprintln!("{}", style(e).red());
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
