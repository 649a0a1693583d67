use std::sync::Arc;

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

use agent_console::services::config_service;
use agent_console::{ApiClient, FileTokenStore, Role, SessionController, SessionMessage};

#[tokio::main]
async fn main() -> Result<(), String> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let base_url = config_service::resolve_base_url();
    let store = Arc::new(FileTokenStore::new()?);
    let mut session = SessionController::new(ApiClient::new(&base_url), store);

    println!("{}", "Agent Console".bold());
    println!("API: {}", base_url.dimmed());
    println!();

    session.resume().await;

    let mut editor = DefaultEditor::new().map_err(|e| e.to_string())?;

    loop {
        if !session.is_authenticated() {
            match auth_prompt(&mut editor, &mut session).await {
                Ok(true) => {
                    println!("{}", "Signed in.".green());
                    print_conversations(&session);
                }
                Ok(false) => continue,
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err.to_string()),
            }
            continue;
        }

        let line = match editor.readline(&prompt(&session)) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.to_string()),
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(&line);

        match line.split_whitespace().collect::<Vec<_>>().as_slice() {
            ["/quit"] | ["/exit"] => break,
            ["/help"] => print_help(),
            ["/list"] => {
                session.refresh_conversations().await;
                print_conversations(&session);
            }
            ["/open", id] => match id.parse::<i64>() {
                Ok(id) => {
                    if session.open_conversation(id).await.is_ok() {
                        print_messages(&session);
                    } else {
                        print_error(&session);
                    }
                }
                Err(_) => println!("{}", "Usage: /open <id>".yellow()),
            },
            ["/new"] => {
                session.start_new_chat();
                println!("Started a new chat.");
            }
            ["/logout"] => {
                session.logout()?;
                println!("Logged out.");
            }
            parts if parts.first().is_some_and(|part| part.starts_with('/')) => {
                println!("{}", format!("Unknown command: {}", parts[0]).yellow());
            }
            _ => {
                session.set_draft(&line);
                if session.send_message().await.is_ok() {
                    if let Some(reply) = session.messages().last() {
                        print_message(reply);
                    }
                } else {
                    print_error(&session);
                }
            }
        }
    }

    Ok(())
}

/// One round of the login screen. Returns whether it ended authenticated.
async fn auth_prompt(
    editor: &mut DefaultEditor,
    session: &mut SessionController,
) -> Result<bool, ReadlineError> {
    println!("Sign in to access your private chat history.");
    let choice = editor.readline("login or register? ")?;
    let register = match choice.trim() {
        "register" | "r" => true,
        "login" | "l" | "" => false,
        other => {
            println!("{}", format!("Unknown choice: {}", other).yellow());
            return Ok(false);
        }
    };

    let username = editor.readline("username: ")?;
    let password = editor.readline("password: ")?;

    let outcome = if register {
        session.register(&username, &password).await
    } else {
        session.login(&username, &password).await
    };

    if outcome.is_err() {
        print_error(session);
    }
    Ok(session.is_authenticated())
}

fn prompt(session: &SessionController) -> String {
    match (session.conversation_title(), session.conversation_id()) {
        (Some(title), _) => format!("[{}]> ", title),
        (None, Some(id)) => format!("[#{}]> ", id),
        (None, None) => "[new chat]> ".to_string(),
    }
}

fn print_help() {
    println!("Type a message and press Enter to send it.");
    println!("  /list         refresh and show saved conversations");
    println!("  /open <id>    open a saved conversation");
    println!("  /new          start a fresh chat");
    println!("  /logout       sign out");
    println!("  /quit         leave");
}

fn print_conversations(session: &SessionController) {
    if session.conversations().is_empty() {
        println!("{}", "No saved conversations yet.".dimmed());
        return;
    }
    for conversation in session.conversations() {
        let created = conversation
            .created_at
            .map(|at| at.format("  %Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "  {:>4}  {}{}",
            format!("#{}", conversation.id).bold(),
            conversation.display_title(),
            created.dimmed()
        );
    }
}

fn print_messages(session: &SessionController) {
    for held in session.messages() {
        print_message(held);
    }
}

fn print_message(held: &SessionMessage) {
    let label = match held.message.role {
        Role::User => "you".cyan().bold(),
        Role::Assistant => "assistant".green().bold(),
        Role::System => "system".dimmed(),
    };
    let mark = if held.unsent {
        " (unsent)".yellow().to_string()
    } else {
        String::new()
    };
    println!("{}{}: {}", label, mark, held.message.content);
}

fn print_error(session: &SessionController) {
    if let Some(error) = session.last_error() {
        println!("{}", error.red());
    }
}
