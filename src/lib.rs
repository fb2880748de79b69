pub mod cli;
pub mod config;
pub mod conversation;
pub mod interpreter;
pub mod llm;
pub mod models;
pub mod session;

use cli::Args;
use config::prompt::{ self, PromptConfig };
use llm::chat::new_client;
use llm::LlmConfig;
use log::info;
use models::chat::Message;
use session::{ ChatSession, SessionConfig };
use std::error::Error;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{ AsyncBufReadExt, BufReader };

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Chat Base URL: {}", args.chat_base_url);
    info!("Chat Model: {}", args.chat_model);
    info!("Request Timeout: {}s", args.request_timeout_secs);
    info!("Prompts Path: {}", args.prompts_path.as_deref().unwrap_or("built-in defaults"));
    info!("Typing Delay: {}ms", args.typing_delay_ms);
    info!("History Commit Delay: {}ms", args.history_commit_delay_ms);
    info!("-------------------------");

    let llm_config = LlmConfig {
        api_key: args.chat_api_key.clone(),
        completion_model: args.chat_model.clone(),
        base_url: args.chat_base_url.clone(),
        request_timeout: Duration::from_secs(args.request_timeout_secs),
    };
    let client = new_client(&llm_config)?;

    let prompts = match &args.prompts_path {
        Some(path) => prompt::load_prompts(path)?,
        None => Arc::new(PromptConfig::default()),
    };

    let session_config = SessionConfig {
        typing_delay: Duration::from_millis(args.typing_delay_ms),
        history_commit_delay: Duration::from_millis(args.history_commit_delay_ms),
    };
    let session = ChatSession::new(client, Arc::clone(&prompts), session_config);

    repl(&session, &prompts).await
}

async fn repl(
    session: &ChatSession,
    prompts: &PromptConfig
) -> Result<(), Box<dyn Error + Send + Sync>> {
    println!("How can I help you today?");
    print_topics(prompts);
    println!("Commands: :new :history :open <n> :delete <n> :topics :quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            ":quit" | ":q" => {
                break;
            }
            ":new" => {
                session.new_chat().await;
                println!("Started a new chat.");
            }
            ":topics" => print_topics(prompts),
            ":history" => print_history(session).await,
            _ if input.starts_with(":open ") => {
                match history_entry(session, &input[":open ".len()..]).await {
                    Some(text) => ask(session, &text).await,
                    None => println!("No such history entry."),
                }
            }
            _ if input.starts_with(":delete ") => {
                match history_entry(session, &input[":delete ".len()..]).await {
                    Some(text) => {
                        if session.delete_history(&text).await {
                            println!("Deleted '{}' and started a new chat.", text);
                        } else {
                            println!("Deleted '{}'.", text);
                        }
                    }
                    None => println!("No such history entry."),
                }
            }
            query => ask(session, query).await,
        }
    }
    Ok(())
}

async fn ask(session: &ChatSession, query: &str) {
    if let Some(Message::Bot { html, .. }) = session.submit_query(query).await {
        println!("{}", html);
    }
    session.wait_for_suggestions().await;

    let state = session.state();
    let state = state.lock().await;
    let suggestions = state.suggestions();
    if !suggestions.is_empty() {
        println!("Follow-ups:");
        for (i, suggestion) in suggestions.iter().enumerate() {
            println!("  {}. {}", i + 1, suggestion);
        }
    }
}

async fn print_history(session: &ChatSession) {
    let state = session.state();
    let state = state.lock().await;
    let history = state.history();
    if history.entries().is_empty() {
        println!("History is empty.");
        return;
    }
    for (i, entry) in history.entries().iter().enumerate() {
        let marker = if history.active() == Some(entry.as_str()) { "*" } else { " " };
        println!("{} {}. {}", marker, i + 1, entry);
    }
}

async fn history_entry(session: &ChatSession, index: &str) -> Option<String> {
    let n: usize = index.trim().parse().ok()?;
    let state = session.state();
    let state = state.lock().await;
    state
        .history()
        .entries()
        .get(n.checked_sub(1)?)
        .cloned()
}

fn print_topics(prompts: &PromptConfig) {
    if prompts.starter_prompts.is_empty() {
        return;
    }
    println!("Start with a topic:");
    for card in &prompts.starter_prompts {
        println!("  {} - {}", card.title, card.description);
    }
}
