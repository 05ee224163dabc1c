// Interactive CLI chat against a running relay. The browser UI follows the
// same session machine; this is the terminal rendition of it.

use anyhow::{anyhow, Result};
use reqwest::Client;
use std::io::{self, Write};
use tracing::{info, warn};

use crate::relay::{ChatReply, ChatRequest, Turn};
use crate::session::{ChatSession, SessionError};

pub async fn run_chat(base_url: &str) -> Result<()> {
    let client = Client::new();
    let endpoint = format!("{}/api/chat", base_url.trim_end_matches('/'));
    info!("Starting questionnaire chat against {}", endpoint);

    let mut session = ChatSession::new();

    println!("Garden design questionnaire. Answer in your own words; Ctrl-C quits.");
    let opening = session.start()?;
    exchange(&client, &endpoint, &mut session, opening).await?;

    while !session.is_complete() {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            println!();
            info!("Input closed, leaving the questionnaire");
            return Ok(());
        }

        let turns = match session.submit(&input) {
            Ok(turns) => turns,
            Err(SessionError::EmptyInput) => continue,
            Err(e) => return Err(e.into()),
        };
        exchange(&client, &endpoint, &mut session, turns).await?;
    }

    println!("Questionnaire complete.");
    Ok(())
}

/// Send the conversation to the relay, fold the outcome into the session,
/// and print whatever turn that appended (a reply or an apology).
async fn exchange(
    client: &Client,
    endpoint: &str,
    session: &mut ChatSession,
    turns: Vec<Turn>,
) -> Result<()> {
    match call_relay(client, endpoint, turns).await {
        Ok(reply) => session.reply_received(&reply)?,
        Err(e) => {
            warn!("Relay call failed: {:?}", e);
            session.reply_failed()?;
        }
    }

    if let Some(turn) = session.turns().last() {
        println!();
        println!("{}", turn.content);
        println!();
    }
    Ok(())
}

async fn call_relay(client: &Client, endpoint: &str, turns: Vec<Turn>) -> Result<ChatReply> {
    let response = client
        .post(endpoint)
        .json(&ChatRequest { messages: turns })
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(anyhow!("Relay returned status {}", response.status()));
    }

    Ok(response.json::<ChatReply>().await?)
}
