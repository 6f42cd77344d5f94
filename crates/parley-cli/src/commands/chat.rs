use std::io::{self, Write};

use anyhow::Result;
use cliclack::spinner;
use console::style;
use parley::client::service::ChatClient;
use parley::client::session::ChatSession;

use crate::prompt::{print_help, Input, Prompt};

pub async fn execute(server: &str, provider: String, use_context: bool, streaming: bool) -> Result<()> {
    let client = ChatClient::new(server)?;

    cliclack::intro(style(" parley ").on_cyan().black())?;
    warn_if_unavailable(&client, &provider).await?;

    let mut session = ChatSession::new(client, provider);
    session.set_use_context(use_context);
    session.set_streaming(streaming);

    println!(
        "Talking to {} {}",
        style(session.provider()).cyan(),
        style("- type /help for commands").dim()
    );

    let mut prompt = Prompt::new()?;
    loop {
        match prompt.read()? {
            Input::Message(text) => ask(&mut session, &text).await,
            Input::Provider(id) => {
                session.set_provider(id);
                warn_if_unavailable(session.client(), session.provider()).await?;
                println!("{}", style(format!("Now talking to {}", session.provider())).dim());
            }
            Input::ToggleContext => {
                session.set_use_context(!session.use_context());
                let state = if session.use_context() { "on" } else { "off" };
                println!("{}", style(format!("Platform context {}", state)).dim());
            }
            Input::Clear => {
                session.clear();
                println!("{}", style("Conversation cleared").dim());
            }
            Input::Help => print_help(),
            Input::AskAgain => continue,
            Input::Exit => break,
        }
    }

    cliclack::outro("Bye")?;
    Ok(())
}

// Prints fragments as they arrive. Partial text stays on screen when the reply fails.
async fn ask(session: &mut ChatSession, text: &str) {
    let spin = spinner();
    spin.start("awaiting reply");
    let mut waiting = true;

    let result = session
        .send(text, |fragment| {
            if waiting {
                spin.stop("");
                waiting = false;
            }
            print!("{}", fragment);
            let _ = io::stdout().flush();
        })
        .await;

    if waiting {
        spin.stop("");
    }
    match result {
        Ok(_) => println!("\n"),
        Err(err) => {
            println!();
            println!("{}\n", style(format!("Error: {}", err)).red());
        }
    }
}

async fn warn_if_unavailable(client: &ChatClient, provider: &str) -> Result<()> {
    match client.providers().await {
        Ok(listing) => match listing.providers.iter().find(|p| p.id == provider) {
            Some(descriptor) if !descriptor.enabled => {
                cliclack::log::warning(format!("{} is not configured on the server", descriptor.name))?
            }
            Some(_) => {}
            None => cliclack::log::warning(format!("The server does not know provider {}", provider))?,
        },
        Err(err) => {
            tracing::debug!(error = %err, "provider listing failed");
            cliclack::log::warning(format!("Could not reach {}: {}", client.base_url(), err))?
        }
    }
    Ok(())
}
