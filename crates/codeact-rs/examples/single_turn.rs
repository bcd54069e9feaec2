//! Minimal turn loop: run the agent until it finishes or asks for input.
//!
//! There is no sandbox here, so every command gets a canned observation.
//! Swap `fake_observation` for a real executor to drive an actual task.
//!
//! # Usage
//!
//! ```bash
//! OPENROUTER_KEY=sk-... cargo run --example single_turn
//! ```

use codeact_rs::prelude::*;

fn fake_observation(action: &Action) -> Option<Observation> {
    match action {
        Action::RunCommand { command, .. } => Some(Observation::CommandOutput {
            content: format!("(not executed) {command}"),
            command_id: 1,
            exit_code: 0,
        }),
        Action::RunIpython { .. } => Some(Observation::IpythonOutput {
            content: "(not executed)".into(),
        }),
        Action::BrowseInteractive { .. } => Some(Observation::BrowserOutput {
            content: "(not executed)".into(),
        }),
        Action::Message { .. } | Action::Summarize { .. } | Action::Finish { .. } => None,
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    // 1. Create the OpenRouter client.
    let api_key = std::env::var("OPENROUTER_KEY")
        .map_err(|_| "Set OPENROUTER_KEY env var to your OpenRouter API key")?;
    let client = OpenRouterClient::new(api_key)?;

    // 2. Configure the agent and the condenser used on overflow.
    let config = AgentConfig::default().with_max_input_tokens(100_000);
    let condenser = LlmCondenser::new(&client, config.model.clone());
    let agent = CodeActAgent::new(&client, config)
        .with_condenser(&condenser)
        .with_event_handler(&LoggingHandler);

    // 3. Seed the task.
    let mut state = TaskState::new(5);
    state.history.push(Event::action(
        Source::User,
        Action::message("Print the current working directory.", false),
    ));

    // 4. Turn loop: the caller owns the iteration counter.
    while state.iteration < state.max_iterations {
        let action = agent.step(&mut state).await.map_err(|e| e.to_string())?;
        println!("{action:?}");
        state.iteration += 1;

        let observation = fake_observation(&action);
        state.history.push(Event::action(Source::Agent, action));
        match observation {
            Some(obs) => {
                state.history.push(Event::observation(obs));
            }
            None => break,
        }
    }

    println!("\n--- {} turns | {} chars ---", state.iteration, state.num_of_chars);
    Ok(())
}
