use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use toolrelay_core::tools::ProviderTools;
use toolrelay_core::{EngineError, Relay, RelayError};

const PROMPT: &str = "toolrelay> ";

/// What a line of input asks for
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Quit,
    Reset,
    Tools,
    Empty,
    Query(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    match line.to_lowercase().as_str() {
        "quit" | "exit" => Input::Quit,
        "/reset" => Input::Reset,
        "/tools" => Input::Tools,
        "" => Input::Empty,
        _ => Input::Query(line),
    }
}

fn print_tools(tools: &[ProviderTools]) {
    for provider in tools {
        if provider.tool_names.is_empty() {
            println!("  {}: (no tools available)", provider.provider_id);
        } else {
            println!("  {}: {}", provider.provider_id, provider.tool_names.join(", "));
        }
    }
}

/// Interactive loop until `quit`, `exit` or end of input
pub async fn run(relay: &Relay) -> Result<()> {
    let mut engine = relay.engine();
    let mut editor = DefaultEditor::new()?;

    println!("\nConnected tool servers:");
    print_tools(&engine.list_connected_tools().await);
    println!("\nType your question, /tools to list tools, /reset to start over, quit to exit.\n");

    loop {
        let line = match editor.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("Use 'quit' to exit");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };

        let _ = editor.add_history_entry(line.as_str());

        match parse_input(&line) {
            Input::Quit => break,
            Input::Empty => continue,
            Input::Reset => {
                engine.reset();
                println!("Conversation cleared.\n");
            }
            Input::Tools => print_tools(&engine.list_connected_tools().await),
            Input::Query(query) => match engine.submit_query(query).await {
                Ok(answer) => println!("\n{answer}\n"),
                Err(EngineError::EmptyQuery) => continue,
                Err(e) => println!("\n{}\n", RelayError::from(e).user_message()),
            },
        }
    }

    Ok(())
}
