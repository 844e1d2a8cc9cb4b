//! Interactive REPL: read stdin, send through the active transport, print
//! appended messages, run code blocks on request.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use charla::{ChatTransport, ExecBridge, ExecDispatch, ExecEvent, ExecRequest, Sender};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::code_blocks::{extract_code_blocks, CodeBlock};

/// Polling interval while waiting for a reply or the first connect.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long a one-shot send waits for the streaming transport to connect.
const CONNECT_WAIT: Duration = Duration::from_secs(10);

/// Runs the REPL loop: prompt, read line, send, print, repeat.
///
/// Exits on EOF (Ctrl+D) or `quit`/`exit`/`/quit`. `/clear` empties the
/// history, `/run N` executes code block N of the latest reply.
pub async fn run_repl(
    transport: Arc<dyn ChatTransport>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    println!("charla: type a message; /run N to execute code block N; /clear; /quit");
    if !transport.connected() {
        println!("(connecting...)");
        wait_for_connection(transport.as_ref()).await;
    }

    let bridge = ExecBridge::new(Arc::clone(&transport));
    let mut reader = BufReader::new(tokio::io::stdin()).lines();
    let mut printed = 0;
    let mut last_blocks: Vec<CodeBlock> = Vec::new();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = reader.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        if is_quit_command(&line) {
            break;
        }
        if line == "/clear" {
            transport.clear_history();
            printed = 0;
            last_blocks.clear();
            continue;
        }
        if let Some(arg) = line.strip_prefix("/run") {
            run_block(&bridge, &last_blocks, arg.trim()).await;
            wait_for_reply(transport.as_ref()).await;
            printed = print_appended(transport.as_ref(), printed, &mut last_blocks);
            continue;
        }

        transport.send_message(&line).await;
        if !transport.connected() && !transport.loading() {
            eprintln!("not connected; message dropped");
            continue;
        }
        wait_for_reply(transport.as_ref()).await;
        printed = print_appended(transport.as_ref(), printed, &mut last_blocks);
    }

    println!("Bye.");
    Ok(())
}

/// Sends one message, waits for the reply, prints the latest agent text.
pub async fn run_one_shot(
    transport: Arc<dyn ChatTransport>,
    message: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    wait_for_connection(transport.as_ref()).await;
    transport.send_message(message).await;
    wait_for_reply(transport.as_ref()).await;

    let reply = transport
        .messages()
        .into_iter()
        .filter(|m| m.sender == Sender::Agent)
        .last();
    match reply {
        Some(message) => println!("{}", message.text),
        None => eprintln!("no reply received"),
    }
    Ok(())
}

fn is_quit_command(line: &str) -> bool {
    matches!(line, "quit" | "exit" | "/quit")
}

async fn wait_for_connection(transport: &dyn ChatTransport) {
    let deadline = tokio::time::Instant::now() + CONNECT_WAIT;
    while !transport.connected() && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

async fn wait_for_reply(transport: &dyn ChatTransport) {
    while transport.loading() {
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Prints messages appended since the last turn; returns the new count.
/// Remembers the code blocks of the latest agent reply for `/run`.
fn print_appended(
    transport: &dyn ChatTransport,
    printed: usize,
    last_blocks: &mut Vec<CodeBlock>,
) -> usize {
    let messages = transport.messages();
    for message in messages.iter().skip(printed) {
        match message.sender {
            Sender::User => println!("you: {}", message.text),
            Sender::Agent => {
                println!("ai: {}", message.text);
                let blocks = extract_code_blocks(&message.text);
                if !blocks.is_empty() {
                    for (index, block) in blocks.iter().enumerate() {
                        let tag = if block.language.is_empty() {
                            "text"
                        } else {
                            &block.language
                        };
                        println!("   [code block {}: {}]", index + 1, tag);
                    }
                    *last_blocks = blocks;
                }
            }
        }
    }
    messages.len()
}

/// Runs one extracted code block through the bridge. Local executions stream
/// their events here; remote ones come back as a regular reply.
async fn run_block(bridge: &ExecBridge, blocks: &[CodeBlock], arg: &str) {
    let index = arg.parse::<usize>().ok().and_then(|n| n.checked_sub(1));
    let Some(block) = index.and_then(|i| blocks.get(i)) else {
        eprintln!("no such code block (have {})", blocks.len());
        return;
    };
    let request = ExecRequest {
        language: if block.language.is_empty() {
            "javascript".to_string()
        } else {
            block.language.clone()
        },
        code: block.code.clone(),
    };
    match bridge.run(request).await {
        ExecDispatch::Local(mut worker) => {
            while let Some(event) = worker.recv().await {
                match event {
                    ExecEvent::Log(line) => println!("{line}"),
                    ExecEvent::Result(value) => println!("Result: {value}"),
                    ExecEvent::Error(error) => println!("Error: {error}"),
                    ExecEvent::Done => break,
                }
            }
        }
        ExecDispatch::Remote => println!("(sent to the server for execution)"),
    }
}
