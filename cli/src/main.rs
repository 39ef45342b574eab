//! FRPC Panel - interactive console control surface
//!
//! Menu loop over the core operations: import a configuration, start and
//! stop the supervised client, and inspect recent client output. Every
//! failure is reported as a message and the loop continues.

use frpc_panel_core::{
    BoundedBuffer, ConfigStore, ConsoleSink, Fanout, LogSink, ProcessSupervisor, Result,
    PRIMARY_ARTIFACT,
};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

fn main() {
    env_logger::init();

    let store = match ConfigStore::open(ConfigStore::default_root()) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("Initialization failed: {}", e);
            return;
        }
    };

    let recent = Arc::new(BoundedBuffer::default());
    let sink: Arc<dyn LogSink> = Arc::new(Fanout::new(vec![
        Arc::new(ConsoleSink) as Arc<dyn LogSink>,
        recent.clone(),
    ]));
    let supervisor = ProcessSupervisor::from_store(store.clone(), sink);

    let stdin = io::stdin();
    let mut input = stdin.lock();

    loop {
        println!();
        println!("=== frpc control panel ===");
        println!("1. Import configuration file");
        println!("2. Start client");
        println!("3. Stop client");
        println!("4. List stored configurations");
        println!("5. Show recent client output");
        println!("6. Quit");
        print!("Select an operation: ");
        let _ = io::stdout().flush();

        let choice = match read_line(&mut input) {
            Some(line) => line,
            None => break,
        };

        match choice.as_str() {
            "1" => {
                print!("Configuration file path: ");
                let _ = io::stdout().flush();
                let Some(path) = read_line(&mut input) else { break };
                report(import_config(&store, &path), "Configuration imported");
            }
            "2" => match supervisor.start(PRIMARY_ARTIFACT) {
                Ok(pid) => println!("Client started (pid {})", pid),
                Err(e) => println!("Start failed: {}", e),
            },
            "3" => report(supervisor.stop(), "Client stopped"),
            "4" => {
                let names = store.list();
                if names.is_empty() {
                    println!("No stored configurations");
                } else {
                    for name in names {
                        println!("  {}", name);
                    }
                }
            }
            "5" => {
                let tail = recent.tail();
                if tail.is_empty() {
                    println!("No client output yet");
                } else {
                    for line in tail {
                        println!("  {}", line);
                    }
                }
            }
            "6" => {
                if supervisor.is_running() {
                    report(supervisor.stop(), "Client stopped");
                }
                println!("Bye");
                break;
            }
            other => println!("Invalid option: {}", other),
        }
    }
}

fn read_line(input: &mut impl BufRead) -> Option<String> {
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => Some(line.trim().to_string()),
        Err(_) => None,
    }
}

fn import_config(store: &ConfigStore, path: &str) -> Result<()> {
    store.adopt_file(Path::new(path))?;
    Ok(())
}

fn report<T>(result: Result<T>, success: &str) {
    match result {
        Ok(_) => println!("{}", success),
        Err(e) => println!("Operation failed: {}", e),
    }
}
