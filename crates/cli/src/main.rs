// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! cog - client for the cog debugging daemon.
//!
//! Thin mapping from subcommands onto daemon tools; anything not covered
//! by a dedicated subcommand goes through `cog call <tool> --args JSON`.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod daemon_process;
mod env;
mod output;

use clap::{Parser, Subcommand};
use serde_json::json;

use client::{ClientError, DaemonClient};

#[derive(Parser)]
#[command(name = "cog", version, about = "client for the cog debugging daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Launch a program under the debugger
    Launch {
        program: String,
        /// Arguments passed to the debuggee
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
        /// Target language (picks the debug adapter; omit for native)
        #[arg(long)]
        language: Option<String>,
        /// Working directory for the debuggee
        #[arg(long)]
        cwd: Option<String>,
        /// Explicit adapter command override
        #[arg(long)]
        adapter: Option<String>,
        /// Start running instead of holding at entry
        #[arg(long)]
        no_stop_on_entry: bool,
        /// Client pid for orphan reaping (long-lived callers only)
        #[arg(long)]
        owner_pid: Option<u32>,
    },

    /// Attach to a running process
    Attach {
        pid: u32,
        #[arg(long)]
        language: Option<String>,
    },

    /// List live sessions
    Sessions,

    /// Stop a session and kill its debuggee
    Stop { session_id: String },

    /// Resume or step a session
    Run {
        session_id: String,
        /// continue | step_over | step_in | step_out | step_back | pause |
        /// restart | goto
        action: String,
        #[arg(long)]
        thread: Option<i64>,
        /// Target file for goto
        #[arg(long)]
        file: Option<String>,
        /// Target line for goto
        #[arg(long)]
        line: Option<u32>,
    },

    /// Drain pending events for a session (or all sessions)
    Poll { session_id: Option<String> },

    /// Breakpoint management
    #[command(subcommand)]
    #[command(name = "break")]
    Break(BreakCommand),

    /// Evaluate an expression in a stopped session
    Inspect {
        session_id: String,
        expression: String,
    },

    /// Invoke any daemon tool directly
    Call {
        tool: String,
        /// Tool arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },

    /// Daemon management
    #[command(subcommand)]
    Daemon(DaemonCommand),
}

#[derive(Subcommand)]
enum BreakCommand {
    /// Set a line breakpoint
    Set {
        session_id: String,
        file: String,
        line: u32,
        #[arg(long)]
        condition: Option<String>,
        /// Turn the breakpoint into a log point
        #[arg(long)]
        log_message: Option<String>,
    },
    /// Remove a breakpoint by id
    Remove { session_id: String, id: i64 },
    /// List breakpoints
    List { session_id: String },
}

#[derive(Subcommand)]
enum DaemonCommand {
    /// Start the daemon if it is not running
    Start,
    /// Ask the daemon to exit
    Stop,
    /// Show whether the daemon is running
    Status,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = execute(cli.command) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn execute(command: Command) -> Result<(), ClientError> {
    match command {
        Command::Launch {
            program,
            args,
            language,
            cwd,
            adapter,
            no_stop_on_entry,
            owner_pid,
        } => {
            let mut call_args = json!({
                "program": program,
                "args": args,
                "stop_on_entry": !no_stop_on_entry,
            });
            if let Some(language) = language {
                call_args["language"] = json!(language);
            }
            if let Some(cwd) = cwd {
                call_args["cwd"] = json!(cwd);
            }
            if let Some(adapter) = adapter {
                call_args["adapter"] = json!(adapter);
            }
            if let Some(pid) = owner_pid {
                call_args["client_pid"] = json!(pid);
            }
            invoke("launch", call_args)
        }

        Command::Attach { pid, language } => {
            let mut call_args = json!({ "pid": pid });
            if let Some(language) = language {
                call_args["language"] = json!(language);
            }
            invoke("attach", call_args)
        }

        Command::Sessions => {
            let client = DaemonClient::connect_only()?;
            let result = client.call("sessions", json!({}))?;
            let sessions = result["sessions"].as_array().cloned().unwrap_or_default();
            if sessions.is_empty() {
                println!("no sessions");
            } else {
                for session in &sessions {
                    println!("{}", output::session_row(session));
                }
            }
            Ok(())
        }

        Command::Stop { session_id } => invoke("stop", json!({ "session_id": session_id })),

        Command::Run {
            session_id,
            action,
            thread,
            file,
            line,
        } => {
            let mut call_args = json!({ "session_id": session_id, "action": action });
            if let Some(thread) = thread {
                call_args["thread_id"] = json!(thread);
            }
            if let Some(file) = file {
                call_args["file"] = json!(file);
            }
            if let Some(line) = line {
                call_args["line"] = json!(line);
            }
            invoke("run", call_args)
        }

        Command::Poll { session_id } => {
            let mut call_args = json!({});
            if let Some(session_id) = session_id {
                call_args["session_id"] = json!(session_id);
            }
            invoke("poll_events", call_args)
        }

        Command::Break(command) => match command {
            BreakCommand::Set {
                session_id,
                file,
                line,
                condition,
                log_message,
            } => {
                let mut call_args = json!({
                    "session_id": session_id,
                    "action": "set",
                    "file": file,
                    "line": line,
                });
                if let Some(condition) = condition {
                    call_args["condition"] = json!(condition);
                }
                if let Some(log_message) = log_message {
                    call_args["log_message"] = json!(log_message);
                }
                invoke("breakpoint", call_args)
            }
            BreakCommand::Remove { session_id, id } => invoke(
                "breakpoint",
                json!({ "session_id": session_id, "action": "remove", "id": id }),
            ),
            BreakCommand::List { session_id } => invoke(
                "breakpoint",
                json!({ "session_id": session_id, "action": "list" }),
            ),
        },

        Command::Inspect {
            session_id,
            expression,
        } => invoke(
            "inspect",
            json!({ "session_id": session_id, "expression": expression }),
        ),

        Command::Call { tool, args } => {
            let parsed: serde_json::Value = serde_json::from_str(&args)
                .map_err(|e| ClientError::BadResponse(format!("--args is not JSON: {e}")))?;
            invoke(&tool, parsed)
        }

        Command::Daemon(command) => daemon_command(command),
    }
}

fn invoke(tool: &str, args: serde_json::Value) -> Result<(), ClientError> {
    let client = DaemonClient::connect_or_start()?;
    let result = client.call(tool, args)?;
    println!("{}", output::render(&result));
    Ok(())
}

fn daemon_command(command: DaemonCommand) -> Result<(), ClientError> {
    match command {
        DaemonCommand::Start => {
            let _client = DaemonClient::connect_or_start()?;
            println!("daemon running");
            Ok(())
        }
        DaemonCommand::Stop => {
            let client = DaemonClient::connect_only()?;
            match daemon_process::read_daemon_pid(client.config()) {
                Some(pid) => {
                    if daemon_process::signal_daemon_stop(pid) {
                        println!("daemon stopping (pid {pid})");
                    } else {
                        eprintln!("could not signal pid {pid}");
                    }
                    Ok(())
                }
                None => Err(ClientError::DaemonNotRunning),
            }
        }
        DaemonCommand::Status => {
            match DaemonClient::connect_only() {
                Ok(client) => {
                    let pid = daemon_process::read_daemon_pid(client.config());
                    match pid {
                        Some(pid) => println!("daemon running (pid {pid})"),
                        None => println!("daemon running"),
                    }
                }
                Err(_) => println!("daemon not running"),
            }
            Ok(())
        }
    }
}
