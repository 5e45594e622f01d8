//! Interactive REPL client for a toolwire MCP server.
//!
//! Launch with `toolwire-mcp repl` to connect and enter interactive mode.
//! Type `/help` for available commands, Tab for completion.

use rustyline::completion::{Completer, Pair};
use rustyline::config::CompletionType;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{
    Cmd, ConditionalEventHandler, Config, Editor, Event, EventContext, EventHandler, Helper,
    KeyEvent, RepeatCount,
};
use serde_json::Value;
use tokio::runtime::Handle;

use toolwire::{Client, ClientConfig};

/// Available REPL commands.
const COMMANDS: &[(&str, &str)] = &[
    ("/tools", "List the server's tools"),
    ("/call", "Call a tool: /call <name> [json arguments]"),
    ("/resources", "List the server's resources"),
    ("/read", "Read a resource: /read <uri>"),
    ("/prompts", "List the server's prompts"),
    ("/prompt", "Expand a prompt: /prompt <name> [json arguments]"),
    ("/ping", "Round-trip a ping"),
    ("/info", "Show the negotiated server info"),
    ("/clear", "Clear the screen"),
    ("/help", "Show available commands"),
    ("/exit", "Quit the REPL"),
];

/// A parsed REPL line.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Tools,
    Call { name: String, arguments: Value },
    Resources,
    Read { uri: String },
    Prompts,
    Prompt { name: String, arguments: Value },
    Ping,
    Info,
    Clear,
    Help,
    Exit,
}

/// Parse one input line. The leading `/` is optional.
pub fn parse_command(line: &str) -> Result<ReplCommand, String> {
    let input = line.trim();
    let input = input.strip_prefix('/').unwrap_or(input);
    if input.is_empty() {
        return Ok(ReplCommand::Help);
    }

    let mut parts = input.splitn(2, ' ');
    let cmd = parts.next().unwrap_or("");
    let args = parts.next().unwrap_or("").trim();

    match cmd {
        "exit" | "quit" => Ok(ReplCommand::Exit),
        "help" | "h" | "?" => Ok(ReplCommand::Help),
        "clear" | "cls" => Ok(ReplCommand::Clear),
        "info" => Ok(ReplCommand::Info),
        "tools" => Ok(ReplCommand::Tools),
        "resources" => Ok(ReplCommand::Resources),
        "prompts" => Ok(ReplCommand::Prompts),
        "ping" => Ok(ReplCommand::Ping),
        "read" => match args.split_whitespace().next() {
            Some(uri) => Ok(ReplCommand::Read {
                uri: uri.to_string(),
            }),
            None => Err("Usage: /read <uri>".to_string()),
        },
        "call" => {
            let (name, arguments) = name_and_arguments(args, "/call <name> [json]")?;
            Ok(ReplCommand::Call { name, arguments })
        }
        "prompt" => {
            let (name, arguments) = name_and_arguments(args, "/prompt <name> [json]")?;
            Ok(ReplCommand::Prompt { name, arguments })
        }
        _ => Err(format!("Unknown command '/{cmd}'. Type /help for commands.")),
    }
}

fn name_and_arguments(args: &str, usage: &str) -> Result<(String, Value), String> {
    let mut parts = args.splitn(2, ' ');
    let name = match parts.next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return Err(format!("Usage: {usage}")),
    };
    let raw = parts.next().unwrap_or("").trim();
    let arguments = if raw.is_empty() {
        Value::Object(Default::default())
    } else {
        serde_json::from_str(raw).map_err(|e| format!("Arguments are not valid JSON: {e}"))?
    };
    Ok((name, arguments))
}

/// REPL helper for tab completion. Knows the server's capability names.
#[derive(Default)]
struct ClientHelper {
    tools: Vec<String>,
    resources: Vec<String>,
    prompts: Vec<String>,
}

impl ClientHelper {
    fn names_for(&self, cmd: &str) -> &[String] {
        match cmd {
            "/call" => &self.tools,
            "/read" => &self.resources,
            "/prompt" => &self.prompts,
            _ => &[],
        }
    }
}

impl Completer for ClientHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let input = &line[..pos];

        if !input.contains(' ') {
            let matches: Vec<Pair> = COMMANDS
                .iter()
                .filter(|(cmd, _)| cmd.starts_with(input))
                .map(|(cmd, desc)| Pair {
                    display: format!("{cmd:<16} {desc}"),
                    replacement: format!("{cmd} "),
                })
                .collect();
            return Ok((0, matches));
        }

        // capability name completion for the first argument only
        let mut parts = input.splitn(2, ' ');
        let cmd = parts.next().unwrap_or("");
        let args = parts.next().unwrap_or("");
        if args.contains(' ') {
            return Ok((pos, Vec::new()));
        }

        let prefix_start = input.len() - args.len();
        let matches: Vec<Pair> = self
            .names_for(cmd)
            .iter()
            .filter(|name| name.starts_with(args))
            .map(|name| Pair {
                display: name.clone(),
                replacement: format!("{name} "),
            })
            .collect();
        Ok((prefix_start, matches))
    }
}

impl Hinter for ClientHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if pos < line.len() || line.is_empty() {
            return None;
        }
        if line.starts_with('/') && !line.contains(' ') {
            for (cmd, _) in COMMANDS {
                if cmd.starts_with(line) && *cmd != line {
                    return Some(cmd[line.len()..].to_string());
                }
            }
        }
        None
    }
}

impl Highlighter for ClientHelper {}
impl Validator for ClientHelper {}
impl Helper for ClientHelper {}

struct TabCompleteOrAcceptHint;

impl ConditionalEventHandler for TabCompleteOrAcceptHint {
    fn handle(
        &self,
        _evt: &Event,
        _n: RepeatCount,
        _positive: bool,
        ctx: &EventContext<'_>,
    ) -> Option<Cmd> {
        if ctx.has_hint() {
            Some(Cmd::CompleteHint)
        } else {
            Some(Cmd::Complete)
        }
    }
}

/// Run the interactive REPL against the server at `url`.
///
/// Blocks the calling thread on line editing; client calls are driven on
/// `runtime`. Call from a blocking context such as `spawn_blocking`.
pub fn run(runtime: Handle, url: &str, config: ClientConfig) -> anyhow::Result<()> {
    eprintln!();
    eprintln!(
        "  \x1b[32m\u{25c9}\x1b[0m \x1b[1mtoolwire-mcp v{}\x1b[0m \x1b[90m{url}\x1b[0m",
        env!("CARGO_PKG_VERSION")
    );

    let client = runtime.block_on(Client::connect_websocket(url, config))?;
    let helper = runtime.block_on(load_names(&client));

    eprintln!();
    eprintln!(
        "    Press \x1b[36m/\x1b[0m to browse commands, \x1b[90mTab\x1b[0m to complete, \x1b[90m/exit\x1b[0m to quit."
    );
    eprintln!();

    let editor_config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .completion_type(CompletionType::List)
        .completion_prompt_limit(20)
        .build();

    let mut rl: Editor<ClientHelper, rustyline::history::DefaultHistory> =
        Editor::with_config(editor_config)?;
    rl.set_helper(Some(helper));
    rl.bind_sequence(
        KeyEvent::from('\t'),
        EventHandler::Conditional(Box::new(TabCompleteOrAcceptHint)),
    );

    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    let hist_path = std::path::PathBuf::from(&home).join(".toolwire_mcp_history");
    if hist_path.exists() {
        let _ = rl.load_history(&hist_path);
    }

    let prompt = " \x1b[36mmcp>\x1b[0m ";

    loop {
        match rl.readline(prompt) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let command = match parse_command(&line) {
                    Ok(command) => command,
                    Err(message) => {
                        eprintln!("  {message}");
                        continue;
                    }
                };
                match command {
                    ReplCommand::Exit => {
                        eprintln!("  \x1b[90m\u{2728}\x1b[0m Goodbye!");
                        break;
                    }
                    ReplCommand::Help => cmd_help(),
                    ReplCommand::Clear => eprint!("\x1b[2J\x1b[H"),
                    command => {
                        if let Err(e) = runtime.block_on(execute(&client, command)) {
                            eprintln!("  Error: {e}");
                        }
                        if runtime.block_on(client.is_closed()) {
                            eprintln!("  Connection closed.");
                            break;
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                eprintln!("  \x1b[90m(Ctrl+C)\x1b[0m Type \x1b[1m/exit\x1b[0m to quit.");
            }
            Err(ReadlineError::Eof) => {
                eprintln!("  \x1b[90m\u{2728}\x1b[0m Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("  Error: {err}");
                break;
            }
        }
    }

    let _ = rl.save_history(&hist_path);
    runtime.block_on(client.close())?;

    Ok(())
}

async fn load_names(client: &Client) -> ClientHelper {
    let mut helper = ClientHelper::default();
    if let Ok(tools) = client.list_tools().await {
        helper.tools = tools.into_iter().map(|t| t.name).collect();
    }
    if let Ok(resources) = client.list_resources().await {
        helper.resources = resources.into_iter().map(|r| r.uri).collect();
    }
    if let Ok(prompts) = client.list_prompts().await {
        helper.prompts = prompts.into_iter().map(|p| p.name).collect();
    }
    helper
}

/// Run one server-facing command and print its outcome.
async fn execute(client: &Client, command: ReplCommand) -> anyhow::Result<()> {
    match command {
        ReplCommand::Tools => {
            let tools = client.list_tools().await?;
            eprintln!();
            eprintln!("  {} tools available:", tools.len());
            eprintln!();
            for tool in &tools {
                eprintln!(
                    "    {:<28} {}",
                    tool.name,
                    tool.description.as_deref().unwrap_or("")
                );
            }
            eprintln!();
        }
        ReplCommand::Resources => {
            let resources = client.list_resources().await?;
            eprintln!();
            eprintln!("  {} resources available:", resources.len());
            eprintln!();
            for resource in &resources {
                eprintln!("    {:<28} {}", resource.uri, resource.name);
            }
            eprintln!();
        }
        ReplCommand::Prompts => {
            let prompts = client.list_prompts().await?;
            eprintln!();
            eprintln!("  {} prompts available:", prompts.len());
            eprintln!();
            for prompt in &prompts {
                eprintln!(
                    "    {:<28} {}",
                    prompt.name,
                    prompt.description.as_deref().unwrap_or("")
                );
            }
            eprintln!();
        }
        ReplCommand::Call { name, arguments } => {
            let result = client.call_tool(&name, arguments).await?;
            print_json(&result)?;
        }
        ReplCommand::Read { uri } => {
            let result = client.read_resource(&uri).await?;
            print_json(&serde_json::to_value(result)?)?;
        }
        ReplCommand::Prompt { name, arguments } => {
            let result = client.get_prompt(&name, arguments).await?;
            print_json(&serde_json::to_value(result)?)?;
        }
        ReplCommand::Ping => {
            let started = std::time::Instant::now();
            client.ping().await?;
            eprintln!("  pong in {:.1} ms", started.elapsed().as_secs_f64() * 1000.0);
        }
        ReplCommand::Info => match client.server().await {
            Some(server) => {
                eprintln!();
                eprintln!(
                    "  Server:   {} v{}",
                    server.server_info.name, server.server_info.version
                );
                eprintln!("  Protocol: {}", server.protocol_version);
                let kinds: Vec<String> = server
                    .capabilities
                    .kinds()
                    .iter()
                    .map(|k| k.capability_key().to_string())
                    .collect();
                eprintln!("  Offers:   {}", kinds.join(", "));
                eprintln!();
            }
            None => eprintln!("  Not initialized."),
        },
        ReplCommand::Help | ReplCommand::Clear | ReplCommand::Exit => {}
    }
    Ok(())
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_help() {
    eprintln!();
    eprintln!("  Commands:");
    eprintln!();
    for (cmd, desc) in COMMANDS {
        eprintln!("    {cmd:<18} {desc}");
    }
    eprintln!();
    eprintln!("  Tip: Tab completes commands, tool names, resource URIs and prompt names.");
    eprintln!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_and_slashed_commands_parse() {
        assert_eq!(parse_command("/tools"), Ok(ReplCommand::Tools));
        assert_eq!(parse_command("ping"), Ok(ReplCommand::Ping));
        assert_eq!(parse_command("/"), Ok(ReplCommand::Help));
        assert_eq!(parse_command("  /quit "), Ok(ReplCommand::Exit));
    }

    #[test]
    fn call_takes_json_arguments() {
        let parsed = parse_command(r#"/call add_numbers {"a": 5, "b": 7}"#).unwrap();
        assert_eq!(
            parsed,
            ReplCommand::Call {
                name: "add_numbers".to_string(),
                arguments: json!({"a": 5, "b": 7}),
            }
        );
    }

    #[test]
    fn missing_arguments_default_to_empty_object() {
        let parsed = parse_command("/prompt summarize_resource").unwrap();
        assert_eq!(
            parsed,
            ReplCommand::Prompt {
                name: "summarize_resource".to_string(),
                arguments: json!({}),
            }
        );
    }

    #[test]
    fn bad_input_is_reported() {
        assert!(parse_command("/call").is_err());
        assert!(parse_command("/call add_numbers {not json").is_err());
        assert!(parse_command("/read").is_err());
        assert!(parse_command("/launch").is_err());
    }

    #[test]
    fn read_takes_the_first_word_as_uri() {
        assert_eq!(
            parse_command("/read file:///example.txt extra"),
            Ok(ReplCommand::Read {
                uri: "file:///example.txt".to_string()
            })
        );
    }

    #[test]
    fn names_for_matches_command() {
        let helper = ClientHelper {
            tools: vec!["add_numbers".into()],
            resources: vec!["file:///example.txt".into()],
            prompts: vec![],
        };
        assert_eq!(helper.names_for("/call"), ["add_numbers".to_string()]);
        assert_eq!(helper.names_for("/read").len(), 1);
        assert!(helper.names_for("/tools").is_empty());
    }
}
