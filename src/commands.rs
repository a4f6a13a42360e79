use crate::config::{get_config_path, save_config, Config};
use crate::dispatcher::Dispatcher;
use crate::host::SimulatedHost;
use crate::interpreter::build_interpreter;
use crate::openai::OpenAiClient;
use crate::schema::{ActionKind, Schema};
use crate::session::{PaletteSink, Session};
use crate::types::{BodyId, Entity, EntityKind, FaceId};
use crate::ui::{check_line, print_repl_help, print_result, prompt_line};
use std::io::{BufRead, Write};
use std::{env, fs, process::Command};

fn schema_for(config: &Config) -> Schema {
    Schema::standard().with_overrides(&config.schema)
}

fn new_session(config: &Config, host: SimulatedHost) -> Session<SimulatedHost> {
    let schema = schema_for(config);
    let interpreter = build_interpreter(&config.llm, &schema);
    Session::activate(interpreter, Dispatcher::new(schema), host)
}

fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn cmd_query(text: &str, config: &Config, as_json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = new_session(config, SimulatedHost::new());
    let result = session.run_command(text, Some(&new_session_id()));
    print_result(&result, as_json);
    if !as_json && result.is_success() {
        println!();
        print!("{}", session.host());
    }
    if result.is_success() {
        Ok(())
    } else {
        Err("command failed".into())
    }
}

pub fn cmd_repl(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = new_session(config, SimulatedHost::new());
    let session_id = new_session_id();
    println!("cadprompt ({} interpreter)  /help for commands", session.interpreter_name());

    while let Some(line) = prompt_line(">") {
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix('/') {
            let parts: Vec<&str> = rest.split_whitespace().collect();
            match parts.as_slice() {
                ["quit"] | ["q"] | ["exit"] => break,
                ["help"] => print_repl_help(),
                ["doc"] => print!("{}", session.host()),
                ["clear"] => {
                    session.host_mut().clear_selection();
                    println!("selection cleared");
                }
                ["select", kind, id] => match select(&mut session, kind, id) {
                    Ok(label) => println!("selected {label}"),
                    Err(e) => println!("{e}"),
                },
                _ => println!("unknown command: /{rest}  (try /help)"),
            }
            continue;
        }

        let result = session.run_command(&line, Some(&session_id));
        print_result(&result, false);
    }

    session.deactivate();
    Ok(())
}

fn select(session: &mut Session<SimulatedHost>, kind: &str, id: &str) -> Result<String, String> {
    let id: u32 = id.parse().map_err(|_| format!("not an id: {id}"))?;
    let host = session.host();
    let entity = match kind {
        "face" if host.bodies().iter().any(|b| b.faces.contains(&FaceId(id))) => {
            Entity::Face(FaceId(id))
        }
        "body" if host.body(BodyId(id)).is_some() => Entity::Body(BodyId(id)),
        "face" | "body" => return Err(format!("no {kind} {id} in the document")),
        other => return Err(format!("cannot select '{other}'; use face or body")),
    };
    session.host_mut().select(entity);
    Ok(format!("{kind} {id}"))
}

struct StdoutSink;

impl PaletteSink for StdoutSink {
    fn send(&mut self, event: &str, payload: &str) {
        println!("{{\"event\":\"{event}\",\"payload\":{payload}}}");
        std::io::stdout().flush().ok();
    }
}

/// Line-delimited bridge: each stdin line is one palette message; events and
/// the return data go to stdout.
pub fn cmd_bridge(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = new_session(config, SimulatedHost::new());
    let mut sink = StdoutSink;
    let stdin = std::io::stdin();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let reply = session.handle_message(&line, &mut sink);
        println!("{}", serde_json::json!({ "returnData": reply }));
        std::io::stdout().flush().ok();
    }

    session.deactivate();
    Ok(())
}

pub fn cmd_schema(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", schema_for(config).system_prompt());
    Ok(())
}

pub fn cmd_doctor(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("diagnostics:");
    println!();

    let config_path = get_config_path();
    check_line(
        "config",
        Ok(if config_path.exists() {
            config_path.display().to_string()
        } else {
            "using defaults".to_string()
        }),
    );

    match config.llm.api_key() {
        Some(key) => {
            check_line("credential", Ok(format!("{}, model {}", config.llm.provider, config.llm.model)));
            let client = OpenAiClient::new(&config.llm, key);
            let endpoint = if client.is_available() {
                Ok(config.llm.endpoint.clone())
            } else {
                Err(format!("cannot reach {}", config.llm.endpoint))
            };
            check_line("endpoint", endpoint);
        }
        None => check_line(
            "credential",
            Ok("none; local fallback interpreter in use".to_string()),
        ),
    }

    let dispatcher = Dispatcher::new(schema_for(config));
    let mut failures = Vec::new();
    for spec in dispatcher.schema().actions() {
        let mut host = SimulatedHost::new();
        if let Some(body) = seed_selection(&dispatcher, &mut host, spec.kind) {
            host.select(body);
        }
        let cmd = dispatcher.schema().default_command(spec.kind);
        if let Err(e) = dispatcher.execute(&mut host, &cmd) {
            failures.push(format!("{}: {}", spec.kind.name(), e));
        }
    }
    let defaults = if failures.is_empty() {
        Ok(format!("{} actions", dispatcher.schema().actions().len()))
    } else {
        Err(failures.join("; "))
    };
    check_line("schema defaults", defaults);

    println!();
    Ok(())
}

/// Builds a box so selection-based actions have something to act on.
fn seed_selection(
    dispatcher: &Dispatcher,
    host: &mut SimulatedHost,
    kind: ActionKind,
) -> Option<Entity> {
    let required = kind.required_selection()?;
    let seed = dispatcher.schema().default_command(ActionKind::CreateBox);
    dispatcher.execute(host, &seed).ok()?;
    let body = host.bodies().first()?;
    match required {
        EntityKind::Face => body.faces.first().map(|f| Entity::Face(*f)),
        EntityKind::Body => Some(Entity::Body(body.id)),
        EntityKind::Edge => None,
    }
}

pub fn cmd_config() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = get_config_path();

    if !config_path.exists() {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        save_config(&Config::default())?;
    }

    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    Command::new(&editor).arg(&config_path).status()?;

    Ok(())
}
