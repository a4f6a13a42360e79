use crate::types::{ExecutionResult, Status};
use crossterm::style::Stylize;
use std::io::Write;

pub fn print_result(result: &ExecutionResult, as_json: bool) {
    if as_json {
        println!("{}", result.to_json());
        return;
    }

    match result.status {
        Status::Success => println!("  {} {}", "ok".green().bold(), result.message),
        Status::Error => println!("  {} {}", "error".red().bold(), result.message),
        Status::Processing => println!("  {}", result.message.as_str().dim()),
    }

    if let Some(params) = result.parameters.as_ref().filter(|p| !p.is_empty()) {
        let shown: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        println!("    {}", shown.join(" ").dim());
    }
    if let Some(note) = &result.note {
        println!("    {}", format!("note: {note}").dim());
    }
    if let Some(raw) = &result.ai_raw_response {
        println!("    {}", format!("raw reply: {raw}").dim());
    }
}

pub fn print_repl_help() {
    println!("type a modeling command, e.g. 'create a 10mm cube'");
    println!();
    println!("  /select face <id>   select a face");
    println!("  /select body <id>   select a body");
    println!("  /clear              clear the selection");
    println!("  /doc                show the document");
    println!("  /help               show this help");
    println!("  /quit               leave");
}

/// Reads one line from stdin; `None` on EOF.
pub fn prompt_line(prompt: &str) -> Option<String> {
    print!("{} ", prompt.cyan());
    std::io::stdout().flush().ok();

    let mut input = String::new();
    match std::io::stdin().read_line(&mut input) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(input.trim().to_string()),
    }
}

pub fn check_line(label: &str, outcome: Result<String, String>) {
    print!("  {label} ... ");
    match outcome {
        Ok(detail) if detail.is_empty() => println!("{}", "ok".green()),
        Ok(detail) => println!("{} ({detail})", "ok".green()),
        Err(hint) => {
            println!("{}", "failed".red());
            println!("    {hint}");
        }
    }
}
