use crate::shell::command::Command;

pub fn parse_command(input: &str) -> Option<Command> {
    let tokens: Vec<&str> = input.trim().split_ascii_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }

    let cmd = tokens[0];
    let args = &tokens[1..];

    match cmd {
        "help" => Some(Command::Help),
        "ls" | "list" => Some(Command::Ls),
        "map" => Some(Command::Map),
        "df" => Some(Command::Df),
        "create" | "touch" => args
            .first()
            .map(|&name| Command::Create(name.to_string(), args[1..].join(" "))),
        "read" | "cat" => args.first().map(|&name| Command::Read(name.to_string())),
        "update" | "write" => args
            .first()
            .map(|&name| Command::Update(name.to_string(), args[1..].join(" "))),
        "rm" | "delete" => args.first().map(|&name| Command::Rm(name.to_string())),
        "stat" => args.first().map(|&name| Command::Stat(name.to_string())),
        "optimize" | "defrag" => Some(Command::Optimize),
        "crash" => Some(Command::Crash),
        "format" => Some(Command::Format),
        "clear" => Some(Command::Clear),
        "exit" | "quit" => Some(Command::Exit),
        _ => None,
    }
}
