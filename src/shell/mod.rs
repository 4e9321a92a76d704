pub mod boot;
pub mod command;
pub mod parse;

use crate::shell::{
    boot::{perform_disk_initialization, BootProgress, DiskTarget, Volume},
    command::execute_command,
    parse::parse_command,
};
use colored::*;
use crossterm::{
    cursor, execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use indicatif::{ProgressBar, ProgressStyle};
use reedline::{DefaultCompleter, DefaultPrompt, DefaultPromptSegment, Reedline, Signal};
use std::{io::stdout, path::PathBuf, sync::mpsc, thread, time::Duration};

pub fn start_shell(target: DiskTarget) {
    let volume = match boot_animation(target) {
        Some(v) => v,
        None => return,
    };

    let username = whoami::username();
    let hostname = whoami::fallible::hostname().unwrap_or_else(|_| "localhost".to_string());

    println!(
        "{}",
        "Type 'help' for available commands. Use ↑↓ for history, Tab for auto-completion.\n"
            .bright_black()
    );

    // 初始化 reedline
    let history_path = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".vdisk_history");

    let mut line_editor = Reedline::create();
    match reedline::FileBackedHistory::with_file(100, history_path) {
        Ok(history) => line_editor = line_editor.with_history(Box::new(history)),
        Err(e) => log::warn!("shell history disabled: {}", e),
    }

    // 命令补全
    let commands: Vec<String> = [
        "help", "ls", "map", "df", "create", "read", "update", "rm", "stat", "optimize",
        "crash", "format", "clear", "exit",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    let completer = DefaultCompleter::new_with_wordlen(commands, 2);
    line_editor = line_editor.with_completer(Box::new(completer));

    let prompt = DefaultPrompt::new(
        DefaultPromptSegment::Basic(format!("{}@{}", username, hostname)),
        DefaultPromptSegment::Basic("VDiskFS".to_string()),
    );

    loop {
        let input = line_editor.read_line(&prompt);

        match input {
            Ok(Signal::Success(buffer)) => {
                let trimmed = buffer.trim();
                if trimmed.is_empty() {
                    continue;
                }

                match parse_command(trimmed) {
                    Some(cmd) => {
                        if let Err(e) = execute_command(&cmd, &volume) {
                            println!("{} {}", "❌ Error:".red().bold(), e);
                        }
                        if matches!(cmd, command::Command::Exit) {
                            println!("{}", "👋 Bye!".bright_yellow());
                            break;
                        }
                    }
                    None => println!(
                        "{}",
                        "⚠️  Unknown command or missing argument. Type 'help' for command list."
                            .yellow()
                    ),
                }
            }
            Ok(Signal::CtrlC) => {
                println!();
                continue;
            }
            Ok(Signal::CtrlD) => {
                println!("{}", "Exiting VDiskFS...".yellow());
                break;
            }
            Ok(_) => continue,
            Err(e) => {
                println!("Error reading line: {}", e);
                break;
            }
        }
    }

    println!("{}", "GoodBye!".bright_yellow());
}

/// 启动动画：后台线程挂载设备，这里按真实进度刷新进度条
fn boot_animation(target: DiskTarget) -> Option<Volume> {
    let mut out = stdout();

    let _ = execute!(out, Clear(ClearType::All), cursor::MoveTo(0, 0));
    println!("{}", "[VDiskFS Booting...]".bright_yellow().bold());

    let (tx, rx) = mpsc::channel();
    let worker = thread::spawn(move || perform_disk_initialization(target, tx));

    let pb = ProgressBar::new(100);
    if let Ok(style) = ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos:>3}% {msg}") {
        pb.set_style(style.progress_chars("=> "));
    }

    let mut volume = None;
    for event in rx {
        match event {
            BootProgress::Step(step) => pb.println(step),
            BootProgress::Progress(i) => pb.set_position(i),
            BootProgress::Finished(Ok(v)) => {
                pb.finish_with_message("✅ Ready!");
                volume = Some(v);
            }
            BootProgress::Finished(Err(e)) => {
                pb.abandon_with_message("boot failed");
                println!("{} {}", "❌ Failed to mount virtual disk:".red().bold(), e);
            }
        }
    }
    let _ = worker.join();

    let volume = volume?;
    thread::sleep(Duration::from_millis(300));
    let _ = execute!(
        out,
        Clear(ClearType::All),
        cursor::MoveTo(0, 0),
        SetForegroundColor(Color::Cyan),
        Print(format!("Welcome to VDiskFS v{}\n", env!("CARGO_PKG_VERSION"))),
        ResetColor
    );
    Some(volume)
}
