use colored::*;
use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use std::error::Error;
use std::io::stdout;
use std::{thread, time::Duration};
use vdisk_fs::{
    fs::{block_pool::BlockStatus, config::TOTAL_BLOCKS, status::status_line},
    is_success,
    utils::format_timestamp,
    Outcome,
};

use crate::shell::boot::Volume;

#[derive(Debug)]
pub enum Command {
    Help,
    Ls,
    Map,
    Df,
    Create(String, String),
    Read(String),
    Update(String, String),
    Rm(String),
    Stat(String),
    Optimize,
    Crash,
    Format,
    Clear,
    Exit,
}

pub fn execute_command(cmd: &Command, volume: &Volume) -> Result<(), Box<dyn Error>> {
    match cmd {
        Command::Help => print_help(),
        Command::Ls => list(volume),
        Command::Map => print_map(volume),
        Command::Df => {
            let usage = volume.usage();
            let (id, state, mounts, checkpoint) = volume.with_fs(|fs| {
                let sb = fs.super_block();
                (
                    sb.volume_id.clone(),
                    sb.state,
                    sb.mount_count,
                    sb.last_checkpoint,
                )
            });
            println!("{}", "💽 Volume".bright_yellow().bold());
            println!("{}: {}", "ID".blue(), id);
            println!("{}: {:?}", "State".blue(), state);
            println!("{}: {}", "Mounts".blue(), mounts);
            println!("{}: {}", "Checkpoint".blue(), format_timestamp(checkpoint));
            println!(
                "{}: {} total, {} reserved, {} used, {} free",
                "Blocks".blue(),
                usage.total,
                usage.reserved,
                usage.used.to_string().green(),
                usage.free
            );
        }
        Command::Create(name, content) => {
            let resp = volume.create(name, content);
            report(&resp.status, &format!("📝 Created file: {}", name.green()));
        }
        Command::Read(name) => {
            let bytes = volume.with_fs(|fs| fs.read(name))?;
            println!("📖 {}", name.cyan());
            println!("{}", String::from_utf8_lossy(&bytes));
        }
        Command::Update(name, content) => {
            let resp = volume.update(name, content);
            report(&resp.status, &format!("✏️  Updated {}", name.cyan()));
        }
        Command::Rm(name) => {
            let resp = volume.delete(name);
            report(&resp.status, &format!("❌ Deleted file: {}", name.red()));
        }
        Command::Stat(name) => {
            let entry = volume.with_fs(|fs| fs.stat(name).cloned())?;
            println!(
                "{}\n{}: {}\n{}: {}\n{}: {} bytes\n{}: {}\n{}: {}\n",
                "📊 File Info".bright_yellow().bold(),
                "Name".blue(),
                entry.name,
                "Block".blue(),
                entry.block,
                "Size".blue(),
                entry.size,
                "Created".blue(),
                format_timestamp(entry.created_at),
                "Modified".blue(),
                format_timestamp(entry.modified_at)
            );
        }
        Command::Optimize => optimize(volume),
        Command::Crash => {
            let resp = volume.crash();
            if is_success(&resp.status) {
                println!("{}", "💥 System halted (simulated).".red().bold());
                println!(
                    "{}",
                    "Run 'ls' to trigger the recovery pass.".bright_black()
                );
            } else {
                println!("{} {}", "❌".red(), resp.status.red());
            }
        }
        Command::Format => {
            let confirmed = Confirm::new()
                .with_prompt("Erase every file on the virtual disk?")
                .default(false)
                .interact()?;
            if !confirmed {
                println!("{}", "Format cancelled.".bright_black());
                return Ok(());
            }

            println!("💾 Formatting virtual disk...");
            let resp = volume.format();
            let pb = ProgressBar::new(100);
            pb.set_style(
                ProgressStyle::with_template("[{bar:40.green/black}] {pos:>3}% {msg}")?
                    .progress_chars("#>-"),
            );
            for i in 0..=100 {
                pb.set_position(i);
                thread::sleep(Duration::from_millis(5));
            }
            if is_success(&resp.status) {
                pb.finish_with_message("✅ Disk formatted successfully!");
            } else {
                pb.abandon_with_message(resp.status.red().to_string());
            }
        }
        Command::Clear => {
            execute!(stdout(), Clear(ClearType::All), cursor::MoveTo(0, 0))?;
        }
        Command::Exit => println!("{}", "👋 Exiting VDiskFS shell...".yellow().bold()),
    }

    Ok(())
}

// 前端只按 SUCCESS 子串判断成败
fn report(status: &str, success: &str) {
    if is_success(status) {
        println!("{} {}", success, status.bright_black());
    } else {
        println!("{} {}", "❌ Error:".red().bold(), status.red());
    }
}

fn list(volume: &Volume) {
    let resp = volume.list();

    if let Some(message) = &resp.message {
        println!("{} {}", "⚠️  RECOVERY:".red().bold(), message.red());
        println!("{} {}", "Status:".bright_black(), "RECOVERED".red().bold());
    }

    if resp.files.is_empty() {
        println!("{}", "Disk is empty".bright_black());
        return;
    }

    println!(
        "{}",
        format!("{:<32} {:>6} {:>8}", "NAME", "BLOCK", "SIZE").bold()
    );
    for f in &resp.files {
        println!(
            "📄 {:<29} {:>6} {:>8}",
            f.name,
            format!("BLK {}", f.block).cyan(),
            format!("{} B", f.size)
        );
    }
}

fn print_map(volume: &Volume) {
    const PER_ROW: usize = 10;

    let map = volume.block_map();
    println!("{}", "🧱 Block map".bright_yellow().bold());
    for row in map.chunks(PER_ROW) {
        let start = row.first().map(|b| b.index).unwrap_or(0);
        let cells: Vec<String> = row
            .iter()
            .map(|b| match b.status {
                BlockStatus::Reserved => "██".bright_black().to_string(),
                BlockStatus::Used => "██".green().to_string(),
                BlockStatus::Free => "░░".white().to_string(),
            })
            .collect();
        println!("{:>3} {}", start, cells.join(" "));
    }
    println!(
        "{} system  {} used  {} free   ({} blocks)",
        "██".bright_black(),
        "██".green(),
        "░░".white(),
        TOTAL_BLOCKS
    );
}

// 引擎先一次性完成整理，进度条只是回放搬迁记录
fn optimize(volume: &Volume) {
    let result = volume.with_fs(|fs| fs.optimize());
    let status = status_line(&result);

    let moves = match result {
        Ok(Outcome::Defragmented { moves }) => moves,
        _ => {
            println!("{} {}", "❌ Error:".red().bold(), status.red());
            return;
        }
    };

    let pb = ProgressBar::new(moves.len().max(1) as u64);
    if let Ok(style) = ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos}/{len} {msg}") {
        pb.set_style(style.progress_chars("=> "));
    }
    for m in &moves {
        pb.println(format!(
            "  {} block {} → {}",
            m.name.cyan(),
            m.from,
            m.to.to_string().green()
        ));
        pb.inc(1);
        thread::sleep(Duration::from_millis(40));
    }
    pb.set_position(pb.length().unwrap_or(1));
    pb.finish_with_message(format!("✅ {}", status));
}

fn print_help() {
    println!("{}", "📘 VDiskFS Commands".bright_cyan().bold());
    println!(
        "{}",
        "
  ls                     List files (runs recovery after a crash)
  map                    Show the block grid
  df                     Show volume and block usage
  create <file> [text]   Create file with content
  read <file>            Read file content
  update <file> [text]   Overwrite file content in place
  rm <file>              Delete file
  stat <file>            Show file info
  optimize               Defragment: compact files to the lowest blocks
  crash                  Simulate an unclean shutdown
  format                 Erase the virtual disk
  clear                  Clear the screen
  help                   Show this help message
  exit                   Quit the shell
"
        .bright_black()
    );
}
