use std::{io::IsTerminal, path::PathBuf, process};

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use vdisk_fs::logger;

use crate::shell::{
    boot::{open_volume, DiskTarget, DEFAULT_IMAGE},
    start_shell,
};

mod shell;

fn cli() -> App<'static, 'static> {
    let name_arg = || Arg::with_name("name").required(true).help("File name");
    let content_arg = || {
        Arg::with_name("content")
            .multiple(true)
            .help("File content (remaining words are joined with spaces)")
    };

    App::new("vdisk")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Simulated 50-block storage device with a flat file directory")
        .setting(AppSettings::VersionlessSubcommands)
        .arg(
            Arg::with_name("image")
                .short("i")
                .long("image")
                .takes_value(true)
                .default_value(DEFAULT_IMAGE)
                .help("Disk image file backing the device"),
        )
        .arg(
            Arg::with_name("memory")
                .short("m")
                .long("memory")
                .help("Keep the device in memory only (ignores --image)"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Debug logging (otherwise VDISK_LOG decides)"),
        )
        .subcommand(SubCommand::with_name("list").about("List files, recovering first after a crash"))
        .subcommand(
            SubCommand::with_name("create")
                .about("Create a file")
                .arg(name_arg())
                .arg(content_arg()),
        )
        .subcommand(SubCommand::with_name("read").about("Print file content").arg(name_arg()))
        .subcommand(
            SubCommand::with_name("update")
                .about("Overwrite file content in place")
                .arg(name_arg())
                .arg(content_arg()),
        )
        .subcommand(SubCommand::with_name("delete").about("Delete a file").arg(name_arg()))
        .subcommand(SubCommand::with_name("optimize").about("Defragment the device"))
        .subcommand(SubCommand::with_name("crash").about("Simulate an unclean shutdown"))
        .subcommand(
            SubCommand::with_name("format")
                .about("Erase the device")
                .arg(Arg::with_name("yes").long("yes").help("Do not ask for confirmation")),
        )
}

fn content_of(args: &ArgMatches) -> String {
    args.values_of("content")
        .map(|words| words.collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

/// 一次性命令：输出与旧版命令行程序相同的单行结果
fn run_once(target: &DiskTarget, command: &str, args: &ArgMatches) -> vdisk_fs::Result<String> {
    let volume = open_volume(target)?;
    let name = args.value_of("name").unwrap_or_default();

    let line = match command {
        "list" => volume.list().to_legacy_line(),
        "create" => volume.create(name, &content_of(args)).status,
        "read" => volume.read(name).content,
        "update" => volume.update(name, &content_of(args)).status,
        "delete" => volume.delete(name).status,
        "optimize" => volume.optimize().status,
        "crash" => volume.crash().status,
        "format" => {
            let confirmed = args.is_present("yes")
                || (std::io::stdin().is_terminal()
                    && dialoguer::Confirm::new()
                        .with_prompt("Erase every file on the virtual disk?")
                        .default(false)
                        .interact()
                        .unwrap_or(false));
            if !confirmed {
                return Ok("ERROR:Format_Cancelled".to_string());
            }
            volume.format().status
        }
        other => {
            return Err(vdisk_fs::FileSystemError::InvalidInput(format!(
                "unknown command {}",
                other
            )))
        }
    };
    Ok(line)
}

fn main() {
    let matches = cli().get_matches();
    logger::init(matches.is_present("verbose"));

    let target = if matches.is_present("memory") {
        DiskTarget::Memory
    } else {
        DiskTarget::Image(PathBuf::from(
            matches.value_of("image").unwrap_or(DEFAULT_IMAGE),
        ))
    };

    match matches.subcommand() {
        (_, None) => start_shell(target),
        (command, Some(args)) => match run_once(&target, command, args) {
            Ok(line) => println!("{}", line),
            Err(e) => {
                eprintln!("ERROR:{} ({})", e.code(), e);
                process::exit(1);
            }
        },
    }
}
