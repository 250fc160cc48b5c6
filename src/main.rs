use clap::{Arg, ArgAction, Command, value_parser};
use exhume_prefetch::from_reader;
use log::{debug, error};
use std::fs::File;
use std::io::BufReader;

fn main() {
    let matches = Command::new("exhume_prefetch")
        .version("0.1.0")
        .author("ForensicXlab")
        .about("Exhume the execution traces from a Windows XP/2003 prefetch file.")
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_parser(value_parser!(String))
                .required(true)
                .help("The path to the prefetch (.pf) file."),
        )
        .arg(
            Arg::new("volumes")
                .long("volumes")
                .action(ArgAction::SetTrue)
                .help("Only display the volume information."),
        )
        .arg(
            Arg::new("files")
                .long("files")
                .action(ArgAction::SetTrue)
                .conflicts_with("volumes")
                .help("Only display the referenced file names."),
        )
        .arg(
            Arg::new("json")
                .short('j')
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Output the decoded prefetch in JSON format."),
        )
        .arg(
            Arg::new("log_level")
                .short('l')
                .long("log-level")
                .value_parser(["error", "warn", "info", "debug", "trace"])
                .default_value("info")
                .help("Set the log verbosity level"),
        )
        .get_matches();

    // Initialize logger.
    let level_filter = match matches
        .get_one::<String>("log_level")
        .map(String::as_str)
        .unwrap_or("info")
    {
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "info" => log::LevelFilter::Info,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        _ => log::LevelFilter::Info,
    };
    env_logger::Builder::new().filter_level(level_filter).init();

    let Some(file_path) = matches.get_one::<String>("file") else {
        error!("No prefetch file given.");
        return;
    };
    let show_volumes = matches.get_flag("volumes");
    let show_files = matches.get_flag("files");
    let json_output = matches.get_flag("json");

    let file = match File::open(file_path) {
        Ok(f) => f,
        Err(e) => {
            error!("Could not open '{}': {}", file_path, e);
            return;
        }
    };
    debug!("Opened '{}'", file_path);

    let prefetch = match from_reader(BufReader::new(file)) {
        Ok(pf) => pf,
        Err(e) => {
            error!("Couldn't decode the prefetch file: {}", e);
            return;
        }
    };

    if json_output {
        let value = if show_volumes {
            serde_json::Value::Array(prefetch.volumes.iter().map(|v| v.to_json()).collect())
        } else if show_files {
            serde_json::json!(prefetch.filenames)
        } else {
            prefetch.to_json()
        };
        match serde_json::to_string_pretty(&value) {
            Ok(s) => println!("{}", s),
            Err(e) => error!("Error serializing prefetch to JSON: {}", e),
        }
    } else if show_volumes {
        for v in &prefetch.volumes {
            println!("{}", v.to_string());
        }
    } else if show_files {
        println!("{}", prefetch.filenames_table());
    } else {
        println!("{}", prefetch.to_string());
    }
}
