mod adapter;
mod app;
mod cmd;
mod config;
mod dns;
mod error;
mod probe;
mod store;

use env_logger::{Builder, Env, Target};
use std::env;
use std::process::exit;

use app::App;
use config::Config;
use error::Error;

pub const EPERM: i32 = 1;
pub const ENOENT: i32 = 2;

const USAGE: &str = "[-c config.json] <command>

commands:
\tlist                             show dns providers
\tset <name>                       apply a provider to the active adapter
\tadd <name> <primary> <secondary> save a new provider
\tping                             measure average latency
\treset                            switch the adapter back to dhcp dns";

enum Command {
    List,
    Set(String),
    Add(String, String, String),
    Ping,
    Reset,
}

fn print_usage_and_exit(name: &str) -> ! {
    println!("usage:\n\t{} {}", name, USAGE);
    exit(EPERM);
}

fn parse_arg() -> (Option<String>, Command) {
    let mut args = env::args();
    // pop name
    let name = args.next().unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());
    let mut conf_file = None;
    let mut rest = Vec::new();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => print_usage_and_exit(&name),
            "-c" | "--config" => match args.next() {
                Some(file) => conf_file = Some(file),
                None => print_usage_and_exit(&name),
            },
            _ => rest.push(arg),
        }
    }

    let command = match rest.as_slice() {
        [cmd] if cmd == "list" => Command::List,
        [cmd, provider] if cmd == "set" => Command::Set(provider.clone()),
        [cmd, provider, primary, secondary] if cmd == "add" => {
            Command::Add(provider.clone(), primary.clone(), secondary.clone())
        }
        [cmd] if cmd == "ping" => Command::Ping,
        [cmd] if cmd == "reset" => Command::Reset,
        _ => print_usage_and_exit(&name),
    };
    (conf_file, command)
}

fn main() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Stdout)
        .init();

    print_version();

    let (conf_file, command) = parse_arg();
    let conf = match conf_file {
        Some(file) => match Config::from_file(&file) {
            Ok(conf) => conf,
            Err(e) => {
                log::error!("{:#}", e);
                exit(ENOENT);
            }
        },
        None => Config::default(),
    };
    log::debug!("config:\n{}", conf);

    let mut app = match App::new(&conf) {
        Ok(app) => app,
        Err(e) => fail(e),
    };

    let result = match command {
        Command::List => {
            print_list(&app);
            Ok(())
        }
        Command::Set(name) => {
            check_previlige();
            app.set_dns(&name).map(|_| {
                println!(
                    "DNS updated successfully, active dns is {}",
                    app.active_dns().unwrap_or(&name)
                );
            })
        }
        Command::Add(name, primary, secondary) => app
            .add_dns(&name, &primary, &secondary)
            .map(|_| println!("New DNS added")),
        Command::Ping => app
            .ping_dns()
            .map(|avg| println!("Average ping: {} ms", avg)),
        Command::Reset => {
            check_previlige();
            app.reset_dns().map(|_| println!("DNS reset to dhcp"))
        }
    };

    if let Err(e) = result {
        fail(e);
    }
}

fn print_list(app: &App) {
    for (name, addrs) in app.dns_list() {
        println!("{:<12} {:<16} {}", name, addrs.primary, addrs.secondary);
    }
}

fn fail(e: Error) -> ! {
    if e.is_fatal() {
        log::error!("{}", e);
    } else {
        println!("{}", e);
    }
    exit(EPERM);
}

fn check_previlige() {
    #[cfg(windows)]
    if !is_elevated::is_elevated() {
        log::error!("please run as administrator");
        exit(EPERM);
    }
}

fn print_version() {
    let pkg_name = env!("CARGO_PKG_NAME");
    let pkg_version = env!("CARGO_PKG_VERSION");
    log::debug!("running {}@{}", pkg_name, pkg_version);
}
