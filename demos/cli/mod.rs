use std::env;
use std::process;

use pcloudlib::{ClientConfig, Session};
use tracing_subscriber::{EnvFilter, fmt};

pub fn usage_and_exit(usage: &str) -> ! {
    eprintln!("{usage}");
    process::exit(1);
}

pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pcloudlib=info"));
    fmt().with_env_filter(filter).with_target(false).init();
}

pub struct ArgParser {
    args: Vec<String>,
    usage: &'static str,
}

impl ArgParser {
    pub fn new(usage: &'static str) -> Self {
        let args: Vec<String> = env::args().skip(1).collect();

        if args.iter().any(|a| a == "--help" || a == "-h") {
            println!("{usage}");
            process::exit(0);
        }

        Self { args, usage }
    }

    pub fn take_value(&mut self, names: &[&str]) -> Option<String> {
        let mut i = 0;
        while i < self.args.len() {
            if names.contains(&self.args[i].as_str()) {
                let value = self.args.get(i + 1).cloned();
                if value.is_none() {
                    usage_and_exit(self.usage);
                }
                self.args.drain(i..=i + 1);
                return value;
            }
            i += 1;
        }
        None
    }

    pub fn remaining(self) -> Vec<String> {
        self.args
    }
}

pub struct Credentials {
    pub username: String,
    pub password: String,
    pub hostname: Option<String>,
    pub proxy: Option<String>,
    pub positionals: Vec<String>,
}

pub fn parse_credentials(usage: &'static str) -> Credentials {
    let mut parser = ArgParser::new(usage);
    let username = parser
        .take_value(&["--username", "-u"])
        .unwrap_or_else(|| usage_and_exit(usage));
    let password = parser
        .take_value(&["--password", "-p"])
        .unwrap_or_else(|| usage_and_exit(usage));
    let hostname = parser.take_value(&["--hostname"]);
    let proxy = parser.take_value(&["--proxy"]);

    Credentials {
        username,
        password,
        hostname,
        proxy,
        positionals: parser.remaining(),
    }
}

impl Credentials {
    /// Build a session; authentication happens on the first request.
    pub fn session(&self) -> pcloudlib::Result<Session> {
        let mut config =
            ClientConfig::default().with_credentials(&self.username, &self.password);
        if let Some(hostname) = &self.hostname {
            config = config.with_hostname(hostname);
        }
        if let Some(proxy) = &self.proxy {
            config = config.with_proxy(proxy);
        }
        Session::new(config)
    }
}

/// Byte progress bar for a transfer of `total` bytes.
#[allow(dead_code)] // ls has no transfer to show.
pub fn progress_bar(total: u64, message: String) -> indicatif::ProgressBar {
    let bar = indicatif::ProgressBar::new(total.max(1));
    bar.set_style(
        indicatif::ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}",
        )
        .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
        .progress_chars("=>-"),
    );
    bar.set_message(message);
    bar
}
