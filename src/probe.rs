//! Latency probe through the system `ping` utility.
//!
//! The average is read from the summary line windows prints in English,
//! `Minimum = 3ms, Maximum = 5ms, Average = 4ms`. A localized `ping`
//! prints something else and the probe then reports the output as
//! unreadable.

use regex::Regex;

use crate::cmd::CommandRunner;
use crate::error::Error;

pub fn parse_average(output: &str) -> Option<u32> {
    let re = Regex::new(r"Average = (\d+)ms").unwrap();
    output
        .lines()
        .filter(|line| line.contains("Average"))
        .find_map(|line| re.captures(line)?.get(1)?.as_str().parse().ok())
}

/// Pings `address` `count` times and returns the average round trip in ms.
pub fn probe(runner: &dyn CommandRunner, address: &str, count: u32) -> Result<u32, Error> {
    let count = count.to_string();
    let out = runner
        .run("ping", &["-n", &count, address])
        .map_err(|e| {
            log::warn!("failed to run ping: {}", e);
            Error::Ping
        })?;
    if !out.success {
        log::warn!("ping to {} failed: {}\n{}", address, out.status_text(), out.output);
        return Err(Error::Ping);
    }
    match parse_average(&out.output) {
        Some(avg) => {
            log::debug!("average ping to {} is {}ms", address, avg);
            Ok(avg)
        }
        None => {
            log::debug!("no average in ping output:\n{}", out.output);
            Err(Error::PingUnreadable)
        }
    }
}
