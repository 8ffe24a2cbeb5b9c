use crate::cmd::CommandRunner;
use crate::error::Error;

const NETSH: &str = "netsh";

/// Flushes the resolver cache. Failures are only logged.
pub fn flush_cache(runner: &dyn CommandRunner) {
    match runner.run("ipconfig", &["/flushdns"]) {
        Ok(out) if out.success => log::debug!("dns cache flushed"),
        Ok(out) => log::warn!(
            "failed to flush dns cache: {}\n{}",
            out.status_text(),
            out.output
        ),
        Err(e) => log::warn!("failed to flush dns cache: {}", e),
    }
}

pub struct DNSManager<'a> {
    interface_name: String,
    runner: &'a dyn CommandRunner,
}

impl<'a> DNSManager<'a> {
    pub fn with_interface(interface_name: String, runner: &'a dyn CommandRunner) -> Self {
        Self {
            interface_name,
            runner,
        }
    }

    /// Replaces the adapter's server list with `addr` as the only static entry.
    pub fn set_primary(&self, addr: &str) -> Result<(), Error> {
        let address = format!("address={}", addr);
        self.netsh(
            "Primary",
            &[
                "interface",
                "ipv4",
                "set",
                "dnsservers",
                &self.interface_name,
                "source=static",
                &address,
            ],
        )
    }

    pub fn add_secondary(&self, addr: &str) -> Result<(), Error> {
        let address = format!("address={}", addr);
        self.netsh(
            "Secondary",
            &[
                "interface",
                "ipv4",
                "add",
                "dnsservers",
                &self.interface_name,
                &address,
                "index=2",
            ],
        )
    }

    /// Hands DNS configuration of the adapter back to DHCP.
    pub fn restore_dhcp(&self) -> Result<(), Error> {
        self.netsh(
            "Restore",
            &[
                "interface",
                "ipv4",
                "set",
                "dnsservers",
                &self.interface_name,
                "source=dhcp",
            ],
        )
    }

    fn netsh(&self, step: &'static str, args: &[&str]) -> Result<(), Error> {
        let out = self.runner.run(NETSH, args).map_err(|e| Error::Command {
            step,
            reason: e.to_string(),
            output: String::new(),
        })?;
        if !out.success {
            return Err(Error::Command {
                step,
                reason: out.status_text(),
                output: out.output,
            });
        }
        log::debug!("{} dns set on {}: {}", step, self.interface_name, args.join(" "));
        Ok(())
    }
}
