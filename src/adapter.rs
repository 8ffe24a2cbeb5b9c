use anyhow::Result;

use crate::error::Error;

// matched case-insensitively against the adapter name
const SKIPPED_NAMES: [&str; 3] = ["virtual", "vethernet", "docker"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub name: String,
    pub up: bool,
    pub loopback: bool,
}

impl Interface {
    fn is_eligible(&self) -> bool {
        if !self.up || self.loopback {
            return false;
        }
        let name = self.name.to_lowercase();
        !SKIPPED_NAMES.iter().any(|s| name.contains(s))
    }
}

pub trait InterfaceSource {
    fn interfaces(&self) -> Result<Vec<Interface>>;
}

/// Interfaces of the running host.
pub struct SystemInterfaces;

cfg_if::cfg_if! {
    if #[cfg(windows)] {
        use anyhow::Context;
        use ipconfig::{IfType, OperStatus};

        impl InterfaceSource for SystemInterfaces {
            fn interfaces(&self) -> Result<Vec<Interface>> {
                let adapters = ipconfig::get_adapters().context("failed to list network adapters")?;
                Ok(adapters
                    .iter()
                    .map(|adapter| Interface {
                        // netsh addresses adapters by their friendly name
                        name: adapter.friendly_name().to_string(),
                        up: matches!(adapter.oper_status(), OperStatus::IfOperStatusUp),
                        loopback: matches!(adapter.if_type(), IfType::SoftwareLoopback),
                    })
                    .collect())
            }
        }
    } else {
        impl InterfaceSource for SystemInterfaces {
            fn interfaces(&self) -> Result<Vec<Interface>> {
                anyhow::bail!("listing network adapters is only supported on windows")
            }
        }
    }
}

/// Returns the first up, non-loopback adapter whose name does not look like
/// a virtual or container switch. An enumeration failure is fatal.
pub fn select_adapter(source: &dyn InterfaceSource) -> Result<Option<String>, Error> {
    let interfaces = source
        .interfaces()
        .map_err(|e| Error::Fatal(format!("error in interfaces: {:#}", e)))?;

    for iface in interfaces {
        if iface.is_eligible() {
            log::debug!("selected interface {}", iface.name);
            return Ok(Some(iface.name));
        }
        log::debug!("skip interface {}", iface.name);
    }
    Ok(None)
}
