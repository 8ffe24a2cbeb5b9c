use crate::adapter::{self, InterfaceSource, SystemInterfaces};
use crate::cmd::{CommandRunner, SystemRunner};
use crate::config::Config;
use crate::dns::{self, DNSManager};
use crate::error::Error;
use crate::probe;
use crate::store::{Catalog, Record, Store};

/// Owns the provider catalog and the active selection. Every operation
/// runs synchronously on the caller's thread.
pub struct App {
    catalog: Catalog,
    active: Option<String>,
    store: Store,
    runner: Box<dyn CommandRunner>,
    interfaces: Box<dyn InterfaceSource>,
    probe_address: String,
    probe_count: u32,
}

impl App {
    pub fn new(conf: &Config) -> Result<App, Error> {
        App::with_backends(
            conf,
            Box::new(SystemRunner),
            Box::new(SystemInterfaces),
        )
    }

    pub fn with_backends(
        conf: &Config,
        runner: Box<dyn CommandRunner>,
        interfaces: Box<dyn InterfaceSource>,
    ) -> Result<App, Error> {
        let store = Store::new(&conf.store_file);
        let catalog = store.load()?;
        log::info!(
            "{} dns entries available from {}",
            catalog.len(),
            store.path().display()
        );
        Ok(App {
            catalog,
            active: None,
            store,
            runner,
            interfaces,
            probe_address: conf.probe_address.clone(),
            probe_count: conf.probe_count,
        })
    }

    pub fn dns_list(&self) -> &Catalog {
        &self.catalog
    }

    pub fn active_dns(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Points the selected adapter at the named provider. A failure after
    /// the primary server is set leaves the adapter with only that server.
    pub fn set_dns(&mut self, name: &str) -> Result<(), Error> {
        let addrs = self
            .catalog
            .get(name)
            .ok_or_else(|| {
                log::warn!("dns {} not found", name);
                Error::NotFound
            })?;

        dns::flush_cache(self.runner.as_ref());
        let iface = adapter::select_adapter(self.interfaces.as_ref())?.ok_or(Error::NoInterface)?;

        log::info!(
            "set dns of {} to {} ({}, {})",
            iface,
            name,
            addrs.primary,
            addrs.secondary
        );
        let manager = DNSManager::with_interface(iface, self.runner.as_ref());
        manager.set_primary(&addrs.primary)?;
        manager.add_secondary(&addrs.secondary)?;

        self.active = Some(name.to_string());
        Ok(())
    }

    /// Returns the selected adapter to DHCP-assigned DNS servers.
    pub fn reset_dns(&mut self) -> Result<(), Error> {
        dns::flush_cache(self.runner.as_ref());
        let iface = adapter::select_adapter(self.interfaces.as_ref())?.ok_or(Error::NoInterface)?;

        log::info!("restore dhcp dns on {}", iface);
        DNSManager::with_interface(iface, self.runner.as_ref()).restore_dhcp()?;
        self.active = None;
        Ok(())
    }

    /// Adds a provider to the catalog and appends it to the store. The
    /// in-memory entry is kept even if the append fails.
    pub fn add_dns(&mut self, name: &str, primary: &str, secondary: &str) -> Result<(), Error> {
        if name.is_empty() || primary.is_empty() || secondary.is_empty() {
            return Err(Error::InvalidInput("All fields are required".to_string()));
        }

        let record = Record::new(name, primary, secondary);
        self.catalog.insert(record.name.clone(), record.addresses());
        if let Err(e) = self.store.append(&record) {
            log::warn!("{} kept in memory but not saved: {:#}", name, e);
            return Err(e.into());
        }
        log::info!("added dns {}", name);
        Ok(())
    }

    pub fn ping_dns(&self) -> Result<u32, Error> {
        probe::probe(self.runner.as_ref(), &self.probe_address, self.probe_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::fake::FakeInterfaces;
    use crate::cmd::fake::FakeRunner;
    use std::fs;

    struct Fixture {
        _dir: tempfile::TempDir,
        conf: Config,
        runner: FakeRunner,
    }

    impl Fixture {
        fn new() -> Fixture {
            let dir = tempfile::tempdir().expect("tempdir");
            let conf = Config {
                store_file: dir
                    .path()
                    .join("dnslist.jsonl")
                    .to_string_lossy()
                    .into_owned(),
                ..Config::default()
            };
            Fixture {
                _dir: dir,
                conf,
                runner: FakeRunner::default(),
            }
        }

        fn app(&self, interfaces: FakeInterfaces) -> App {
            App::with_backends(&self.conf, Box::new(self.runner.clone()), Box::new(interfaces))
                .expect("app")
        }

        fn store_lines(&self) -> usize {
            fs::read_to_string(&self.conf.store_file)
                .expect("read store")
                .lines()
                .count()
        }
    }

    fn ethernet() -> FakeInterfaces {
        FakeInterfaces::with(&[("Loopback", true, true), ("Ethernet0", true, false)])
    }

    #[test]
    fn starts_with_seed_and_no_active() {
        let f = Fixture::new();
        let app = f.app(ethernet());
        assert_eq!(app.dns_list().len(), 10);
        assert!(app.dns_list().contains_key("Shecan"));
        assert_eq!(app.active_dns(), None);
    }

    #[test]
    fn set_dns_applies_both_servers() {
        let f = Fixture::new();
        let mut app = f.app(ethernet());
        app.set_dns("Google").expect("set dns");
        assert_eq!(app.active_dns(), Some("Google"));
        assert_eq!(
            f.runner.calls(),
            vec![
                "ipconfig /flushdns",
                "netsh interface ipv4 set dnsservers Ethernet0 source=static address=8.8.8.8",
                "netsh interface ipv4 add dnsservers Ethernet0 address=8.8.4.4 index=2",
            ]
        );
    }

    #[test]
    fn unknown_name_is_not_found() {
        let f = Fixture::new();
        let mut app = f.app(ethernet());
        app.set_dns("Google").expect("set dns");

        let err = app.set_dns("Nope").expect_err("should fail");
        assert!(matches!(err, Error::NotFound));
        assert_eq!(err.to_string(), "DNS name not found");
        assert_eq!(app.active_dns(), Some("Google"));
        assert_eq!(f.runner.calls().len(), 3);
    }

    #[test]
    fn no_interface_leaves_active_unset() {
        let f = Fixture::new();
        let mut app = f.app(FakeInterfaces::with(&[("vEthernet (Default Switch)", true, false)]));
        let err = app.set_dns("Radar").expect_err("should fail");
        assert!(matches!(err, Error::NoInterface));
        assert_eq!(app.active_dns(), None);
        assert_eq!(f.runner.calls(), vec!["ipconfig /flushdns"]);
    }

    #[test]
    fn enumeration_failure_propagates_fatal() {
        let f = Fixture::new();
        let mut app = f.app(FakeInterfaces::broken());
        let err = app.set_dns("Radar").expect_err("should fail");
        assert!(err.is_fatal());
        assert_eq!(app.active_dns(), None);
    }

    #[test]
    fn primary_failure_stops_before_secondary() {
        let f = Fixture::new();
        f.runner
            .reply_ok("")
            .reply_status(1, "The filename, directory name, or volume label syntax is incorrect.");
        let mut app = f.app(ethernet());
        let err = app.set_dns("Shecan").expect_err("should fail");
        assert!(err.to_string().starts_with("Primary DNS error: exit status 1\n"));
        assert_eq!(f.runner.calls().len(), 2);
        assert_eq!(app.active_dns(), None);
    }

    #[test]
    fn secondary_failure_keeps_primary() {
        let f = Fixture::new();
        f.runner.reply_ok("").reply_ok("").reply_status(1, "Element not found.");
        let mut app = f.app(ethernet());
        let err = app.set_dns("Shecan").expect_err("should fail");
        assert!(err.to_string().contains("Secondary DNS error"));
        assert!(err.to_string().contains("Element not found."));
        assert_eq!(f.runner.calls().len(), 3);
        assert_eq!(app.active_dns(), None);
    }

    #[test]
    fn flush_failure_does_not_stop_apply() {
        let f = Fixture::new();
        f.runner.reply_status(1, "Could not flush the DNS Resolver Cache");
        let mut app = f.app(ethernet());
        app.set_dns("Level3").expect("set dns");
        assert_eq!(app.active_dns(), Some("Level3"));
    }

    #[test]
    fn reset_clears_active() {
        let f = Fixture::new();
        let mut app = f.app(ethernet());
        app.set_dns("Begzar").expect("set dns");
        app.reset_dns().expect("reset");
        assert_eq!(app.active_dns(), None);
        assert_eq!(
            f.runner.calls().last().map(String::as_str),
            Some("netsh interface ipv4 set dnsservers Ethernet0 source=dhcp")
        );
    }

    #[test]
    fn add_requires_all_fields() {
        let f = Fixture::new();
        let mut app = f.app(ethernet());
        for (name, primary, secondary) in [
            ("", "1.1.1.1", "1.0.0.1"),
            ("Cloudflare", "", "1.0.0.1"),
            ("Cloudflare", "1.1.1.1", ""),
        ] {
            let err = app
                .add_dns(name, primary, secondary)
                .expect_err("should fail");
            assert_eq!(err.to_string(), "All fields are required");
        }
        assert_eq!(app.dns_list().len(), 10);
        assert_eq!(f.store_lines(), 10);
    }

    #[test]
    fn add_updates_catalog_and_store() {
        let f = Fixture::new();
        let mut app = f.app(ethernet());
        app.add_dns("Cloudflare", "1.1.1.1", "1.0.0.1").expect("add");
        assert_eq!(app.dns_list()["Cloudflare"].secondary, "1.0.0.1");
        assert_eq!(f.store_lines(), 11);

        app.set_dns("Cloudflare").expect("set dns");
        assert_eq!(app.active_dns(), Some("Cloudflare"));

        let reloaded = f.app(ethernet());
        assert_eq!(reloaded.dns_list(), app.dns_list());
    }

    #[test]
    fn failed_append_keeps_memory_entry() {
        let f = Fixture::new();
        let mut app = f.app(ethernet());
        fs::remove_file(&f.conf.store_file).expect("remove");
        fs::create_dir(&f.conf.store_file).expect("dir in place of store");

        let err = app.add_dns("Quad9", "9.9.9.9", "149.112.112.112").expect_err("should fail");
        assert!(matches!(err, Error::Store(_)));
        assert!(app.dns_list().contains_key("Quad9"));
    }

    #[test]
    fn ping_uses_configured_target() {
        let mut f = Fixture::new();
        f.conf.probe_address = "1.1.1.1".to_string();
        f.conf.probe_count = 2;
        f.runner.reply_ok("    Minimum = 9ms, Maximum = 12ms, Average = 10ms\r\n");
        let app = f.app(ethernet());
        assert_eq!(app.ping_dns().expect("ping"), 10);
        assert_eq!(f.runner.calls(), vec!["ping -n 2 1.1.1.1"]);
    }
}
